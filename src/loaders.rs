// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Input Loaders

//! Plain-text record parsers.
//!
//! Pricing and connectivity files hold one whitespace-separated record per
//! line; the budgets file is any number of integers on any number of lines.
//! Match history is CSV with `winner` and `loser` columns (a leading index
//! column, as spreadsheet exports write, is ignored). Blank lines are skipped
//! and a UTF-8 byte-order mark is stripped.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::rational::Rational;
use crate::types::{ConnectivityRecord, MatchRecord, NodeId, PricingRecord};

const BOM: char = '\u{feff}';

fn malformed(line: usize, reason: impl Into<String>) -> EngineError {
    EngineError::MalformedRecord { line, reason: reason.into() }
}

/// Non-blank lines with their 1-based numbers.
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.trim_start_matches(BOM)
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn int<T: std::str::FromStr>(field: &str, line: usize, what: &str) -> EngineResult<T> {
    field
        .parse::<T>()
        .map_err(|_| malformed(line, format!("{what} {field:?} is not an integer")))
}

pub fn read_source(path: &Path) -> EngineResult<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => EngineError::SourceNotFound(path.to_path_buf()),
        _ => EngineError::Io(e),
    })
}

// ─── Pricing ─────────────────────────────────────────────────────────────────

pub fn parse_pricing(text: &str) -> EngineResult<Vec<PricingRecord>> {
    records(text)
        .map(|(line, l)| {
            let fields: Vec<&str> = l.split_whitespace().collect();
            let [id, min_num, min_den, frac_num, frac_den] = fields[..] else {
                return Err(malformed(line, format!("expected 5 fields, found {}", fields.len())));
            };
            Ok(PricingRecord::new(
                id,
                Rational::new(int(min_num, line, "minimum numerator")?, int(min_den, line, "minimum denominator")?),
                Rational::new(int(frac_num, line, "rate numerator")?, int(frac_den, line, "rate denominator")?),
            ))
        })
        .collect()
}

pub fn load_pricing(path: &Path) -> EngineResult<Vec<PricingRecord>> {
    parse_pricing(&read_source(path)?)
}

// ─── Connectivity ────────────────────────────────────────────────────────────

pub fn parse_connectivity(text: &str) -> EngineResult<Vec<ConnectivityRecord>> {
    records(text)
        .map(|(line, l)| {
            let fields: Vec<&str> = l.split_whitespace().collect();
            match fields[..] {
                [from, to] => Ok(ConnectivityRecord::new(NodeId::from(from), NodeId::from(to))),
                _ => Err(malformed(line, format!("expected 2 fields, found {}", fields.len()))),
            }
        })
        .collect()
}

pub fn load_connectivity(path: &Path) -> EngineResult<Vec<ConnectivityRecord>> {
    parse_connectivity(&read_source(path)?)
}

// ─── Budgets ─────────────────────────────────────────────────────────────────

pub fn parse_budgets(text: &str) -> EngineResult<Vec<i64>> {
    let mut budgets = Vec::new();
    for (line, l) in records(text) {
        for field in l.split_whitespace() {
            budgets.push(int(field, line, "budget")?);
        }
    }
    Ok(budgets)
}

pub fn load_budgets(path: &Path) -> EngineResult<Vec<i64>> {
    parse_budgets(&read_source(path)?)
}

// ─── Match history ───────────────────────────────────────────────────────────

pub fn parse_matches(text: &str) -> EngineResult<Vec<MatchRecord>> {
    let mut rows = records(text);
    let Some((header_line, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let column = |name: &str| {
        columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| malformed(header_line, format!("missing {name:?} column")))
    };
    let winner_col = column("winner")?;
    let loser_col = column("loser")?;

    rows.map(|(line, l)| {
        let cells: Vec<&str> = l.split(',').map(str::trim).collect();
        let cell = |i: usize| {
            cells
                .get(i)
                .copied()
                .ok_or_else(|| malformed(line, format!("expected {} columns, found {}", columns.len(), cells.len())))
        };
        let winner = parse_player(cell(winner_col)?, line)?;
        let loser = parse_player(cell(loser_col)?, line)?;
        MatchRecord::new(winner, loser).map_err(|e| malformed(line, e.to_string()))
    })
    .collect()
}

// Spreadsheet exports sometimes write ids as floats ("3.0").
fn parse_player(cell: &str, line: usize) -> EngineResult<i64> {
    if let Ok(id) = cell.parse::<i64>() {
        return Ok(id);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 => Ok(v as i64),
        _ => Err(malformed(line, format!("player {cell:?} is not an integer"))),
    }
}

pub fn load_matches(path: &Path) -> EngineResult<Vec<MatchRecord>> {
    parse_matches(&read_source(path)?)
}
