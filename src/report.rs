// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Result Reports
//
// Serializable shapes handed to whatever renders results (JSON files, the
// WASM front end, CSV).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::mall::WalkOutcome;
use crate::rating::RatingsTable;
use crate::rational::Rational;
use crate::tournament::WinProbabilities;
use crate::types::{NodeId, PlayerId};

const PERCENT_DP: u32 = 4;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

const Z_95: f64 = 1.96;

/// One metric summarised across runs. Built in a single pass (Welford), so a
/// batch can feed it straight from an iterator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl FromIterator<f64> for Stats {
    fn from_iter<I: IntoIterator<Item = f64>>(samples: I) -> Self {
        let (mut n, mut mean, mut m2) = (0usize, 0.0, 0.0);
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for x in samples {
            n += 1;
            let delta = x - mean;
            mean += delta / n as f64;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }
        if n == 0 {
            return Self::default();
        }
        let std_dev = if n > 1 { (m2 / (n - 1) as f64).sqrt() } else { 0.0 };
        let half_width = Z_95 * std_dev / (n as f64).sqrt();
        Self { mean, std_dev, ci_lower: mean - half_width, ci_upper: mean + half_width, min, max, n }
    }
}

impl Stats {
    pub fn of_fractions(values: &[Rational]) -> Self {
        values.iter().map(Rational::to_f64).collect()
    }
}

/// Exact mean of fractions; `None` when empty or the sum leaves i128.
pub fn exact_mean(values: &[Rational]) -> Option<Rational> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().try_fold(Rational::integer(0), |acc, &v| acc.add(v)).ok()?;
    sum.divide(Rational::integer(values.len() as i128)).ok()
}

/// `share` as a percentage rounded to four places; `None` if out of range.
pub fn percent(share: Rational) -> Option<Decimal> {
    share.to_decimal().map(|d| (d * dec!(100)).round_dp(PERCENT_DP))
}

// ─── Revenue walk ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ShareRow {
    pub node: NodeId,
    pub share: Rational,
    pub percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalkReport {
    pub seed: u64,
    pub total_revenue: Rational,
    pub total_revenue_approx: Option<Decimal>,
    pub buyers: usize,
    pub steps: u64,
    /// Largest share first.
    pub shares: Vec<ShareRow>,
}

impl WalkReport {
    pub fn new(seed: u64, outcome: &WalkOutcome) -> Self {
        let mut shares: Vec<ShareRow> = outcome
            .node_shares
            .iter()
            .map(|(node, &share)| ShareRow { node: node.clone(), share, percent: percent(share) })
            .collect();
        shares.sort_by(|a, b| b.share.partial_cmp(&a.share).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            seed,
            total_revenue: outcome.total_revenue,
            total_revenue_approx: outcome.total_revenue.to_decimal().map(|d| d.round_dp(PERCENT_DP)),
            buyers: outcome.buyers,
            steps: outcome.steps,
            shares,
        }
    }
}

// ─── Ratings & projection ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RatingRow {
    pub player: PlayerId,
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingsReport {
    pub matches: usize,
    /// Highest rating first.
    pub ratings: Vec<RatingRow>,
    pub projection: Option<WinProbabilities>,
}

impl RatingsReport {
    pub fn new(matches: usize, table: &RatingsTable, projection: Option<WinProbabilities>) -> Self {
        Self {
            matches,
            ratings: table.ranked().into_iter().map(|(player, rating)| RatingRow { player, rating }).collect(),
            projection,
        }
    }
}

// ─── Monte Carlo batches ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct WalkBatchReport {
    pub n_runs: usize,
    pub base_seed: u64,
    pub total_revenue: Stats,
    pub total_revenue_exact_mean: Option<Rational>,
    pub node_share: BTreeMap<NodeId, Stats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionBatchReport {
    pub n_runs: usize,
    pub base_seed: u64,
    pub trials_per_run: u32,
    pub win_probability: BTreeMap<PlayerId, Stats>,
}
