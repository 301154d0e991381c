// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Error Types

use std::path::PathBuf;

use crate::rational::Rational;
use crate::types::NodeId;

/// Every failure the engine can report. None of these are recovered from
/// inside the engine; the operation in progress is abandoned.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid fraction: {0} has a zero denominator")]
    InvalidFraction(Rational),

    #[error("connectivity record {from} -> {to} names unknown node {missing}")]
    InvalidGraphReference {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    #[error("{lhs} {op} {rhs} overflows i128")]
    ArithmeticOverflow {
        op: &'static str,
        lhs: Rational,
        rhs: Rational,
    },

    #[error("total revenue is zero, per-node shares are undefined")]
    DivisionByZeroRevenue,

    #[error("invalid ratings table: {0}")]
    InvalidRatingsShape(String),

    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("buyer {buyer} exceeded the step limit of {limit}")]
    StepLimitExceeded { buyer: usize, limit: u64 },

    #[error("revenue not conserved: total {total}, node sum {node_sum}")]
    ConservationViolated { total: Rational, node_sum: Rational },

    #[error("trial count must be positive")]
    InvalidTrialCount,

    #[error("budgets supplied but the graph has no nodes")]
    EmptyGraph,

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
