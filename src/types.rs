// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::rational::Rational;

// ─── NodeId ──────────────────────────────────────────────────────────────────

/// Mall (graph node) identifier as it appears in the input files.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self { NodeId(s) }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self { NodeId(s.to_string()) }
}

// ─── PlayerId ────────────────────────────────────────────────────────────────

/// Number of seeded players in a bracket.
pub const PLAYER_COUNT: usize = 8;

/// Player identifier, always in `0..PLAYER_COUNT`.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    pub fn new(id: i64) -> EngineResult<Self> {
        if (0..PLAYER_COUNT as i64).contains(&id) {
            Ok(Self(id as u8))
        } else {
            Err(EngineError::InvalidRatingsShape(format!(
                "player id {id} outside 0..{PLAYER_COUNT}"
            )))
        }
    }

    /// Compile-time seeds; `n` must be below `PLAYER_COUNT`.
    pub(crate) const fn seeded(n: u8) -> Self {
        Self(n)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// All players in seed order.
    pub fn all() -> impl Iterator<Item = PlayerId> {
        (0..PLAYER_COUNT as u8).map(PlayerId)
    }
}

impl TryFrom<i64> for PlayerId {
    type Error = EngineError;
    fn try_from(id: i64) -> Result<Self, Self::Error> { PlayerId::new(id) }
}

impl From<PlayerId> for u8 {
    fn from(p: PlayerId) -> u8 { p.0 }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Input Records ───────────────────────────────────────────────────────────

/// One pricing line: `id min_num min_den frac_num frac_den`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecord {
    pub id: NodeId,
    pub minimum_price: Rational,
    pub spend_rate: Rational,
}

impl PricingRecord {
    pub fn new(id: impl Into<NodeId>, minimum_price: Rational, spend_rate: Rational) -> Self {
        Self { id: id.into(), minimum_price, spend_rate }
    }
}

/// One directed edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityRecord {
    pub from: NodeId,
    pub to: NodeId,
}

impl ConnectivityRecord {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// One historical result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub winner: PlayerId,
    pub loser: PlayerId,
}

impl MatchRecord {
    pub fn new(winner: i64, loser: i64) -> EngineResult<Self> {
        Ok(Self { winner: PlayerId::new(winner)?, loser: PlayerId::new(loser)? })
    }
}

// ─── GraphNode ───────────────────────────────────────────────────────────────

/// A mall. Only `revenue` changes once the graph is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Edge targets in input order; duplicates weight the random choice.
    pub neighbors: Vec<NodeId>,
    pub minimum_price: Rational,
    pub spend_rate: Rational,
    pub revenue: Rational,
}

impl GraphNode {
    pub fn from_record(record: &PricingRecord) -> Self {
        Self {
            id: record.id.clone(),
            neighbors: Vec::new(),
            minimum_price: record.minimum_price,
            spend_rate: record.spend_rate,
            revenue: Rational::integer(0),
        }
    }

    pub fn is_dead_end(&self) -> bool {
        self.neighbors.is_empty()
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode {}

impl std::hash::Hash for GraphNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ─── Buyer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    pub current: NodeId,
    pub remaining_budget: Rational,
}

impl Buyer {
    pub fn new(start: NodeId, budget: i64) -> Self {
        Self { current: start, remaining_budget: Rational::integer(budget as i128) }
    }
}
