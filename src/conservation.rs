// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Conservation Logic

//! Exact revenue accounting.
//!
//! Two invariants hold after every walk:
//!
//! ```text
//! total_revenue = Σ node.revenue
//! Σ initial_budget = total_revenue + Σ remaining_budget
//! ```
//!
//! Fractions are exact, so there is no tolerance: any difference is a bug.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::rational::Rational;
use crate::types::GraphNode;

/// Running budget ledger for one simulation run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConservationLaw {
    budgets_in: Rational,
    budgets_left: Rational,
    buyers: usize,
}

impl Default for ConservationLaw {
    fn default() -> Self {
        Self::new()
    }
}

impl ConservationLaw {
    pub fn new() -> Self {
        Self {
            budgets_in: Rational::integer(0),
            budgets_left: Rational::integer(0),
            buyers: 0,
        }
    }

    /// Book one finished buyer.
    pub fn record_buyer(&mut self, initial: Rational, remaining: Rational) -> EngineResult<()> {
        self.budgets_in = self.budgets_in.add(initial)?;
        self.budgets_left = self.budgets_left.add(remaining)?;
        self.buyers += 1;
        Ok(())
    }

    pub fn buyers(&self) -> usize {
        self.buyers
    }

    /// Check both invariants against the finished graph.
    pub fn verify(&self, total_revenue: Rational, nodes: &[GraphNode]) -> EngineResult<()> {
        let node_sum = node_revenue_sum(nodes)?;
        if node_sum != total_revenue {
            return Err(EngineError::ConservationViolated { total: total_revenue, node_sum });
        }
        let spent = self.budgets_in.subtract(self.budgets_left)?;
        if spent != total_revenue {
            return Err(EngineError::ConservationViolated { total: total_revenue, node_sum: spent });
        }
        Ok(())
    }
}

pub fn node_revenue_sum(nodes: &[GraphNode]) -> EngineResult<Rational> {
    nodes
        .iter()
        .try_fold(Rational::integer(0), |acc, n| acc.add(n.revenue))
}
