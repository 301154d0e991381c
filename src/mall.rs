// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Buyer Revenue Walk

//! Budget-carrying buyers random-walk a directed mall graph.
//!
//! At each mall a buyer whose remaining budget is strictly above the mall's
//! minimum price spends `remaining * spend_rate` there, then moves to a
//! uniformly random outgoing neighbor (with replacement, duplicate edges
//! weigh more). A buyer stops when the budget is at or below the minimum
//! price, or right after spending at a mall with no outgoing edges.
//!
//! A spend rate of zero, or a minimum price the budget never reaches, walks
//! forever. Set [`WalkLimits::max_steps_per_buyer`] to bound test runs.
//! Fractions that no longer fit in i128 fail the run with
//! `ArithmeticOverflow` rather than wrapping.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::conservation::ConservationLaw;
use crate::error::{EngineError, EngineResult};
use crate::rational::Rational;
use crate::types::{Buyer, ConnectivityRecord, GraphNode, NodeId, PricingRecord};

/// Optional guard for pathological inputs. Unbounded by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkLimits {
    pub max_steps_per_buyer: Option<u64>,
}

/// Finished run: exact totals plus each mall's share of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkOutcome {
    pub total_revenue: Rational,
    pub node_shares: BTreeMap<NodeId, Rational>,
    pub buyers: usize,
    pub steps: u64,
}

// ─── MallSimulation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MallSimulation {
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    // Same edges as `GraphNode::neighbors`, resolved to positions in `nodes`.
    adjacency: Vec<Vec<usize>>,
    budgets: Vec<i64>,
    limits: WalkLimits,
    total_revenue: Rational,
}

impl MallSimulation {
    /// Build the graph from parsed records. A repeated pricing id replaces the
    /// earlier record in place. Edges naming an unknown mall are rejected.
    pub fn build(
        pricing: &[PricingRecord],
        connectivity: &[ConnectivityRecord],
        budgets: &[i64],
    ) -> EngineResult<Self> {
        let mut nodes: Vec<GraphNode> = Vec::with_capacity(pricing.len());
        let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(pricing.len());
        for record in pricing {
            match index.get(&record.id) {
                Some(&i) => nodes[i] = GraphNode::from_record(record),
                None => {
                    index.insert(record.id.clone(), nodes.len());
                    nodes.push(GraphNode::from_record(record));
                }
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in connectivity {
            let lookup = |id: &NodeId| {
                index.get(id).copied().ok_or_else(|| EngineError::InvalidGraphReference {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: id.clone(),
                })
            };
            let from = lookup(&edge.from)?;
            let to = lookup(&edge.to)?;
            nodes[from].neighbors.push(edge.to.clone());
            adjacency[from].push(to);
        }

        if nodes.is_empty() && !budgets.is_empty() {
            return Err(EngineError::EmptyGraph);
        }

        Ok(Self {
            nodes,
            index,
            adjacency,
            budgets: budgets.to_vec(),
            limits: WalkLimits::default(),
            total_revenue: Rational::integer(0),
        })
    }

    pub fn with_limits(mut self, limits: WalkLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_limits(&mut self, limits: WalkLimits) {
        self.limits = limits;
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn total_revenue(&self) -> Rational {
        self.total_revenue
    }

    /// Run every buyer to completion and return the revenue split.
    ///
    /// Revenue counters are reset first, so repeated runs are independent.
    /// All start malls are drawn before the first walk begins.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EngineResult<WalkOutcome> {
        self.reset();
        let buyers = self.spawn_buyers(rng);

        let mut law = ConservationLaw::new();
        let mut steps = 0;
        for (n, buyer) in buyers.into_iter().enumerate() {
            let initial = buyer.remaining_budget;
            let (finished, taken) = self.walk(n, buyer, rng)?;
            log::debug!(
                "buyer {n} stopped at {} with {} left after {taken} step(s)",
                finished.current,
                finished.remaining_budget
            );
            law.record_buyer(initial, finished.remaining_budget)?;
            steps += taken;
        }
        law.verify(self.total_revenue, &self.nodes)?;

        let node_shares = self.revenue_shares()?;
        log::info!(
            "{} buyer(s) spent {} across {} mall(s) in {steps} step(s)",
            law.buyers(),
            self.total_revenue,
            self.nodes.len()
        );
        Ok(WalkOutcome {
            total_revenue: self.total_revenue,
            node_shares,
            buyers: law.buyers(),
            steps,
        })
    }

    fn reset(&mut self) {
        for node in &mut self.nodes {
            node.revenue = Rational::integer(0);
        }
        self.total_revenue = Rational::integer(0);
    }

    fn spawn_buyers<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Buyer> {
        self.budgets
            .iter()
            .map(|&budget| {
                let start = rng.gen_range(0..self.nodes.len());
                Buyer::new(self.nodes[start].id.clone(), budget)
            })
            .collect()
    }

    /// Walk one buyer; returns the finished buyer and its spend count.
    fn walk<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        mut buyer: Buyer,
        rng: &mut R,
    ) -> EngineResult<(Buyer, u64)> {
        let mut at = self.index[&buyer.current];
        let mut steps = 0;
        while buyer.remaining_budget.greater_than(self.nodes[at].minimum_price)? {
            if let Some(limit) = self.limits.max_steps_per_buyer {
                if steps >= limit {
                    return Err(EngineError::StepLimitExceeded { buyer: n, limit });
                }
            }
            let node = &mut self.nodes[at];
            let spent = buyer.remaining_budget.multiply(node.spend_rate)?;
            buyer.remaining_budget = buyer.remaining_budget.subtract(spent)?;
            node.revenue = node.revenue.add(spent)?;
            self.total_revenue = self.total_revenue.add(spent)?;
            steps += 1;

            let exits = &self.adjacency[at];
            if exits.is_empty() {
                break;
            }
            at = exits[rng.gen_range(0..exits.len())];
            buyer.current = self.nodes[at].id.clone();
        }
        Ok((buyer, steps))
    }

    fn revenue_shares(&self) -> EngineResult<BTreeMap<NodeId, Rational>> {
        if self.total_revenue.numerator() == 0 {
            return Err(EngineError::DivisionByZeroRevenue);
        }
        self.nodes
            .iter()
            .map(|node| Ok((node.id.clone(), node.revenue.divide(self.total_revenue)?)))
            .collect()
    }
}

/// Build and run in one call; returns `(total_revenue, node_shares)`.
pub fn run_simulation<R: Rng + ?Sized>(
    pricing: &[PricingRecord],
    connectivity: &[ConnectivityRecord],
    budgets: &[i64],
    rng: &mut R,
) -> EngineResult<(Rational, BTreeMap<NodeId, Rational>)> {
    let outcome = MallSimulation::build(pricing, connectivity, budgets)?.run(rng)?;
    Ok((outcome.total_revenue, outcome.node_shares))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn frac(n: i128, d: i128) -> Rational {
        Rational::new(n, d)
    }

    /// A stream whose first draw, made exactly as `spawn_buyers` makes it,
    /// picks the first of `malls` nodes.
    fn starting_at_first_mall(malls: usize) -> ChaCha8Rng {
        (0..256)
            .map(ChaCha8Rng::seed_from_u64)
            .find(|r| r.clone().gen_range(0..malls) == 0)
            .expect("test: some seed starts at the first mall")
    }

    fn two_malls() -> (Vec<PricingRecord>, Vec<ConnectivityRecord>) {
        (
            vec![
                PricingRecord::new("A", frac(1, 1), frac(1, 2)),
                PricingRecord::new("B", frac(1, 1), frac(1, 1)),
            ],
            vec![ConnectivityRecord::new("A", "B")],
        )
    }

    #[test]
    fn build_keeps_edge_order_and_duplicates() {
        let pricing = vec![
            PricingRecord::new("A", frac(1, 1), frac(1, 2)),
            PricingRecord::new("B", frac(1, 1), frac(1, 2)),
        ];
        let edges = vec![
            ConnectivityRecord::new("A", "B"),
            ConnectivityRecord::new("A", "A"),
            ConnectivityRecord::new("A", "B"),
        ];
        let sim = MallSimulation::build(&pricing, &edges, &[]).expect("test: valid graph");
        let a = sim.node(&NodeId::from("A")).expect("test: A exists");
        let ids: Vec<&str> = a.neighbors.iter().map(|n| n.0.as_str()).collect();
        assert_eq!(ids, ["B", "A", "B"]);
        assert!(sim.node(&NodeId::from("B")).expect("test: B exists").is_dead_end());
    }

    #[test]
    fn unknown_edge_endpoint_is_rejected() {
        let (pricing, _) = two_malls();
        let edges = vec![ConnectivityRecord::new("A", "Z")];
        let err = MallSimulation::build(&pricing, &edges, &[10]).expect_err("test: bad edge");
        match err {
            EngineError::InvalidGraphReference { missing, .. } => assert_eq!(missing, NodeId::from("Z")),
            other => panic!("unexpected error: {other}"),
        }
        let edges = vec![ConnectivityRecord::new("Q", "A")];
        assert!(MallSimulation::build(&pricing, &edges, &[10]).is_err());
    }

    #[test]
    fn repeated_pricing_id_replaces_in_place() {
        let pricing = vec![
            PricingRecord::new("A", frac(1, 1), frac(1, 2)),
            PricingRecord::new("B", frac(1, 1), frac(1, 2)),
            PricingRecord::new("A", frac(3, 1), frac(1, 4)),
        ];
        let sim = MallSimulation::build(&pricing, &[], &[]).expect("test: valid graph");
        assert_eq!(sim.nodes().len(), 2);
        assert_eq!(sim.nodes()[0].minimum_price, frac(3, 1));
    }

    #[test]
    fn two_mall_walk_splits_revenue_evenly() {
        let (pricing, edges) = two_malls();
        let mut sim = MallSimulation::build(&pricing, &edges, &[10]).expect("test: valid graph");
        let outcome = sim.run(&mut starting_at_first_mall(2)).expect("test: walk completes");
        assert_eq!(outcome.total_revenue, frac(10, 1));
        assert_eq!(outcome.node_shares[&NodeId::from("A")], frac(1, 2));
        assert_eq!(outcome.node_shares[&NodeId::from("B")], frac(1, 2));
        assert_eq!(outcome.steps, 2);
        // 10 * 1/2 spent at A, the remaining 5 * 1 at B.
        assert_eq!(sim.node(&NodeId::from("A")).expect("test: A").revenue, frac(5, 1));
        assert_eq!(sim.node(&NodeId::from("B")).expect("test: B").revenue, frac(5, 1));
    }

    #[test]
    fn seed_search_matches_spawn_draw() {
        let (pricing, edges) = two_malls();
        let sim = MallSimulation::build(&pricing, &edges, &[10]).expect("test: valid graph");
        let buyers = sim.spawn_buyers(&mut starting_at_first_mall(2));
        assert_eq!(buyers[0].current, NodeId::from("A"));
    }

    #[test]
    fn fraction_overflow_fails_the_run() {
        // 96/97 per step: the denominator passes i128 after about 20 spends.
        let pricing = vec![PricingRecord::new("A", frac(1, 1), frac(1, 97))];
        let edges = vec![ConnectivityRecord::new("A", "A")];
        let mut sim = MallSimulation::build(&pricing, &edges, &[100]).expect("test: valid graph");
        let err = sim.run(&mut ChaCha8Rng::seed_from_u64(0)).expect_err("test: overflows");
        assert!(matches!(err, EngineError::ArithmeticOverflow { .. }), "got {err}");
    }

    #[test]
    fn dead_end_stops_after_one_spend() {
        let pricing = vec![PricingRecord::new("A", frac(1, 1), frac(1, 10))];
        let mut sim = MallSimulation::build(&pricing, &[], &[100]).expect("test: valid graph");
        let outcome = sim.run(&mut ChaCha8Rng::seed_from_u64(1)).expect("test: walk completes");
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.total_revenue, frac(10, 1));
        assert_eq!(outcome.node_shares[&NodeId::from("A")], frac(1, 1));
    }

    #[test]
    fn budget_at_minimum_never_spends() {
        let pricing = vec![PricingRecord::new("A", frac(5, 1), frac(1, 2))];
        let mut sim = MallSimulation::build(&pricing, &[], &[5]).expect("test: valid graph");
        let err = sim.run(&mut ChaCha8Rng::seed_from_u64(0)).expect_err("test: no revenue");
        assert!(matches!(err, EngineError::DivisionByZeroRevenue), "got {err}");
    }

    #[test]
    fn zero_spend_rate_hits_step_limit() {
        let pricing = vec![PricingRecord::new("A", frac(1, 1), frac(0, 1))];
        let edges = vec![ConnectivityRecord::new("A", "A")];
        let mut sim = MallSimulation::build(&pricing, &edges, &[10])
            .expect("test: valid graph")
            .with_limits(WalkLimits { max_steps_per_buyer: Some(50) });
        let err = sim.run(&mut ChaCha8Rng::seed_from_u64(0)).expect_err("test: loops");
        assert!(matches!(err, EngineError::StepLimitExceeded { buyer: 0, limit: 50 }), "got {err}");
    }

    #[test]
    fn budgets_without_nodes_are_rejected() {
        let err = MallSimulation::build(&[], &[], &[10]).expect_err("test: no malls");
        assert!(matches!(err, EngineError::EmptyGraph));
    }

    #[test]
    fn same_seed_same_outcome() {
        let pricing = vec![
            PricingRecord::new("A", frac(1, 1), frac(1, 3)),
            PricingRecord::new("B", frac(2, 1), frac(1, 4)),
            PricingRecord::new("C", frac(1, 2), frac(1, 2)),
        ];
        let edges = vec![
            ConnectivityRecord::new("A", "B"),
            ConnectivityRecord::new("A", "C"),
            ConnectivityRecord::new("B", "C"),
            ConnectivityRecord::new("C", "A"),
        ];
        let budgets = [40, 17, 99, 3];
        let a = run_simulation(&pricing, &edges, &budgets, &mut ChaCha8Rng::seed_from_u64(9))
            .expect("test: run a");
        let b = run_simulation(&pricing, &edges, &budgets, &mut ChaCha8Rng::seed_from_u64(9))
            .expect("test: run b");
        assert_eq!(a, b);
    }

    #[test]
    fn reruns_start_from_zero_revenue() {
        let pricing = vec![PricingRecord::new("A", frac(1, 1), frac(1, 2))];
        let mut sim = MallSimulation::build(&pricing, &[], &[8]).expect("test: valid graph");
        let first = sim.run(&mut ChaCha8Rng::seed_from_u64(0)).expect("test: first run");
        let second = sim.run(&mut ChaCha8Rng::seed_from_u64(0)).expect("test: second run");
        assert_eq!(first.total_revenue, second.total_revenue);
        assert_eq!(sim.total_revenue(), frac(4, 1));
    }
}
