// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Monte Carlo Batches
//
// N repetitions per batch, run i seeded with base_seed + i, aggregated into
// mean ± 95% CI.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::EngineResult;
use crate::mall::{MallSimulation, WalkOutcome};
use crate::rating::RatingsTable;
use crate::rational::Rational;
use crate::report::{exact_mean, ProjectionBatchReport, Stats, WalkBatchReport};
use crate::tournament::{project_win_probabilities, WinProbabilities};
use crate::types::{NodeId, PlayerId};

pub fn rng_for_run(base_seed: u64, run: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(run as u64))
}

/// Repeat the walk `n_runs` times on the same graph.
pub fn run_walk_batch(
    sim: &mut MallSimulation,
    n_runs: usize,
    base_seed: u64,
) -> EngineResult<(Vec<WalkOutcome>, WalkBatchReport)> {
    let mut outcomes = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        outcomes.push(sim.run(&mut rng_for_run(base_seed, i))?);
    }

    let totals: Vec<Rational> = outcomes.iter().map(|o| o.total_revenue).collect();
    let mut per_node: BTreeMap<NodeId, Vec<Rational>> = BTreeMap::new();
    for outcome in &outcomes {
        for (node, &share) in &outcome.node_shares {
            per_node.entry(node.clone()).or_default().push(share);
        }
    }

    let report = WalkBatchReport {
        n_runs,
        base_seed,
        total_revenue: Stats::of_fractions(&totals),
        total_revenue_exact_mean: exact_mean(&totals),
        node_share: per_node.iter().map(|(n, s)| (n.clone(), Stats::of_fractions(s))).collect(),
    };
    log::info!(
        "walk batch: {n_runs} run(s), mean revenue {:.4} (95% CI {:.4}..{:.4})",
        report.total_revenue.mean,
        report.total_revenue.ci_lower,
        report.total_revenue.ci_upper
    );
    Ok((outcomes, report))
}

/// Repeat the bracket projection `n_runs` times, each with its own stream.
pub fn run_projection_batch(
    ratings: &RatingsTable,
    trials: u32,
    n_runs: usize,
    base_seed: u64,
) -> EngineResult<(Vec<WinProbabilities>, ProjectionBatchReport)> {
    let mut projections = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        projections.push(project_win_probabilities(ratings, trials, &mut rng_for_run(base_seed, i))?);
    }

    let win_probability = PlayerId::all()
        .map(|p| (p, projections.iter().map(|w| w.get(p)).collect::<Stats>()))
        .collect();

    Ok((
        projections,
        ProjectionBatchReport { n_runs, base_seed, trials_per_run: trials, win_probability },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConnectivityRecord, PricingRecord};

    #[test]
    fn walk_batch_aggregates_every_run() {
        let pricing = vec![
            PricingRecord::new("A", Rational::integer(1), Rational::new(1, 2)),
            PricingRecord::new("B", Rational::integer(1), Rational::new(1, 3)),
        ];
        let edges = vec![ConnectivityRecord::new("A", "B"), ConnectivityRecord::new("B", "A")];
        let mut sim = MallSimulation::build(&pricing, &edges, &[20, 30, 50]).expect("test: valid graph");
        let (outcomes, report) = run_walk_batch(&mut sim, 5, 100).expect("test: batch");
        assert_eq!(outcomes.len(), 5);
        assert_eq!(report.total_revenue.n, 5);
        assert_eq!(report.node_share.len(), 2);
        // Total spend can never exceed the summed budgets.
        assert!(report.total_revenue.max <= 100.0);
        let exact = report.total_revenue_exact_mean.expect("test: mean fits");
        assert!((exact.to_f64() - report.total_revenue.mean).abs() < 1e-9);
        let again = run_walk_batch(&mut sim, 5, 100).expect("test: batch").1;
        assert_eq!(again.total_revenue, report.total_revenue);
    }

    #[test]
    fn projection_batch_keeps_each_run_normalised() {
        let table = RatingsTable::uniform(1500.0);
        let (runs, report) = run_projection_batch(&table, 50, 4, 9).expect("test: batch");
        assert_eq!(runs.len(), 4);
        for run in &runs {
            assert!((run.total() - 1.0).abs() < 1e-9);
        }
        let mean_sum: f64 = report.win_probability.values().map(|s| s.mean).sum();
        assert!((mean_sum - 1.0).abs() < 1e-9);
    }
}
