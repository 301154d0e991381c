// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Bracket Projection

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::rating::{self, RatingsTable};
use crate::types::PlayerId;

pub const DEFAULT_TRIALS: u32 = 100;

/// Round-one pairings by seed. Winners of the first two meet in one semifinal,
/// winners of the last two in the other.
pub const FIRST_ROUND: [(PlayerId, PlayerId); 4] = [
    (PlayerId::seeded(0), PlayerId::seeded(7)),
    (PlayerId::seeded(1), PlayerId::seeded(6)),
    (PlayerId::seeded(2), PlayerId::seeded(5)),
    (PlayerId::seeded(3), PlayerId::seeded(4)),
];

// ─── Single matches and brackets ─────────────────────────────────────────────

/// One Bernoulli trial: `a` wins if a uniform draw in `[0, 1)` falls below
/// its win probability.
pub fn simulate_match<R: Rng + ?Sized>(
    ratings: &RatingsTable,
    a: PlayerId,
    b: PlayerId,
    rng: &mut R,
) -> PlayerId {
    let p = rating::win_probability(ratings.get(a), ratings.get(b));
    if rng.gen::<f64>() < p {
        a
    } else {
        b
    }
}

/// Play the fixed eight-seed bracket once and return the champion.
pub fn simulate_bracket<R: Rng + ?Sized>(ratings: &RatingsTable, rng: &mut R) -> PlayerId {
    let mut round: Vec<PlayerId> = FIRST_ROUND
        .iter()
        .map(|&(a, b)| simulate_match(ratings, a, b, rng))
        .collect();
    while round.len() > 1 {
        round = round
            .chunks(2)
            .map(|pair| simulate_match(ratings, pair[0], pair[1], rng))
            .collect();
    }
    round[0]
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// Empirical title odds per player; every player is present, zeros included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinProbabilities {
    pub trials: u32,
    pub probabilities: BTreeMap<PlayerId, f64>,
}

impl WinProbabilities {
    pub fn get(&self, player: PlayerId) -> f64 {
        self.probabilities.get(&player).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }

    /// Most likely champion first; ties in seed order.
    pub fn ranked(&self) -> Vec<(PlayerId, f64)> {
        let mut rows: Vec<_> = self.probabilities.iter().map(|(&p, &v)| (p, v)).collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows
    }

    /// `rank,player,probability` rows, best first.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("rank,player,probability\n");
        for (rank, (player, prob)) in self.ranked().into_iter().enumerate() {
            out.push_str(&format!("{},{player},{prob}\n", rank + 1));
        }
        out
    }
}

/// Run `trials` independent brackets and count champions.
pub fn project_win_probabilities<R: Rng + ?Sized>(
    ratings: &RatingsTable,
    trials: u32,
    rng: &mut R,
) -> EngineResult<WinProbabilities> {
    // Re-check the shape in case the table arrived from outside the engine.
    let ratings = rating::validate(ratings.iter().map(|(p, r)| (p.index() as i64, r)))?;
    if trials == 0 {
        return Err(EngineError::InvalidTrialCount);
    }

    let mut wins: BTreeMap<PlayerId, u32> = PlayerId::all().map(|p| (p, 0)).collect();
    for _ in 0..trials {
        let champion = simulate_bracket(&ratings, rng);
        *wins.entry(champion).or_insert(0) += 1;
    }
    log::debug!("bracket champions over {trials} trial(s): {wins:?}");

    let probabilities = wins
        .into_iter()
        .map(|(p, n)| (p, n as f64 / trials as f64))
        .collect();
    Ok(WinProbabilities { trials, probabilities })
}
