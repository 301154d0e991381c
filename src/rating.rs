// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Elo Ratings

//! Simplified Elo: logistic win probability on a rating gap scaled by 100,
//! fixed K-factor of 5, every player seeded at 1500.
//!
//! Matches are applied strictly in input order; each update sees the ratings
//! left by all earlier matches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::{MatchRecord, PlayerId, PLAYER_COUNT};

pub const INITIAL_RATING: f64 = 1500.0;
pub const K_FACTOR: f64 = 5.0;
pub const RATING_SCALE: f64 = 100.0;

// ─── Parameters ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloParams {
    pub initial_rating: f64,
    pub k_factor: f64,
}

impl Default for EloParams {
    fn default() -> Self {
        Self { initial_rating: INITIAL_RATING, k_factor: K_FACTOR }
    }
}

/// Probability that the side rated `rating_a` beats the side rated `rating_b`.
pub fn win_probability(rating_a: f64, rating_b: f64) -> f64 {
    logistic((rating_a - rating_b) / RATING_SCALE)
}

/// `e^x / (1 + e^x)` without overflowing for large |x|.
fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

// ─── RatingsTable ────────────────────────────────────────────────────────────

/// Exactly one finite rating per player `0..8`. Only constructible through
/// [`validate`], so every instance already has the right shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingsTable(BTreeMap<PlayerId, f64>);

impl RatingsTable {
    pub fn uniform(rating: f64) -> Self {
        Self(PlayerId::all().map(|p| (p, rating)).collect())
    }

    pub fn get(&self, player: PlayerId) -> f64 {
        self.0[&player]
    }

    fn get_mut(&mut self, player: PlayerId) -> &mut f64 {
        // Every PlayerId is present by construction.
        self.0.entry(player).or_insert(INITIAL_RATING)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, f64)> + '_ {
        self.0.iter().map(|(&p, &r)| (p, r))
    }

    /// Highest rating first; ties keep seed order.
    pub fn ranked(&self) -> Vec<(PlayerId, f64)> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows
    }

    pub fn as_map(&self) -> &BTreeMap<PlayerId, f64> {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RatingsTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        validate_labelled(raw.iter().map(|(k, &v)| (k.as_str(), v))).map_err(serde::de::Error::custom)
    }
}

/// Check an integer-keyed table: exactly 8 entries, keys exactly `0..=7`,
/// every value finite.
pub fn validate<I>(entries: I) -> EngineResult<RatingsTable>
where
    I: IntoIterator<Item = (i64, f64)>,
{
    let mut table = BTreeMap::new();
    let mut count = 0;
    for (key, value) in entries {
        count += 1;
        let player = PlayerId::new(key)?;
        if !value.is_finite() {
            return Err(EngineError::InvalidRatingsShape(format!(
                "rating for player {key} is not a number: {value}"
            )));
        }
        if table.insert(player, value).is_some() {
            return Err(EngineError::InvalidRatingsShape(format!("player {key} listed twice")));
        }
    }
    if count != PLAYER_COUNT || table.len() != PLAYER_COUNT {
        return Err(EngineError::InvalidRatingsShape(format!(
            "expected {PLAYER_COUNT} entries, found {count}"
        )));
    }
    Ok(RatingsTable(table))
}

/// Like [`validate`] for tables whose keys arrive as text; a key that is not
/// an integer fails the whole table.
pub fn validate_labelled<'a, I>(entries: I) -> EngineResult<RatingsTable>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let parsed = entries
        .into_iter()
        .map(|(key, value)| {
            key.trim()
                .parse::<i64>()
                .map(|k| (k, value))
                .map_err(|_| EngineError::InvalidRatingsShape(format!("player key {key:?} is not an integer")))
        })
        .collect::<EngineResult<Vec<_>>>()?;
    validate(parsed)
}

// ─── RatingEngine ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RatingEngine {
    params: EloParams,
    table: RatingsTable,
    applied: usize,
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(EloParams::default())
    }
}

impl RatingEngine {
    pub fn new(params: EloParams) -> Self {
        Self { params, table: RatingsTable::uniform(params.initial_rating), applied: 0 }
    }

    /// Continue from an existing table.
    pub fn from_table(params: EloParams, table: RatingsTable) -> Self {
        Self { params, table, applied: 0 }
    }

    pub fn ratings(&self) -> &RatingsTable {
        &self.table
    }

    pub fn into_ratings(self) -> RatingsTable {
        self.table
    }

    pub fn matches_applied(&self) -> usize {
        self.applied
    }

    /// Winner gains `K * (1 - p)`, loser gives up the same amount, where `p`
    /// is the winner's pre-match win probability.
    pub fn apply_match(&mut self, winner: PlayerId, loser: PlayerId) {
        let p = win_probability(self.table.get(winner), self.table.get(loser));
        let delta = self.params.k_factor * (1.0 - p);
        *self.table.get_mut(winner) += delta;
        *self.table.get_mut(loser) += self.params.k_factor * (0.0 - (1.0 - p));
        self.applied += 1;
    }

    pub fn apply_history(&mut self, history: &[MatchRecord]) -> &RatingsTable {
        for m in history {
            self.apply_match(m.winner, m.loser);
        }
        log::info!("applied {} match(es), {} total", history.len(), self.applied);
        &self.table
    }
}

/// Ratings after replaying `history` from the default starting table.
pub fn calculate_ratings(history: &[MatchRecord]) -> RatingsTable {
    let mut engine = RatingEngine::default();
    engine.apply_history(history);
    engine.into_ratings()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: i64) -> PlayerId {
        PlayerId::new(id).expect("test: valid player")
    }

    #[test]
    fn equal_ratings_are_a_coin_flip() {
        assert_eq!(win_probability(1500.0, 1500.0), 0.5);
    }

    #[test]
    fn probability_matches_logistic_formula() {
        let x: f64 = (1600.0 - 1500.0) / 100.0;
        let expected = x.exp() / (1.0 + x.exp());
        assert!((win_probability(1600.0, 1500.0) - expected).abs() < 1e-12);
        let sum = win_probability(1420.0, 1555.0) + win_probability(1555.0, 1420.0);
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn huge_gaps_do_not_overflow() {
        assert_eq!(win_probability(1.0e6, 0.0), 1.0);
        assert_eq!(win_probability(0.0, 1.0e6), 0.0);
        assert!(!win_probability(1.0e6, -1.0e6).is_nan());
    }

    #[test]
    fn first_match_moves_two_and_a_half_points() {
        let mut engine = RatingEngine::default();
        engine.apply_match(p(0), p(1));
        assert_eq!(engine.ratings().get(p(0)), 1502.5);
        assert_eq!(engine.ratings().get(p(1)), 1497.5);
        assert_eq!(engine.ratings().get(p(2)), 1500.0);
    }

    #[test]
    fn history_is_applied_in_order() {
        let history = [
            MatchRecord::new(0, 1).expect("test: record"),
            MatchRecord::new(0, 1).expect("test: record"),
        ];
        let table = calculate_ratings(&history);
        // Second win is worth less because 0 is now favoured.
        let second = table.get(p(0)) - 1502.5;
        assert!(second > 0.0 && second < 2.5, "second gain {second}");
        let total: f64 = table.iter().map(|(_, r)| r).sum();
        assert!((total - 8.0 * 1500.0).abs() < 1e-9);
    }

    #[test]
    fn validate_accepts_eight_players() {
        let table = validate((0..8).map(|k| (k, 1500.0 + k as f64))).expect("test: valid");
        assert_eq!(table.get(p(7)), 1507.0);
        assert_eq!(table.ranked()[0].0, p(7));
    }

    #[test]
    fn validate_rejects_wrong_sizes() {
        let seven = validate((0..7).map(|k| (k, 1500.0)));
        assert!(matches!(seven, Err(EngineError::InvalidRatingsShape(_))));
        let nine = validate((0..9).map(|k| (k, 1500.0)));
        assert!(matches!(nine, Err(EngineError::InvalidRatingsShape(_))));
    }

    #[test]
    fn validate_rejects_bad_keys_and_values() {
        let dup = validate((0..8).map(|k| (k.min(6), 1500.0)));
        assert!(dup.is_err());
        let nan = validate((0..8).map(|k| (k, if k == 3 { f64::NAN } else { 1500.0 })));
        assert!(nan.is_err());
        let labels = ["0", "1", "2", "3", "4", "5", "6", "seven"];
        let text = validate_labelled(labels.iter().map(|&k| (k, 1500.0)));
        assert!(matches!(text, Err(EngineError::InvalidRatingsShape(_))));
        let labels = ["0", "1", "2", "3", "4", "5", "6", "7"];
        assert!(validate_labelled(labels.iter().map(|&k| (k, 1500.0))).is_ok());
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = RatingsTable::uniform(1500.0);
        let json = serde_json::to_string(&table).expect("test: serialize");
        let back: RatingsTable = serde_json::from_str(&json).expect("test: deserialize");
        assert_eq!(back, table);
        assert!(serde_json::from_str::<RatingsTable>(r#"{"0": 1500.0}"#).is_err());
    }

    #[test]
    fn custom_params_change_step_size() {
        let mut engine = RatingEngine::new(EloParams { k_factor: 10.0, ..EloParams::default() });
        engine.apply_match(p(3), p(4));
        assert_eq!(engine.ratings().get(p(3)), 1505.0);
        assert_eq!(engine.matches_applied(), 1);
    }
}
