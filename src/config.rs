// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Run Configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::loaders::read_source;
use crate::mall::WalkLimits;
use crate::rating::EloParams;
use crate::tournament::DEFAULT_TRIALS;

/// Everything a run can tune. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base seed; Monte Carlo run `i` uses `seed + i`.
    pub seed: u64,
    /// Repetitions per Monte Carlo batch.
    pub runs: usize,
    /// Brackets per projection.
    pub trials: u32,
    pub elo: EloParams,
    pub limits: WalkLimits,
    /// Where JSON and CSV results are written.
    pub output_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            runs: 1,
            trials: DEFAULT_TRIALS,
            elo: EloParams::default(),
            limits: WalkLimits::default(),
            output_dir: "results".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        Self::from_json(&read_source(path)?)
    }

    pub fn check(&self) -> EngineResult<()> {
        if self.runs == 0 {
            return Err(EngineError::Config("runs must be at least 1".into()));
        }
        if self.trials == 0 {
            return Err(EngineError::InvalidTrialCount);
        }
        if !self.elo.k_factor.is_finite() || !self.elo.initial_rating.is_finite() {
            return Err(EngineError::Config("elo parameters must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.trials, 100);
        assert_eq!(config.elo.initial_rating, 1500.0);
        assert_eq!(config.elo.k_factor, 5.0);
        assert_eq!(config.limits.max_steps_per_buyer, None);
        assert!(config.check().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"seed": 42, "limits": {"max_steps_per_buyer": 1000}}"#)
            .expect("test: valid config");
        assert_eq!(config.seed, 42);
        assert_eq!(config.limits.max_steps_per_buyer, Some(1000));
        assert_eq!(config.trials, 100);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(EngineConfig::from_json(r#"{"runs": 0}"#).is_err());
        assert!(matches!(
            EngineConfig::from_json(r#"{"trials": 0}"#),
            Err(EngineError::InvalidTrialCount)
        ));
        assert!(EngineConfig::from_json(r#"{"elo": {"initial_rating": 1500.0, "k_factor": 1e999}}"#).is_err());
        assert!(matches!(EngineConfig::from_json("not json"), Err(EngineError::Config(_))));
    }
}
