// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite

pub mod error;
pub mod types;
pub mod rational;
pub mod conservation;
pub mod mall;
pub mod rating;
pub mod tournament;
pub mod loaders;
pub mod config;
pub mod report;
pub mod monte_carlo;

pub use error::{EngineError, EngineResult};
pub use types::*;
pub use rational::Rational;
pub use mall::{run_simulation, MallSimulation, WalkLimits, WalkOutcome};
pub use rating::{calculate_ratings, validate, win_probability, EloParams, RatingEngine, RatingsTable};
pub use tournament::{project_win_probabilities, simulate_bracket, simulate_match, WinProbabilities};
pub use config::EngineConfig;

use wasm_bindgen::prelude::*;

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser handle on a mall graph. Each `run` uses the next seed in sequence.
#[wasm_bindgen]
pub struct WasmMallSimulation {
    sim: MallSimulation,
    seed: u64,
    runs: usize,
}

#[wasm_bindgen]
impl WasmMallSimulation {
    /// Takes the three input files' text, parsed exactly as the CLI does.
    #[wasm_bindgen(constructor)]
    pub fn new(pricing: &str, connectivity: &str, budgets: &str, seed: u64) -> Result<WasmMallSimulation, JsValue> {
        install_panic_hook();
        let sim = MallSimulation::build(
            &loaders::parse_pricing(pricing).map_err(to_js)?,
            &loaders::parse_connectivity(connectivity).map_err(to_js)?,
            &loaders::parse_budgets(budgets).map_err(to_js)?,
        )
        .map_err(to_js)?;
        Ok(Self { sim, seed, runs: 0 })
    }

    pub fn set_max_steps(&mut self, max_steps: Option<u64>) {
        self.sim.set_limits(WalkLimits { max_steps_per_buyer: max_steps });
    }

    /// One walk; returns a `WalkReport`.
    pub fn run(&mut self) -> Result<JsValue, JsValue> {
        let seed = self.seed.wrapping_add(self.runs as u64);
        let outcome = self.sim.run(&mut monte_carlo::rng_for_run(self.seed, self.runs)).map_err(to_js)?;
        self.runs += 1;
        Ok(serde_wasm_bindgen::to_value(&report::WalkReport::new(seed, &outcome))?)
    }

    /// `n_runs` walks; returns a `WalkBatchReport`.
    pub fn run_batch(&mut self, n_runs: usize) -> Result<JsValue, JsValue> {
        let base = self.seed.wrapping_add(self.runs as u64);
        let (_, batch) = monte_carlo::run_walk_batch(&mut self.sim, n_runs, base).map_err(to_js)?;
        self.runs += n_runs;
        Ok(serde_wasm_bindgen::to_value(&batch)?)
    }

    pub fn get_nodes(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.sim.nodes()).unwrap_or(JsValue::NULL)
    }
}

/// Browser handle on the rating engine and bracket projector.
#[wasm_bindgen]
pub struct WasmTournament {
    engine: RatingEngine,
    seed: u64,
    trials: u32,
    projections: usize,
}

#[wasm_bindgen]
impl WasmTournament {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, trials: u32) -> Result<WasmTournament, JsValue> {
        install_panic_hook();
        if trials == 0 {
            return Err(to_js(EngineError::InvalidTrialCount));
        }
        Ok(Self { engine: RatingEngine::default(), seed, trials, projections: 0 })
    }

    /// Replay a `winner,loser` CSV on top of the current ratings.
    pub fn apply_history_csv(&mut self, csv: &str) -> Result<usize, JsValue> {
        let history = loaders::parse_matches(csv).map_err(to_js)?;
        self.engine.apply_history(&history);
        Ok(history.len())
    }

    pub fn apply_match(&mut self, winner: u8, loser: u8) -> Result<(), JsValue> {
        let record = MatchRecord::new(winner as i64, loser as i64).map_err(to_js)?;
        self.engine.apply_match(record.winner, record.loser);
        Ok(())
    }

    pub fn get_ratings(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.engine.ratings()).unwrap_or(JsValue::NULL)
    }

    /// Project title odds from the current ratings.
    pub fn project(&mut self) -> Result<JsValue, JsValue> {
        let mut rng = monte_carlo::rng_for_run(self.seed, self.projections);
        let probs = project_win_probabilities(self.engine.ratings(), self.trials, &mut rng).map_err(to_js)?;
        self.projections += 1;
        Ok(serde_wasm_bindgen::to_value(&probs)?)
    }

    pub fn reset(&mut self) {
        self.engine = RatingEngine::default();
        self.projections = 0;
    }
}
