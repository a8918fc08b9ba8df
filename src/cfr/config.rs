//! Configuration options for the solvers.
//!
//! [`MccfrConfig`] holds the external-sampling schedule (strategy interval,
//! pruning, linear discounting). [`SearchConfig`] bounds a real-time
//! subgame search, which runs the same schedule on a smaller tree.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for Monte Carlo CFR.
///
/// # Example
/// ```
/// use cfr_search::cfr::MccfrConfig;
///
/// let config = MccfrConfig::default();
/// assert_eq!(config.strategy_interval, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MccfrConfig {
    /// Run a strategy pass every this many iterations.
    ///
    /// Only strategy passes add to the average strategy, so a coarse
    /// interval leaves a noise floor on exploitability: on two-player Kuhn
    /// the default of 100 levels off near 0.03, an interval of 1 goes well
    /// below 0.01.
    pub strategy_interval: u64,

    /// Iterations after which negative-regret pruning may kick in.
    pub prune_threshold: u64,

    /// Linear discounting is applied every this many iterations.
    pub discount_interval: u64,

    /// Linear discounting stops at this iteration.
    pub lcfr_threshold: u64,

    /// Actions whose cumulative regret is at or below this value are
    /// skipped during a pruned pass.
    pub regret_min: f64,

    /// Probability that a pass past `prune_threshold` still explores every
    /// action.
    pub full_traversal_probability: f64,

    /// Random seed for reproducibility.
    ///
    /// If `None`, a random seed is used.
    pub seed: Option<u64>,
}

impl Default for MccfrConfig {
    fn default() -> Self {
        Self {
            strategy_interval: 100,
            prune_threshold: 200,
            discount_interval: 10,
            lcfr_threshold: 400,
            regret_min: -300_000.0,
            full_traversal_probability: 0.05,
            seed: None,
        }
    }
}

impl MccfrConfig {
    /// Create a new MccfrConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule without pruning or discounting: plain external sampling.
    pub fn plain() -> Self {
        Self {
            prune_threshold: u64::MAX,
            lcfr_threshold: 0,
            ..Default::default()
        }
    }

    /// Builder method: set the strategy-pass interval.
    pub fn with_strategy_interval(mut self, interval: u64) -> Self {
        self.strategy_interval = interval;
        self
    }

    /// Builder method: set the iteration after which pruning starts.
    pub fn with_prune_threshold(mut self, threshold: u64) -> Self {
        self.prune_threshold = threshold;
        self
    }

    /// Builder method: set discount interval and the iteration at which
    /// discounting stops.
    pub fn with_discounting(mut self, interval: u64, until: u64) -> Self {
        self.discount_interval = interval;
        self.lcfr_threshold = until;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Whether iteration `t` runs a strategy pass.
    pub fn is_strategy_iteration(&self, t: u64) -> bool {
        t % self.strategy_interval == 0
    }

    /// Whether pruning may apply at iteration `t`.
    pub fn pruning_active(&self, t: u64) -> bool {
        t > self.prune_threshold
    }

    /// Linear-CFR factor `d / (d + 1)` with `d = t / discount_interval`,
    /// if iteration `t` discounts.
    pub fn discount_factor(&self, t: u64) -> Option<f64> {
        if t >= self.lcfr_threshold || t % self.discount_interval != 0 {
            return None;
        }
        let d = (t / self.discount_interval) as f64;
        Some(d / (d + 1.0))
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy_interval == 0 {
            return Err(ConfigError::invalid("strategy_interval", "must be positive"));
        }
        if self.discount_interval == 0 {
            return Err(ConfigError::invalid("discount_interval", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.full_traversal_probability) {
            return Err(ConfigError::InvalidProbability(self.full_traversal_probability));
        }
        if self.regret_min >= 0.0 {
            return Err(ConfigError::invalid("regret_min", "must be negative"));
        }
        Ok(())
    }
}

/// Bounds for one real-time subgame search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// MCCFR iterations per search.
    pub iterations: u64,

    /// Blueprint playouts averaged per leaf evaluation.
    pub rollouts: usize,

    /// Multiplier applied to the continuation's action kind during a
    /// playout before renormalising.
    pub bias: f64,

    /// Schedule used by the search's MCCFR.
    pub mccfr: MccfrConfig,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            rollouts: 5,
            bias: 5.0,
            mccfr: MccfrConfig::default(),
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Create a new SearchConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set iterations per search.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder method: set playouts per leaf evaluation.
    pub fn with_rollouts(mut self, rollouts: usize) -> Self {
        self.rollouts = rollouts;
        self
    }

    /// Builder method: set the continuation bias.
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Builder method: set the search's MCCFR schedule.
    pub fn with_mccfr(mut self, mccfr: MccfrConfig) -> Self {
        self.mccfr = mccfr;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rollouts == 0 {
            return Err(ConfigError::invalid("rollouts", "need at least one playout"));
        }
        if self.bias.is_nan() || self.bias < 1.0 {
            return Err(ConfigError::invalid("bias", "must be at least 1"));
        }
        self.mccfr.validate()
    }
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFRStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of unique information sets discovered.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Estimated exploitability (if calculated).
    pub exploitability: Option<f64>,

    /// History of exploitability measurements.
    pub exploitability_history: Vec<ExploitabilityPoint>,
}

/// A single exploitability measurement at a specific iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploitabilityPoint {
    /// Iteration number when this measurement was taken.
    pub iteration: u64,
    /// Exploitability in chips per hand.
    pub exploitability: f64,
}

impl CFRStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record an exploitability measurement.
    pub fn record_exploitability(&mut self, iteration: u64, exploitability: f64) {
        self.exploitability = Some(exploitability);
        self.exploitability_history.push(ExploitabilityPoint {
            iteration,
            exploitability,
        });
    }
}
