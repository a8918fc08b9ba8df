//! External-sampling Monte Carlo CFR.
//!
//! Each iteration draws one deal and runs, for every player in turn as the
//! traverser:
//!
//! 1. a strategy pass every `strategy_interval` iterations, adding one unit
//!    of mass to a sampled traverser action at each of its nodes;
//! 2. a regret pass where the traverser explores all actions and everyone
//!    else samples one, optionally pruning actions with very negative
//!    regret once past `prune_threshold`.
//!
//! Early iterations are linearly discounted until `lcfr_threshold`.

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cfr::best_response::{self, Unexplored};
use crate::cfr::config::{CFRStats, MccfrConfig};
use crate::cfr::storage::StrategyTable;
use crate::cfr::traversal::{traverse, update_strategy, SamplingPolicy};
use crate::error::Result;
use crate::games::{GameState, PokerGame};

/// Traverser explores, everyone else samples.
#[derive(Debug)]
pub(crate) struct ExternalSampling {
    traverser: usize,
    prune: bool,
    regret_min: f64,
    rng: StdRng,
}

impl ExternalSampling {
    pub(crate) fn new(regret_min: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            traverser: 0,
            prune: false,
            regret_min,
            rng,
        }
    }
}

impl SamplingPolicy for ExternalSampling {
    fn enumerates(&self, player: usize) -> bool {
        player == self.traverser
    }

    fn updates_regret(&self, player: usize) -> bool {
        player == self.traverser
    }

    fn prunes(&self, regret: f64) -> bool {
        self.prune && regret <= self.regret_min
    }

    fn begin(&mut self, traverser: usize, prune: bool) {
        self.traverser = traverser;
        self.prune = prune;
    }

    fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Run iteration `t` of the external-sampling schedule from `root`, once
/// per traverser, then apply any linear discount due.
pub(crate) fn run_schedule<P: SamplingPolicy>(
    table: &mut StrategyTable,
    root: &GameState,
    config: &MccfrConfig,
    t: u64,
    policy: &mut P,
) -> Result<()> {
    let reach = vec![1.0; root.num_players()];
    for traverser in 0..root.num_players() {
        if config.is_strategy_iteration(t) {
            policy.begin(traverser, false);
            update_strategy(table, root, traverser, policy)?;
        }

        let prune = config.pruning_active(t)
            && policy.rng().gen::<f64>() > config.full_traversal_probability;
        policy.begin(traverser, prune);
        traverse(table, root, &reach, policy)?;
    }

    if let Some(factor) = config.discount_factor(t) {
        table.discount(factor);
    }
    Ok(())
}

/// External-sampling MCCFR trainer.
///
/// # Example
/// ```no_run
/// use cfr_search::cfr::{MccfrConfig, MonteCarloCfr};
/// use cfr_search::games::PokerGame;
///
/// let mut solver = MonteCarloCfr::new(PokerGame::leduc(2), MccfrConfig::default())?;
/// let stats = solver.train(10_000)?;
/// println!("{} info sets in {:.2}s", stats.info_sets, stats.elapsed_seconds);
/// # Ok::<(), cfr_search::error::SolverError>(())
/// ```
pub struct MonteCarloCfr {
    game: PokerGame,
    config: MccfrConfig,
    table: StrategyTable,
    iteration: u64,
    stats: CFRStats,
    sampler: ExternalSampling,
}

impl MonteCarloCfr {
    /// Create a trainer with an empty table.
    pub fn new(game: PokerGame, config: MccfrConfig) -> Result<Self> {
        let table = StrategyTable::new(game.num_players());
        Self::with_table(game, config, table)
    }

    /// Resume training from an existing table.
    pub fn with_table(game: PokerGame, config: MccfrConfig, table: StrategyTable) -> Result<Self> {
        config.validate()?;
        let sampler = ExternalSampling::new(config.regret_min, config.seed);
        Ok(Self {
            game,
            config,
            table,
            iteration: 0,
            stats: CFRStats::new(),
            sampler,
        })
    }

    /// The game being solved.
    pub fn game(&self) -> &PokerGame {
        &self.game
    }

    /// The training schedule.
    pub fn config(&self) -> &MccfrConfig {
        &self.config
    }

    /// Learned regrets and strategy mass.
    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    /// Consume the trainer, keeping the table.
    pub fn into_table(self) -> StrategyTable {
        self.table
    }

    /// Iterations run so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Training statistics.
    pub fn stats(&self) -> &CFRStats {
        &self.stats
    }

    /// Run a single iteration on a fresh deal.
    pub fn run_iteration(&mut self) -> Result<()> {
        self.iteration += 1;
        let root = self.game.sample_state(self.sampler.rng())?;
        run_schedule(
            &mut self.table,
            &root,
            &self.config,
            self.iteration,
            &mut self.sampler,
        )
    }

    /// Train the solver for a specified number of iterations.
    pub fn train(&mut self, iterations: u64) -> Result<&CFRStats> {
        self.train_with_callback(iterations, 0, |_| {})
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback; 0 never calls it
    /// * `callback` - Function called every `callback_interval` iterations
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&CFRStats>
    where
        F: FnMut(&CFRStats),
    {
        info!(
            "MCCFR: {} iterations on {} players",
            iterations,
            self.game.num_players()
        );
        let start_time = Instant::now();
        let start_iteration = self.iteration;

        for i in 0..iterations {
            self.run_iteration()?;

            if callback_interval > 0 && (i + 1) % callback_interval == 0 {
                self.update_stats(start_time, start_iteration);
                callback(&self.stats);
            }
        }

        self.update_stats(start_time, start_iteration);
        info!(
            "MCCFR: {} info sets after {} iterations in {:.2}s",
            self.stats.info_sets, self.stats.iterations, self.stats.elapsed_seconds
        );
        Ok(&self.stats)
    }

    fn update_stats(&mut self, start_time: Instant, start_iteration: u64) {
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.table.num_info_sets();
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        if self.stats.elapsed_seconds > 0.0 {
            self.stats.iterations_per_second =
                (self.iteration - start_iteration) as f64 / self.stats.elapsed_seconds;
        }
    }

    /// Value of the current average strategy for every player.
    pub fn expected_utility(&self) -> Result<Vec<f64>> {
        best_response::expected_utility(&self.game, &self.table, Unexplored::Uniform)
    }

    /// Exploitability of the current average strategy.
    pub fn exploitability(&self) -> Result<f64> {
        best_response::exploitability(&self.game, &self.table, Unexplored::Uniform)
    }

    /// Measure exploitability and record it in the stats.
    pub fn evaluate(&mut self) -> Result<f64> {
        let exploitability = self.exploitability()?;
        debug!(
            "MCCFR: exploitability {:.5} at iteration {}",
            exploitability, self.iteration
        );
        self.stats.record_exploitability(self.iteration, exploitability);
        Ok(exploitability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Action;

    #[test]
    fn test_exploitability_falls_with_training() {
        // Strategy passes every iteration keep the average free of the
        // sampling floor a coarse interval leaves.
        let config = MccfrConfig::default().with_strategy_interval(1).with_seed(3);
        let mut solver = MonteCarloCfr::new(PokerGame::kuhn(2), config).unwrap();
        let mut previous = f64::INFINITY;
        for checkpoint in [200, 2_000, 20_000] {
            solver.train(checkpoint - solver.iteration()).unwrap();
            let exploit = solver.evaluate().unwrap();
            println!("iteration {}: exploitability {:.5}", checkpoint, exploit);
            assert!(exploit < previous, "{} not below {} at {}", exploit, previous, checkpoint);
            previous = exploit;
        }
        assert!(previous < 0.02, "exploitability {}", previous);
        assert_eq!(solver.stats().exploitability_history.len(), 3);
    }

    #[test]
    fn test_kuhn_converges() {
        let config = MccfrConfig::default().with_strategy_interval(10).with_seed(42);
        let mut solver = MonteCarloCfr::new(PokerGame::kuhn(2), config).unwrap();
        solver.train(50_000).unwrap();

        let exploitability = solver.evaluate().unwrap();
        let utility = solver.expected_utility().unwrap();
        println!("MCCFR Kuhn EV {:?}, exploitability {:.5}", utility, exploitability);

        // An interval of 10 leaves a sampling floor of a few hundredths.
        assert!(exploitability < 0.05, "exploitability {}", exploitability);
        assert!((utility[0] + 1.0 / 18.0).abs() < 0.05);
        assert_eq!(solver.stats().exploitability, Some(exploitability));

        let nuts = solver.table().node(1, "3|R1").unwrap();
        let call = nuts.avg_strategy_for(&[Action::Fold, Action::Call])[1];
        assert!(call > 0.9);
    }

    #[test]
    fn test_discounting_shrinks_sums() {
        let game = PokerGame::kuhn(2);
        let config = MccfrConfig::default().with_strategy_interval(1).with_seed(5);
        let mut solver = MonteCarloCfr::new(game, config).unwrap();
        for _ in 0..9 {
            solver.run_iteration().unwrap();
        }
        let before: f64 = solver.table().iter(0).map(|(_, n)| n.strategy_mass()).sum();
        solver.run_iteration().unwrap();
        let after: f64 = solver.table().iter(0).map(|(_, n)| n.strategy_mass()).sum();
        // Iteration 10 adds at most two units of mass for player 0, then
        // halves everything.
        assert!(after <= (before + 2.0) * 0.5 + 1e-9);
    }

    #[test]
    fn test_callback_and_stats() {
        let config = MccfrConfig::default().with_seed(1);
        let mut solver = MonteCarloCfr::new(PokerGame::leduc(2), config).unwrap();
        let mut calls = 0;
        let stats = solver.train_with_callback(50, 10, |_| calls += 1).unwrap();
        assert_eq!(stats.iterations, 50);
        assert!(stats.info_sets > 0);
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MccfrConfig::default().with_strategy_interval(0);
        assert!(MonteCarloCfr::new(PokerGame::kuhn(2), config).is_err());
    }

    #[test]
    fn test_three_player_kuhn_runs() {
        let config = MccfrConfig::default().with_seed(9);
        let mut solver = MonteCarloCfr::new(PokerGame::kuhn(3), config).unwrap();
        solver.train(300).unwrap();
        let utility = solver.expected_utility().unwrap();
        assert!(utility.iter().sum::<f64>().abs() < 1e-9);
        assert!(solver.exploitability().unwrap() >= -1e-9);
    }
}
