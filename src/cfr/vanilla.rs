//! Vanilla CFR.
//!
//! Every player's actions are explored at every node. Regret at a node is
//! weighted by the product of the other players' reach probabilities and
//! strategy mass by the acting player's own reach, so the average strategy
//! converges to equilibrium in two-player zero-sum games.

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cfr::config::CFRStats;
use crate::cfr::storage::StrategyTable;
use crate::cfr::traversal::{traverse, SamplingPolicy};
use crate::error::Result;
use crate::games::{Action, Card, PokerGame};

/// Full enumeration with reach weighting.
struct Exhaustive<'a> {
    rng: &'a mut StdRng,
}

impl SamplingPolicy for Exhaustive<'_> {
    fn enumerates(&self, _player: usize) -> bool {
        true
    }

    fn updates_regret(&self, _player: usize) -> bool {
        true
    }

    fn regret_weight(&self, reach: &[f64], player: usize) -> f64 {
        reach
            .iter()
            .enumerate()
            .filter(|&(p, _)| p != player)
            .map(|(_, r)| r)
            .product()
    }

    fn strategy_weight(&self, reach: &[f64], player: usize) -> Option<f64> {
        Some(reach[player])
    }

    fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }
}

/// One player's average strategy at one information set.
pub type StrategyLine = (String, Vec<(Action, f64)>);

/// Outcome of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Mean root value per player over the run's iterations.
    pub utility: Vec<f64>,

    /// Every player's average strategies, ordered by key length then key.
    pub strategies: Vec<Vec<StrategyLine>>,
}

impl TrainingReport {
    /// Collect the ordered average strategies of every player.
    pub fn from_table(table: &StrategyTable, utility: Vec<f64>) -> Self {
        let strategies = (0..table.num_players())
            .map(|player| {
                table
                    .sorted_keys(player)
                    .into_iter()
                    .filter_map(|key| {
                        table
                            .average_strategy(player, key)
                            .map(|strategy| (key.clone(), strategy))
                    })
                    .collect()
            })
            .collect();
        Self { utility, strategies }
    }
}

/// Vanilla CFR trainer.
pub struct VanillaCfr {
    game: PokerGame,
    table: StrategyTable,
    iteration: u64,
    stats: CFRStats,
    rng: StdRng,
}

impl VanillaCfr {
    /// Create a trainer with an empty table.
    pub fn new(game: PokerGame, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let table = StrategyTable::new(game.num_players());
        Self {
            game,
            table,
            iteration: 0,
            stats: CFRStats::new(),
            rng,
        }
    }

    /// The game being solved.
    pub fn game(&self) -> &PokerGame {
        &self.game
    }

    /// Learned regrets and strategy mass.
    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    /// Consume the trainer, keeping the table.
    pub fn into_table(self) -> StrategyTable {
        self.table
    }

    /// Training statistics.
    pub fn stats(&self) -> &CFRStats {
        &self.stats
    }

    fn walk(&mut self, cards: Vec<Card>) -> Result<Vec<f64>> {
        let state = self.game.initial_state(cards)?;
        let reach = vec![1.0; self.game.num_players()];
        let mut policy = Exhaustive { rng: &mut self.rng };
        traverse(&mut self.table, &state, &reach, &mut policy)
    }

    /// Chance-sampled CFR: one random deal per iteration.
    pub fn train(&mut self, iterations: u64) -> Result<TrainingReport> {
        info!("vanilla CFR: {} sampled iterations", iterations);
        let start = Instant::now();
        let mut total = vec![0.0; self.game.num_players()];

        for _ in 0..iterations {
            self.iteration += 1;
            let deal = self.game.sample_deal(&mut self.rng);
            let value = self.walk(deal)?;
            for (t, v) in total.iter_mut().zip(&value) {
                *t += v;
            }
        }

        self.finish(start, total, iterations as f64)
    }

    /// Exact CFR: every iteration walks every deal, each with chance
    /// probability `1 / deals`.
    pub fn train_exhaustive(&mut self, iterations: u64) -> Result<TrainingReport> {
        let deals = self.game.deals();
        info!(
            "vanilla CFR: {} exhaustive iterations over {} deals",
            iterations,
            deals.len()
        );
        let start = Instant::now();
        let mut total = vec![0.0; self.game.num_players()];

        for _ in 0..iterations {
            self.iteration += 1;
            for deal in &deals {
                let value = self.walk(deal.clone())?;
                for (t, v) in total.iter_mut().zip(&value) {
                    *t += v;
                }
            }
        }

        self.finish(start, total, (iterations * deals.len() as u64) as f64)
    }

    fn finish(&mut self, start: Instant, total: Vec<f64>, samples: f64) -> Result<TrainingReport> {
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.table.num_info_sets();
        self.stats.elapsed_seconds = start.elapsed().as_secs_f64();
        self.stats.update_rate();
        debug!(
            "vanilla CFR: {} info sets after {} iterations ({:.0} it/s)",
            self.stats.info_sets, self.stats.iterations, self.stats.iterations_per_second
        );

        let utility = total.into_iter().map(|t| t / samples.max(1.0)).collect();
        Ok(TrainingReport::from_table(&self.table, utility))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::best_response::{exploitability, expected_utility, Unexplored};

    fn prob(report: &TrainingReport, player: usize, key: &str, action: Action) -> f64 {
        report.strategies[player]
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, strategy)| strategy.iter().find(|(a, _)| *a == action))
            .map(|&(_, p)| p)
            .unwrap_or_else(|| panic!("no {} at {}", action, key))
    }

    #[test]
    fn test_kuhn_converges() {
        let game = PokerGame::kuhn(2);
        let mut solver = VanillaCfr::new(game.clone(), Some(42));
        let report = solver.train_exhaustive(20_000).unwrap();

        let utility = expected_utility(&game, solver.table(), Unexplored::Fail).unwrap();
        let exploit = exploitability(&game, solver.table(), Unexplored::Fail).unwrap();
        println!("Kuhn EV {:?}, exploitability {:.5}", utility, exploit);

        assert!((utility[0] + 1.0 / 18.0).abs() < 0.02, "EV {:?}", utility);
        assert!(exploit < 0.01, "exploitability {}", exploit);
        assert!(exploit >= -1e-9);

        // Second player bets the nuts, and the lowest card never calls.
        assert!(prob(&report, 1, "3|X", Action::Raise(1)) > 0.9);
        assert!(prob(&report, 1, "3|R1", Action::Call) > 0.9);
        assert!(prob(&report, 1, "1|R1", Action::Fold) > 0.9);
        assert!(prob(&report, 0, "1|XR1", Action::Fold) > 0.9);
        assert!(prob(&report, 0, "2|", Action::Check) > 0.9);
    }

    #[test]
    fn test_exploitability_falls_with_training() {
        let game = PokerGame::kuhn(2);
        let mut solver = VanillaCfr::new(game.clone(), Some(42));
        let mut done = 0;
        let mut previous = f64::INFINITY;
        for checkpoint in [10, 100, 1_000, 5_000] {
            solver.train_exhaustive(checkpoint - done).unwrap();
            done = checkpoint;
            let exploit = exploitability(&game, solver.table(), Unexplored::Fail).unwrap();
            println!("iteration {}: exploitability {:.5}", checkpoint, exploit);
            assert!(exploit < previous, "{} not below {} at {}", exploit, previous, checkpoint);
            previous = exploit;
        }
    }

    #[test]
    fn test_report_ordering_and_distributions() {
        let mut solver = VanillaCfr::new(PokerGame::kuhn(2), Some(7));
        let report = solver.train(500).unwrap();

        assert_eq!(report.utility.len(), 2);
        assert!((report.utility.iter().sum::<f64>()).abs() < 1e-9);
        for lines in &report.strategies {
            assert!(!lines.is_empty());
            for pair in lines.windows(2) {
                let (a, b) = (&pair[0].0, &pair[1].0);
                assert!(a.len() < b.len() || (a.len() == b.len() && a < b));
            }
            for (_, strategy) in lines {
                let total: f64 = strategy.iter().map(|(_, p)| p).sum();
                assert!((total - 1.0).abs() < 1e-9);
            }
        }
        assert_eq!(solver.stats().iterations, 500);
        // 6 information sets per player in two-player Kuhn.
        assert_eq!(solver.stats().info_sets, 12);
    }

    #[test]
    fn test_three_player_runs() {
        let mut solver = VanillaCfr::new(PokerGame::kuhn(3), Some(3));
        let report = solver.train(200).unwrap();
        assert!(report.utility.iter().sum::<f64>().abs() < 1e-9);
    }
}
