//! Poker games solved by the CFR engine.
//!
//! One parameterised state machine covers the Kuhn and Leduc families for
//! any number of players:
//!
//! | Game  | Rounds | Deck                  | Raise sizes | Raise cap |
//! |-------|--------|-----------------------|-------------|-----------|
//! | Kuhn  | 1      | `n + 1` single cards  | 1           | 1         |
//! | Leduc | 2      | two suits of `n + 1`  | 2, 4        | 2         |
//!
//! Two-player Kuhn has a known Nash equilibrium (player 1 EV = -1/18) and
//! serves as the correctness check for every algorithm in [`crate::cfr`].
//!
//! ## Kuhn game tree
//!
//! ```text
//! P1 (first to act)
//! ├── Check
//! │   └── P2
//! │       ├── Check → Showdown (pot = 2)
//! │       └── Raise
//! │           └── P1
//! │               ├── Fold → P2 wins (pot = 3)
//! │               └── Call → Showdown (pot = 4)
//! └── Raise
//!     └── P2
//!         ├── Fold → P1 wins (pot = 3)
//!         └── Call → Showdown (pot = 4)
//! ```

pub mod action;
pub mod card;
pub mod config;
pub mod eval;
pub mod state;

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

pub use action::Action;
pub use card::Card;
pub use config::{GameConfig, Variant};
pub use eval::{HandEvaluator, KuhnEvaluator, LeducEvaluator};
pub use state::{public_part, GameState, PlayerState};

use crate::error::{ConfigError, Result};

/// A game definition: betting structure plus the showdown evaluator.
///
/// Cheap to clone; both halves are shared.
#[derive(Debug, Clone)]
pub struct PokerGame {
    config: Arc<GameConfig>,
    evaluator: Arc<dyn HandEvaluator>,
}

impl PokerGame {
    /// Kuhn poker for `num_players` players.
    pub fn kuhn(num_players: usize) -> Self {
        Self {
            config: Arc::new(GameConfig::kuhn(num_players)),
            evaluator: Arc::new(KuhnEvaluator),
        }
    }

    /// Leduc hold'em for `num_players` players.
    pub fn leduc(num_players: usize) -> Self {
        Self {
            config: Arc::new(GameConfig::leduc(num_players)),
            evaluator: Arc::new(LeducEvaluator),
        }
    }

    /// Build a game from a validated configuration, picking the evaluator
    /// that matches its variant.
    pub fn from_config(config: GameConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let evaluator: Arc<dyn HandEvaluator> = match config.variant {
            Variant::Kuhn => Arc::new(KuhnEvaluator),
            Variant::Leduc => Arc::new(LeducEvaluator),
        };
        Ok(Self::with_evaluator(config, evaluator))
    }

    /// Build a game with a custom showdown evaluator.
    pub fn with_evaluator(config: GameConfig, evaluator: Arc<dyn HandEvaluator>) -> Self {
        Self {
            config: Arc::new(config),
            evaluator,
        }
    }

    /// The betting structure.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of seats.
    pub fn num_players(&self) -> usize {
        self.config.num_players
    }

    /// Start a hand with the given deal.
    pub fn initial_state(&self, cards: Vec<Card>) -> Result<GameState> {
        GameState::new(Arc::clone(&self.config), Arc::clone(&self.evaluator), cards)
    }

    /// Draw a random deal from the deck.
    pub fn sample_deal<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Card> {
        let mut deck = self.config.deck.clone();
        let (dealt, _) = deck.partial_shuffle(rng, self.config.num_cards());
        dealt.to_vec()
    }

    /// Start a hand with a random deal.
    pub fn sample_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GameState> {
        self.initial_state(self.sample_deal(rng))
    }

    /// Every ordered deal of physical cards.
    ///
    /// Copies of a rank are distinct cards, so each deal has the same chance
    /// probability `1 / deals().len()`.
    pub fn deals(&self) -> Vec<Vec<Card>> {
        let mut deals = Vec::new();
        let mut used = vec![false; self.config.deck.len()];
        let mut current = Vec::with_capacity(self.config.num_cards());
        self.permute(&mut used, &mut current, &mut deals);
        deals
    }

    fn permute(&self, used: &mut [bool], current: &mut Vec<Card>, deals: &mut Vec<Vec<Card>>) {
        if current.len() == self.config.num_cards() {
            deals.push(current.clone());
            return;
        }
        for i in 0..self.config.deck.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            current.push(self.config.deck[i]);
            self.permute(used, current, deals);
            current.pop();
            used[i] = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_deal_counts() {
        assert_eq!(PokerGame::kuhn(2).deals().len(), 6);
        assert_eq!(PokerGame::kuhn(3).deals().len(), 24);
        assert_eq!(PokerGame::leduc(2).deals().len(), 120);
    }

    #[test]
    fn test_sample_deal_uses_distinct_cards() {
        let game = PokerGame::leduc(2);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let deal = game.sample_deal(&mut rng);
            assert_eq!(deal.len(), 3);
            // At most two copies of a rank exist in the deck.
            assert!(!(deal[0] == deal[1] && deal[1] == deal[2]));
        }
    }

    #[test]
    fn test_short_deal_rejected() {
        let game = PokerGame::leduc(2);
        assert!(game.initial_state(vec![Card::new(12, 1)]).is_err());
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = GameConfig::leduc(2);
        config.num_players = 1;
        assert!(PokerGame::from_config(config).is_err());
        assert!(PokerGame::from_config(GameConfig::kuhn(3)).is_ok());
    }
}
