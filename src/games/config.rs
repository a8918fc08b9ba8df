//! Game configuration.
//!
//! A flat description of the betting structure and deck. One config covers
//! the whole Kuhn/Leduc family for any number of players.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::card::{kuhn_deck, leduc_deck, Card};
use crate::error::ConfigError;

/// Which showdown rule the game uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Single private card, highest rank wins.
    Kuhn,
    /// Private card plus one board card, pairs beat high cards.
    Leduc,
}

/// Configuration for a poker variant.
///
/// # Example
/// ```
/// use cfr_search::games::GameConfig;
///
/// let config = GameConfig::kuhn(2);
/// assert_eq!(config.num_cards(), 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Showdown rule.
    pub variant: Variant,

    /// Number of seats.
    pub num_players: usize,

    /// Number of betting rounds. One board card is revealed before every
    /// round after the first.
    pub num_rounds: usize,

    /// Maximum number of raises per round. Once reached only fold, check
    /// and call remain.
    pub max_raises: u8,

    /// Default raise size for each round.
    pub raise_sizes: Vec<u32>,

    /// Chips every player puts in before the first action.
    pub ante: u32,

    /// The deck dealt from each hand.
    pub deck: Vec<Card>,
}

impl GameConfig {
    /// Kuhn poker for `num_players` players with `num_players + 1` cards.
    pub fn kuhn(num_players: usize) -> Self {
        Self {
            variant: Variant::Kuhn,
            num_players,
            num_rounds: 1,
            max_raises: 1,
            raise_sizes: vec![1],
            ante: 1,
            deck: kuhn_deck(num_players as u8 + 1),
        }
    }

    /// Leduc hold'em for `num_players` players: two suits of
    /// `num_players + 1` ranks, two rounds, raise sizes 2 then 4.
    pub fn leduc(num_players: usize) -> Self {
        Self {
            variant: Variant::Leduc,
            num_players,
            num_rounds: 2,
            max_raises: 2,
            raise_sizes: vec![2, 4],
            ante: 1,
            deck: leduc_deck(num_players as u8 + 1),
        }
    }

    /// Cards dealt per hand: one private card per player plus one board
    /// card per round after the first.
    pub fn num_cards(&self) -> usize {
        self.num_players + self.num_rounds - 1
    }

    /// Builder method: set the raise cap per round.
    pub fn with_max_raises(mut self, max_raises: u8) -> Self {
        self.max_raises = max_raises;
        self
    }

    /// Builder method: set the raise size per round.
    pub fn with_raise_sizes(mut self, raise_sizes: Vec<u32>) -> Self {
        self.raise_sizes = raise_sizes;
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::invalid("path", e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::invalid("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_players < 2 {
            return Err(ConfigError::invalid("num_players", "need at least 2 players"));
        }
        if self.num_rounds == 0 {
            return Err(ConfigError::invalid("num_rounds", "need at least 1 round"));
        }
        if self.raise_sizes.len() != self.num_rounds {
            return Err(ConfigError::invalid(
                "raise_sizes",
                format!("expected {} sizes, got {}", self.num_rounds, self.raise_sizes.len()),
            ));
        }
        if self.raise_sizes.iter().any(|&s| s == 0) {
            return Err(ConfigError::invalid("raise_sizes", "sizes must be positive"));
        }
        if self.deck.len() < self.num_cards() {
            return Err(ConfigError::invalid(
                "deck",
                format!("{} cards cannot cover a {}-card deal", self.deck.len(), self.num_cards()),
            ));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::kuhn(2)
    }
}
