//! Error types for the solver.
//!
//! State-machine violations (`InvalidAction`, `InvalidStateTransition`) are
//! caller bugs and abort the current hand or iteration. Missing information
//! sets signal insufficient training and carry the offending key.

use thiserror::Error;

use crate::games::Action;

/// Errors raised by the game state machine, the trainers and the search.
#[derive(Error, Debug)]
pub enum SolverError {
    /// An action outside `valid_actions()` was applied.
    #[error("invalid action {action} at history {history:?}")]
    InvalidAction {
        /// The rejected action.
        action: Action,
        /// Public history of the state it was applied to.
        history: String,
    },

    /// An action was applied to a terminal state, or a terminal-only query
    /// was made on a live one.
    #[error("invalid state transition: {action}")]
    InvalidStateTransition {
        /// Description of the attempted transition.
        action: String,
    },

    /// An average strategy was requested for an information set that
    /// training never visited.
    #[error("information set {key:?} of player {player} was never explored; train longer")]
    UnexploredInformationSet {
        /// Owner of the information set.
        player: usize,
        /// Information set key.
        key: String,
    },

    /// A live-play call was made for the wrong seat.
    #[error("seat {turn} is due to act but the searching player is seat {player}")]
    OutOfTurn {
        /// Seat that is due to act.
        turn: usize,
        /// Seat of the searching player.
        player: usize,
    },

    /// A deal did not contain the expected number of cards.
    #[error("a deal needs {expected} cards, got {actual}")]
    InvalidDeal {
        /// Cards required by the game configuration.
        expected: usize,
        /// Cards supplied.
        actual: usize,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem failure while saving or loading a strategy table.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON checkpoint or config.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when validating a configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field is out of its allowed range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A probability is out of range [0, 1].
    #[error("probability {0} is out of range [0, 1]")]
    InvalidProbability(f64),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolverError>;
