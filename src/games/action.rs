//! Betting actions.
//!
//! A small fixed set of action kinds. Raise sizes are open-ended so that the
//! action universe can grow at runtime when a live opponent bets a size the
//! blueprint never modelled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A betting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Give up the hand.
    Fold,
    /// Pass when nothing is owed.
    Check,
    /// Match the current maximum bet.
    Call,
    /// Match the current maximum bet and add this many chips on top.
    Raise(u32),
}

impl Action {
    /// Check if this is a bet or raise.
    pub fn is_aggressive(&self) -> bool {
        matches!(self, Action::Raise(_))
    }

    /// Check if this action keeps the player in without adding pressure.
    pub fn is_passive(&self) -> bool {
        matches!(self, Action::Check | Action::Call)
    }

    /// Get the raise size if applicable.
    pub fn amount(&self) -> Option<u32> {
        match self {
            Action::Raise(size) => Some(*size),
            _ => None,
        }
    }

    /// Get a short code for this action (for info state keys).
    pub fn short_code(&self) -> String {
        match self {
            Action::Fold => "F".to_string(),
            Action::Check => "X".to_string(),
            Action::Call => "C".to_string(),
            Action::Raise(size) => format!("R{}", size),
        }
    }

    /// Parse an action from its short code.
    pub fn from_short_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'F' if code.len() == 1 => Some(Action::Fold),
            'X' if code.len() == 1 => Some(Action::Check),
            'C' if code.len() == 1 => Some(Action::Call),
            'R' => code[1..].parse().ok().filter(|&s| s > 0).map(Action::Raise),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fold => write!(f, "Fold"),
            Action::Check => write!(f, "Check"),
            Action::Call => write!(f, "Call"),
            Action::Raise(size) => write!(f, "Raise {}", size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_short_codes() {
        assert_eq!(Action::Fold.short_code(), "F");
        assert_eq!(Action::Check.short_code(), "X");
        assert_eq!(Action::Call.short_code(), "C");
        assert_eq!(Action::Raise(4).short_code(), "R4");
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(Action::from_short_code("F"), Some(Action::Fold));
        assert_eq!(Action::from_short_code("X"), Some(Action::Check));
        assert_eq!(Action::from_short_code("R12"), Some(Action::Raise(12)));
        assert_eq!(Action::from_short_code("R0"), None);
        assert_eq!(Action::from_short_code("Q"), None);
        assert_eq!(Action::from_short_code(""), None);
    }

    #[test]
    fn test_action_properties() {
        assert!(Action::Raise(2).is_aggressive());
        assert!(Action::Call.is_passive());
        assert!(Action::Check.is_passive());
        assert!(!Action::Fold.is_passive());
        assert_eq!(Action::Raise(3).amount(), Some(3));
        assert_eq!(Action::Call.amount(), None);
    }
}
