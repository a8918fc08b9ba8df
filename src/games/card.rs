//! Card representation.
//!
//! Cards in Kuhn- and Leduc-style games only matter by rank: the suit is
//! kept for display and to tell physical copies apart in a deck, but two
//! cards of equal rank compare, order and hash the same.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Suit characters for display (1-4).
const SUIT_CHARS: [char; 4] = ['s', 'h', 'd', 'c'];

/// A single playing card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    rank: u8,
    suit: u8,
}

impl Card {
    /// Create a card from a rank (2-14 for real decks, 1-3 for Kuhn) and a
    /// suit (1-4).
    #[inline]
    pub fn new(rank: u8, suit: u8) -> Self {
        Self { rank, suit }
    }

    /// The card's rank.
    #[inline]
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// The card's suit.
    #[inline]
    pub fn suit(&self) -> u8 {
        self.suit
    }

    /// Rank as it appears in information-set keys.
    pub fn rank_str(&self) -> String {
        match self.rank {
            10 => "T".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            14 => "A".to_string(),
            r => r.to_string(),
        }
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl Eq for Card {}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank)
    }
}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit = SUIT_CHARS
            .get((self.suit as usize).wrapping_sub(1))
            .copied()
            .unwrap_or('?');
        write!(f, "{}{}", self.rank_str(), suit)
    }
}

/// Kuhn deck: one card each of ranks 1..=`num_cards`.
pub fn kuhn_deck(num_cards: u8) -> Vec<Card> {
    (1..=num_cards).map(|rank| Card::new(rank, 1)).collect()
}

/// Leduc deck: two suits of the `num_ranks` highest ranks (Q, K, A for the
/// classic three-rank game).
pub fn leduc_deck(num_ranks: u8) -> Vec<Card> {
    let low = 15 - num_ranks;
    (1..=2)
        .flat_map(|suit| (low..=14).map(move |rank| Card::new(rank, suit)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_suit() {
        assert_eq!(Card::new(12, 1), Card::new(12, 2));
        assert_ne!(Card::new(12, 1), Card::new(13, 1));
        assert!(Card::new(14, 2) > Card::new(13, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Card::new(12, 1).to_string(), "Qs");
        assert_eq!(Card::new(14, 2).to_string(), "Ah");
        assert_eq!(Card::new(2, 1).rank_str(), "2");
    }

    #[test]
    fn test_decks() {
        assert_eq!(kuhn_deck(3).len(), 3);
        let leduc = leduc_deck(3);
        assert_eq!(leduc.len(), 6);
        assert_eq!(leduc.iter().filter(|c| c.rank() == 12).count(), 2);
    }
}
