//! Hand-strength evaluators.
//!
//! The game state never inspects cards itself at showdown; it calls the
//! evaluator injected at construction. Higher scores win, equal scores tie.

use std::fmt::Debug;

use super::card::Card;

/// Scores a player's hole card against the revealed board.
pub trait HandEvaluator: Debug + Send + Sync {
    /// Rank a hand. Higher is better; equal values split the pot.
    fn eval(&self, hole: Card, board: &[Card]) -> u32;
}

/// Kuhn poker: the hole card's rank is the hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct KuhnEvaluator;

impl HandEvaluator for KuhnEvaluator {
    fn eval(&self, hole: Card, _board: &[Card]) -> u32 {
        hole.rank() as u32
    }
}

/// Leduc hold'em: pairing the board beats any unpaired hand, otherwise the
/// high card then the low card decide.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeducEvaluator;

impl HandEvaluator for LeducEvaluator {
    fn eval(&self, hole: Card, board: &[Card]) -> u32 {
        let hole_rank = hole.rank() as u32;
        if board.iter().any(|&c| c == hole) {
            return 15 * 14 + hole_rank;
        }

        let high = board.iter().map(|c| c.rank() as u32).fold(hole_rank, u32::max);
        let low = board.iter().map(|c| c.rank() as u32).fold(hole_rank, u32::min);
        14 * high + low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kuhn_eval() {
        let eval = KuhnEvaluator;
        assert!(eval.eval(Card::new(3, 1), &[]) > eval.eval(Card::new(2, 1), &[]));
    }

    #[test]
    fn test_leduc_pair_beats_high_card() {
        let eval = LeducEvaluator;
        let board = [Card::new(12, 1)];
        let pair = eval.eval(Card::new(12, 2), &board);
        let ace_high = eval.eval(Card::new(14, 1), &board);
        let king_high = eval.eval(Card::new(13, 1), &board);

        assert!(pair > ace_high);
        assert!(ace_high > king_high);
        assert_eq!(eval.eval(Card::new(13, 2), &board), king_high);
    }
}
