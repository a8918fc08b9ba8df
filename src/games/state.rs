//! Poker game state representation.
//!
//! `GameState` is the extensive-form state machine shared by every algorithm:
//! the per-player bet ledger, fold flags, the per-round action history, the
//! current round and actor, and the dealt cards. Pot accounting is derived
//! from the bet ledger only, never reconstructed from the history.

use std::fmt;
use std::sync::Arc;

use super::action::Action;
use super::card::Card;
use super::config::GameConfig;
use super::eval::HandEvaluator;
use crate::error::{Result, SolverError};

/// Per-seat bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    /// Chips committed to the pot so far, ante included.
    pub bet: u32,
    /// Whether the player has folded. Folded players never act again.
    pub folded: bool,
    /// Whether the player has raised in the current round.
    pub raised: bool,
    /// Whether the player has acted in the current round.
    pub acted: bool,
}

/// Complete state of a hand.
#[derive(Debug, Clone)]
pub struct GameState {
    config: Arc<GameConfig>,
    evaluator: Arc<dyn HandEvaluator>,
    players: Vec<PlayerState>,
    history: Vec<Vec<Action>>,
    cards: Vec<Card>,
    /// Raise sizes registered at runtime on top of the configured ones.
    extra_raises: Vec<u32>,
    round: usize,
    turn: usize,
    /// Raises made in the current round.
    raises: u8,
    terminal: bool,
}

impl GameState {
    /// Create the initial state of a hand. Every player antes.
    ///
    /// `cards` holds one private card per seat followed by the board cards.
    pub fn new(
        config: Arc<GameConfig>,
        evaluator: Arc<dyn HandEvaluator>,
        cards: Vec<Card>,
    ) -> Result<Self> {
        if cards.len() < config.num_cards() {
            return Err(SolverError::InvalidDeal {
                expected: config.num_cards(),
                actual: cards.len(),
            });
        }

        let players = (0..config.num_players)
            .map(|_| PlayerState {
                bet: config.ante,
                ..Default::default()
            })
            .collect();
        let history = vec![Vec::new(); config.num_rounds];

        Ok(Self {
            config,
            evaluator,
            players,
            history,
            cards,
            extra_raises: Vec::new(),
            round: 0,
            turn: 0,
            raises: 0,
            terminal: false,
        })
    }

    /// Same public history, different deal.
    pub fn with_cards(&self, cards: Vec<Card>) -> Result<Self> {
        if cards.len() < self.config.num_cards() {
            return Err(SolverError::InvalidDeal {
                expected: self.config.num_cards(),
                actual: cards.len(),
            });
        }
        let mut state = self.clone();
        state.cards = cards;
        Ok(state)
    }

    /// Game configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of seats.
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Per-seat bookkeeping.
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    /// Action history, one vector per round.
    pub fn history(&self) -> &[Vec<Action>] {
        &self.history
    }

    /// The dealt cards: private block then board.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Current betting round. Equals `num_rounds` once the last round closed.
    pub fn round(&self) -> usize {
        self.round
    }

    /// Seat due to act.
    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Whether the hand is over.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Total chips in the middle.
    pub fn pot(&self) -> u32 {
        self.players.iter().map(|p| p.bet).sum()
    }

    /// Largest bet committed by any player.
    pub fn max_bet(&self) -> u32 {
        self.players.iter().map(|p| p.bet).max().unwrap_or(0)
    }

    /// Chips the acting player needs to add to stay in.
    pub fn to_call(&self) -> u32 {
        self.max_bet() - self.players[self.turn].bet
    }

    /// Number of players who have not folded.
    pub fn active_players(&self) -> usize {
        self.players.iter().filter(|p| !p.folded).count()
    }

    /// Private card of a seat.
    pub fn hole(&self, player: usize) -> Card {
        self.cards[player]
    }

    /// Board cards revealed so far.
    pub fn visible_board(&self) -> &[Card] {
        let n = self.num_players();
        let shown = self.round.min(self.config.num_rounds - 1);
        &self.cards[n..n + shown]
    }

    /// Every board card of the deal, revealed or not.
    pub fn board(&self) -> &[Card] {
        let n = self.num_players();
        &self.cards[n..n + self.config.num_rounds - 1]
    }

    /// Raise sizes registered at runtime.
    pub fn extra_raises(&self) -> &[u32] {
        &self.extra_raises
    }

    /// Make an additional raise size legal for the rest of the hand.
    ///
    /// Returns `false` if the size was already legal.
    pub fn register_raise(&mut self, size: u32) -> bool {
        if size == 0 || self.config.raise_sizes.contains(&size) || self.extra_raises.contains(&size)
        {
            return false;
        }
        self.extra_raises.push(size);
        self.extra_raises.sort_unstable();
        true
    }

    /// Legal actions for the acting player.
    ///
    /// Raises are capped at `max_raises` per round; once the cap is hit only
    /// fold/call (or check) remain.
    pub fn valid_actions(&self) -> Vec<Action> {
        if self.terminal {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(3 + self.extra_raises.len());
        if self.to_call() > 0 {
            actions.push(Action::Fold);
            actions.push(Action::Call);
        } else {
            actions.push(Action::Check);
        }

        if self.raises < self.config.max_raises {
            let default = self.config.raise_sizes[self.round];
            actions.push(Action::Raise(default));
            actions.extend(
                self.extra_raises
                    .iter()
                    .filter(|&&s| s != default)
                    .map(|&s| Action::Raise(s)),
            );
        }

        actions
    }

    /// Whether `action` may be applied now.
    pub fn is_valid(&self, action: Action) -> bool {
        self.valid_actions().contains(&action)
    }

    /// Apply an action and return the resulting state, leaving `self`
    /// untouched.
    pub fn take(&self, action: Action) -> Result<Self> {
        let mut next = self.clone();
        next.apply(action)?;
        Ok(next)
    }

    /// Apply an action in place.
    pub fn apply(&mut self, action: Action) -> Result<()> {
        if self.terminal {
            return Err(SolverError::InvalidStateTransition {
                action: format!("{} by player {} on a finished hand", action, self.turn),
            });
        }
        if !self.is_valid(action) {
            return Err(SolverError::InvalidAction {
                action,
                history: self.history_string(),
            });
        }

        let owed = self.to_call();
        let player = &mut self.players[self.turn];
        match action {
            Action::Fold => player.folded = true,
            Action::Check => {}
            Action::Call => player.bet += owed,
            Action::Raise(size) => {
                player.bet += owed + size;
                player.raised = true;
                self.raises += 1;
            }
        }
        player.acted = true;
        self.history[self.round].push(action);

        self.advance();
        Ok(())
    }

    /// Close the round or move to the next active seat.
    fn advance(&mut self) {
        if self.active_players() == 1 {
            self.terminal = true;
            return;
        }

        let max_bet = self.max_bet();
        let round_over = self
            .players
            .iter()
            .filter(|p| !p.folded)
            .all(|p| p.acted && p.bet == max_bet);

        if round_over {
            for p in self.players.iter_mut() {
                p.raised = false;
                p.acted = false;
            }
            self.raises = 0;
            self.round += 1;
            if self.round == self.config.num_rounds {
                self.terminal = true;
                return;
            }
            self.turn = self.next_active(0);
        } else {
            self.turn = self.next_active(self.turn + 1);
        }
    }

    /// First unfolded seat at or after `start`, wrapping.
    fn next_active(&self, start: usize) -> usize {
        let n = self.num_players();
        (0..n)
            .map(|i| (start + i) % n)
            .find(|&seat| !self.players[seat].folded)
            .unwrap_or(start % n)
    }

    /// Net chips won or lost by every player. Zero-sum.
    ///
    /// A sole survivor takes the pot; otherwise the evaluator decides and
    /// tied players split it evenly.
    pub fn payoff(&self) -> Result<Vec<f64>> {
        if !self.terminal {
            return Err(SolverError::InvalidStateTransition {
                action: "payoff of an unfinished hand".to_string(),
            });
        }

        let winners: Vec<usize> = if self.active_players() == 1 {
            (0..self.num_players())
                .filter(|&i| !self.players[i].folded)
                .collect()
        } else {
            let board = self.board();
            let scores: Vec<Option<u32>> = (0..self.num_players())
                .map(|i| {
                    (!self.players[i].folded).then(|| self.evaluator.eval(self.cards[i], board))
                })
                .collect();
            let best = scores.iter().flatten().copied().max().unwrap_or(0);
            (0..self.num_players())
                .filter(|&i| scores[i] == Some(best))
                .collect()
        };

        let share = self.pot() as f64 / winners.len() as f64;
        let mut payoffs: Vec<f64> = self.players.iter().map(|p| -(p.bet as f64)).collect();
        for &w in &winners {
            payoffs[w] += share;
        }
        Ok(payoffs)
    }

    /// Betting history as round-separated short codes, e.g. `"XR2C/X"`.
    pub fn history_string(&self) -> String {
        let rounds = (self.round + 1).min(self.history.len());
        self.history[..rounds]
            .iter()
            .map(|round| round.iter().map(Action::short_code).collect::<String>())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Everything every player can see: revealed board and betting history.
    pub fn public_state(&self) -> String {
        let board = self.visible_board();
        if board.is_empty() {
            self.history_string()
        } else {
            let board: String = board.iter().map(Card::rank_str).collect();
            format!("{}|{}", board, self.history_string())
        }
    }

    /// Information-set key of the acting player: private card plus public
    /// state.
    pub fn info_set(&self) -> String {
        format!("{}|{}", self.cards[self.turn].rank_str(), self.public_state())
    }
}

/// Public-state part of an information-set key (everything after the
/// private card).
pub fn public_part(info_key: &str) -> &str {
    info_key.split_once('|').map_or("", |(_, public)| public)
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self.cards.iter().map(Card::to_string).collect();
        write!(
            f,
            "cards [{}] history '{}' pot {} turn {}",
            cards.join(" "),
            self.history_string(),
            self.pot(),
            self.turn
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::PokerGame;

    fn kuhn_state(cards: &[u8]) -> GameState {
        let game = PokerGame::kuhn(cards.len());
        let deal = cards.iter().map(|&r| Card::new(r, 1)).collect();
        game.initial_state(deal).unwrap()
    }

    /// Every terminal state reachable from `state`.
    fn terminals(state: &GameState, out: &mut Vec<GameState>) {
        if state.is_terminal() {
            out.push(state.clone());
            return;
        }
        for action in state.valid_actions() {
            terminals(&state.take(action).unwrap(), out);
        }
    }

    #[test]
    fn test_kuhn_actions() {
        let state = kuhn_state(&[3, 1]);
        assert_eq!(state.turn(), 0);
        assert_eq!(state.valid_actions(), vec![Action::Check, Action::Raise(1)]);

        let state = state.take(Action::Raise(1)).unwrap();
        assert_eq!(state.turn(), 1);
        // Raise cap of one reached: only fold or call.
        assert_eq!(state.valid_actions(), vec![Action::Fold, Action::Call]);
    }

    #[test]
    fn test_fold_ends_hand() {
        let state = kuhn_state(&[1, 3]);
        let state = state.take(Action::Raise(1)).unwrap();
        let state = state.take(Action::Fold).unwrap();

        assert!(state.is_terminal());
        assert_eq!(state.active_players(), 1);
        let payoff = state.payoff().unwrap();
        // Survivor takes the pot of 3 minus its own 2.
        assert_eq!(payoff, vec![1.0, -1.0]);
    }

    #[test]
    fn test_showdown_payoffs() {
        let state = kuhn_state(&[1, 3])
            .take(Action::Check)
            .unwrap()
            .take(Action::Check)
            .unwrap();
        assert!(state.is_terminal());
        assert_eq!(state.payoff().unwrap(), vec![-1.0, 1.0]);

        let state = kuhn_state(&[3, 2])
            .take(Action::Check)
            .unwrap()
            .take(Action::Raise(1))
            .unwrap()
            .take(Action::Call)
            .unwrap();
        assert_eq!(state.payoff().unwrap(), vec![2.0, -2.0]);
    }

    #[test]
    fn test_terminal_rejects_actions() {
        let mut state = kuhn_state(&[1, 2])
            .take(Action::Check)
            .unwrap()
            .take(Action::Check)
            .unwrap();
        let err = state.apply(Action::Check).unwrap_err();
        assert!(matches!(err, SolverError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_invalid_action_rejected() {
        let state = kuhn_state(&[1, 2]);
        assert!(matches!(
            state.take(Action::Call),
            Err(SolverError::InvalidAction { .. })
        ));
        assert!(matches!(
            state.take(Action::Raise(7)),
            Err(SolverError::InvalidAction { .. })
        ));
        assert!(matches!(
            kuhn_state(&[1, 2]).payoff(),
            Err(SolverError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_registered_raise_becomes_legal() {
        let game = PokerGame::leduc(2);
        let mut state = game.initial_state(game.config().deck[..3].to_vec()).unwrap();
        assert!(!state.is_valid(Action::Raise(6)));
        assert!(state.register_raise(6));
        assert!(!state.register_raise(6));
        assert!(state.take(Action::Raise(6)).is_ok());
    }

    #[test]
    fn test_all_terminals_zero_sum() {
        for game in [PokerGame::kuhn(2), PokerGame::kuhn(3), PokerGame::leduc(2)] {
            for deal in game.deals() {
                let mut out = Vec::new();
                terminals(&game.initial_state(deal).unwrap(), &mut out);
                for state in out {
                    let payoff = state.payoff().unwrap();
                    let total: f64 = payoff.iter().sum();
                    assert!(total.abs() < 1e-9, "non zero-sum payoff {:?} at {}", payoff, state);
                    assert!(state.round() <= game.config().num_rounds);
                }
            }
        }
    }

    #[test]
    fn test_pot_tracks_bets_and_rounds_advance() {
        let game = PokerGame::leduc(2);
        let deal = vec![Card::new(12, 1), Card::new(13, 1), Card::new(12, 2)];
        let mut state = game.initial_state(deal).unwrap();

        state.apply(Action::Raise(2)).unwrap();
        state.apply(Action::Raise(2)).unwrap();
        assert_eq!(state.valid_actions(), vec![Action::Fold, Action::Call]);
        state.apply(Action::Call).unwrap();
        assert_eq!(state.pot(), state.players().iter().map(|p| p.bet).sum::<u32>());
        assert_eq!(state.pot(), 10);

        assert_eq!(state.round(), 1);
        assert_eq!(state.turn(), 0);
        assert_eq!(state.visible_board().len(), 1);
        assert_eq!(state.info_set(), "Q|Q|R2R2C/");

        state.apply(Action::Check).unwrap();
        state.apply(Action::Raise(4)).unwrap();
        state.apply(Action::Call).unwrap();
        assert!(state.is_terminal());
        // Pair of queens wins 9 from the king.
        assert_eq!(state.payoff().unwrap(), vec![9.0, -9.0]);
    }

    #[test]
    fn test_folded_player_skipped() {
        let state = kuhn_state(&[1, 2, 3]);
        let state = state.take(Action::Raise(1)).unwrap();
        let state = state.take(Action::Fold).unwrap();
        assert_eq!(state.turn(), 2);
        let state = state.take(Action::Call).unwrap();
        assert!(state.is_terminal());
        let payoff = state.payoff().unwrap();
        assert_eq!(payoff, vec![-2.0, -1.0, 3.0]);
    }

    #[test]
    fn test_round_waits_for_every_active_player() {
        let state = kuhn_state(&[1, 2, 3]);
        let state = state.take(Action::Check).unwrap();
        let state = state.take(Action::Check).unwrap();
        assert!(!state.is_terminal());
        assert_eq!(state.turn(), 2);
    }

    #[test]
    fn test_info_set_keys() {
        let a = kuhn_state(&[2, 3]).take(Action::Check).unwrap();
        let b = kuhn_state(&[1, 3]).take(Action::Check).unwrap();
        // Same private card and history for player 1.
        assert_eq!(a.info_set(), b.info_set());
        assert_eq!(a.info_set(), "3|X");
        assert_eq!(public_part(&a.info_set()), "X");
        assert_eq!(kuhn_state(&[2, 3]).info_set(), "2|");
    }
}
