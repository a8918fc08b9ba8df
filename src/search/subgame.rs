//! The tree re-solved by a real-time search.
//!
//! A subgame starts at a public state and runs to the next round boundary
//! (or the end of the hand). Its chance root covers every deal consistent
//! with what the searching player knows: their own private card and the
//! board revealed so far.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Result, SolverError};
use crate::games::{Card, GameState, PokerGame};

/// A depth-limited public subtree with its chance root.
#[derive(Debug, Clone)]
pub struct Subgame {
    root: GameState,
    player: usize,
    deals: Vec<Vec<Card>>,
    all_deals: Vec<Vec<Card>>,
}

impl Subgame {
    /// Build the subgame rooted at `root` as seen by `player`.
    pub fn build(game: &PokerGame, root: &GameState, player: usize) -> Result<Self> {
        let all_deals = game.deals();
        let hole = root.hole(player);
        let board = root.visible_board();
        let deals: Vec<Vec<Card>> = all_deals
            .iter()
            .filter(|deal| deal[player] == hole && deal[root.num_players()..].starts_with(board))
            .cloned()
            .collect();

        if deals.is_empty() {
            return Err(SolverError::InvalidDeal {
                expected: game.config().num_cards(),
                actual: 0,
            });
        }

        Ok(Self {
            root: root.clone(),
            player,
            deals,
            all_deals,
        })
    }

    /// The public state the subgame starts from.
    pub fn root(&self) -> &GameState {
        &self.root
    }

    /// The searching player.
    pub fn player(&self) -> usize {
        self.player
    }

    /// Deals in the chance root.
    pub fn deals(&self) -> &[Vec<Card>] {
        &self.deals
    }

    /// Whether `state` lies past the subgame's round boundary.
    pub fn is_leaf(&self, state: &GameState) -> bool {
        !state.is_terminal() && state.round() > self.root.round()
    }

    /// The root with a deal drawn from the chance root.
    pub fn sample_root<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GameState> {
        match self.deals.choose(rng) {
            Some(deal) => self.root.with_cards(deal.clone()),
            None => Ok(self.root.clone()),
        }
    }

    /// Deals agreeing with `state` on every private card and on the
    /// revealed board, i.e. differing only in cards nobody has seen.
    pub fn completions<'a>(&'a self, state: &'a GameState) -> impl Iterator<Item = &'a Vec<Card>> + 'a {
        let n = state.num_players();
        let known = &state.cards()[..n + state.visible_board().len()];
        self.all_deals
            .iter()
            .filter(move |deal| deal.starts_with(known))
    }

    /// Public states of every decision node between the root and the
    /// boundary, root first.
    pub fn public_nodes(&self) -> Result<Vec<String>> {
        let mut nodes = Vec::new();
        self.collect_public(&self.root, &mut nodes)?;
        Ok(nodes)
    }

    fn collect_public(&self, state: &GameState, nodes: &mut Vec<String>) -> Result<()> {
        if state.is_terminal() || self.is_leaf(state) {
            return Ok(());
        }
        nodes.push(state.public_state());
        for action in state.valid_actions() {
            self.collect_public(&state.take(action)?, nodes)?;
        }
        Ok(())
    }
}
