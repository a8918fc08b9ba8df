//! Leaf evaluation by blueprint playouts.
//!
//! At a subgame leaf the player being trained picks a continuation strategy
//! for the rest of the hand. Each continuation is the blueprint with one
//! kind of action made more likely; its value is the mean over a few deals
//! of the exact expected payoff under the biased profile.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cfr::config::SearchConfig;
use crate::cfr::storage::StrategyTable;
use crate::error::Result;
use crate::games::{Action, Card, GameState};

/// How a player continues past a subgame leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continuation {
    /// Play the blueprint unchanged.
    Blueprint,
    /// Lean towards folding.
    Fold,
    /// Lean towards checking and calling.
    Call,
    /// Lean towards raising.
    Raise,
}

impl Continuation {
    /// Every continuation, in node order.
    pub const ALL: [Continuation; 4] = [
        Continuation::Blueprint,
        Continuation::Fold,
        Continuation::Call,
        Continuation::Raise,
    ];

    /// Whether this continuation favours `action`.
    pub fn favours(&self, action: Action) -> bool {
        match self {
            Continuation::Blueprint => false,
            Continuation::Fold => action == Action::Fold,
            Continuation::Call => action.is_passive(),
            Continuation::Raise => action.is_aggressive(),
        }
    }
}

/// Multiply the probability of every favoured action by `bias` and
/// renormalise. Uniform if nothing is left.
pub fn apply_bias(strategy: &[f64], actions: &[Action], continuation: Continuation, bias: f64) -> Vec<f64> {
    let biased: Vec<f64> = strategy
        .iter()
        .zip(actions)
        .map(|(&p, &a)| if continuation.favours(a) { p * bias } else { p })
        .collect();
    let total: f64 = biased.iter().sum();
    if total > 0.0 {
        biased.iter().map(|p| p / total).collect()
    } else {
        vec![1.0 / actions.len() as f64; actions.len()]
    }
}

/// Blueprint strategy at the acting player's node, uniform where the
/// blueprint never went.
fn blueprint_strategy(blueprint: &StrategyTable, state: &GameState, actions: &[Action]) -> Vec<f64> {
    match blueprint.node(state.turn(), &state.info_set()) {
        Some(node) => node.avg_strategy_for(actions),
        None => vec![1.0 / actions.len() as f64; actions.len()],
    }
}

/// Expected payoff below `state` when everyone follows the blueprint and
/// `player` follows `continuation`.
pub fn playout(
    blueprint: &StrategyTable,
    state: &GameState,
    player: usize,
    continuation: Continuation,
    bias: f64,
) -> Result<Vec<f64>> {
    if state.is_terminal() {
        return state.payoff();
    }

    let actions = state.valid_actions();
    let mut strategy = blueprint_strategy(blueprint, state, &actions);
    if state.turn() == player {
        strategy = apply_bias(&strategy, &actions, continuation, bias);
    }

    let mut value = vec![0.0; state.num_players()];
    for (&action, &p) in actions.iter().zip(&strategy) {
        if p == 0.0 {
            continue;
        }
        let child = playout(blueprint, &state.take(action)?, player, continuation, bias)?;
        for (v, c) in value.iter_mut().zip(&child) {
            *v += p * c;
        }
    }
    Ok(value)
}

/// Mean playout value over deals drawn from `completions`, evaluated in
/// parallel. Deals are drawn before any work is spawned.
pub fn rollout<R: Rng + ?Sized>(
    blueprint: &StrategyTable,
    state: &GameState,
    completions: &[&Vec<Card>],
    player: usize,
    continuation: Continuation,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let bias = config.bias;
    let deals: Vec<Vec<Card>> = if completions.is_empty() {
        vec![state.cards().to_vec()]
    } else {
        (0..config.rollouts)
            .map(|_| completions[rng.gen_range(0..completions.len())].clone())
            .collect()
    };

    let values = deals
        .par_iter()
        .map(|deal| playout(blueprint, &state.with_cards(deal.clone())?, player, continuation, bias))
        .collect::<Result<Vec<_>>>()?;

    let mut mean = vec![0.0; state.num_players()];
    for value in &values {
        for (m, v) in mean.iter_mut().zip(value) {
            *m += v;
        }
    }
    let n = values.len() as f64;
    Ok(mean.into_iter().map(|m| m / n).collect())
}
