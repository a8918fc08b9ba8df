//! The regret-updating tree walk shared by every solver.
//!
//! Vanilla CFR, external-sampling MCCFR and subgame search differ only in
//! how they branch, weight and cut the tree. Those choices live behind
//! [`SamplingPolicy`]; [`traverse`] and [`update_strategy`] are written once.
//!
//! ```text
//!             ┌─────────────────────┐
//!             │      traverse       │
//!             └──────────┬──────────┘
//!                        │ asks
//!                        ▼
//!             ┌─────────────────────┐
//!             │   SamplingPolicy    │
//!             └──────────┬──────────┘
//!       ┌────────────────┼─────────────────┐
//!       ▼                ▼                 ▼
//!  Exhaustive     ExternalSampling   SubgamePolicy
//!  (vanilla)         (mccfr)           (search)
//! ```

use log::trace;
use rand::rngs::StdRng;
use rand::Rng;

use crate::cfr::node::RegretNode;
use crate::cfr::storage::StrategyTable;
use crate::error::Result;
use crate::games::{Action, GameState};

/// The knobs that distinguish one CFR flavour from another.
pub trait SamplingPolicy {
    /// Whether `player` explores every action at its nodes. Players that do
    /// not explore sample a single action from their current strategy.
    fn enumerates(&self, player: usize) -> bool;

    /// Whether regrets at `player`'s nodes are updated.
    fn updates_regret(&self, player: usize) -> bool;

    /// Weight applied to `player`'s regret updates.
    fn regret_weight(&self, _reach: &[f64], _player: usize) -> f64 {
        1.0
    }

    /// Weight with which `player`'s current strategy is added to its
    /// strategy mass during the walk. `None` leaves the mass untouched.
    fn strategy_weight(&self, _reach: &[f64], _player: usize) -> Option<f64> {
        None
    }

    /// Whether an action with this cumulative regret is skipped.
    fn prunes(&self, _regret: f64) -> bool {
        false
    }

    /// Actions considered at a node. Defaults to every legal action.
    fn actions(&self, _player: usize, _key: &str, valid: Vec<Action>) -> Vec<Action> {
        valid
    }

    /// Node used to seed a missing information set.
    fn prior(&self, _player: usize, _key: &str) -> Option<&RegretNode<Action>> {
        None
    }

    /// Whether the walk stops at this non-terminal state.
    fn is_leaf(&self, _state: &GameState) -> bool {
        false
    }

    /// Value of a leaf for every player.
    fn leaf_value(&mut self, state: &GameState) -> Result<Vec<f64>> {
        state.payoff()
    }

    /// Called before every pass with the pass's traverser and whether the
    /// pass prunes.
    fn begin(&mut self, _traverser: usize, _prune: bool) {}

    /// Randomness for sampled branches.
    fn rng(&mut self) -> &mut StdRng;
}

/// Sample an index from a probability distribution.
pub fn sample_index<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }
    probs.len().saturating_sub(1)
}

/// Find or create the node for `key`, warm-starting from the policy's prior
/// when there is one.
fn ensure_node<P: SamplingPolicy>(
    table: &mut StrategyTable,
    policy: &P,
    player: usize,
    key: &str,
    valid: &[Action],
) {
    if !table.contains(player, key) {
        if let Some(prior) = policy.prior(player, key) {
            table.insert(player, key.to_string(), prior.warm_start());
        }
    }
    table.entry(player, key, valid);
}

/// Walk the tree below `state`, updating regrets as the policy dictates.
///
/// `reach` holds every player's probability of reaching `state` under the
/// current strategies (chance excluded). Returns the expected value of
/// `state` for every player.
pub fn traverse<P: SamplingPolicy>(
    table: &mut StrategyTable,
    state: &GameState,
    reach: &[f64],
    policy: &mut P,
) -> Result<Vec<f64>> {
    if state.is_terminal() {
        return state.payoff();
    }
    if policy.is_leaf(state) {
        return policy.leaf_value(state);
    }

    let player = state.turn();
    let key = state.info_set();
    let valid = state.valid_actions();
    ensure_node(table, policy, player, &key, &valid);
    let actions = policy.actions(player, &key, valid.clone());

    let node = table.entry(player, &key, &valid);
    let strategy = match policy.strategy_weight(reach, player) {
        Some(weight) => node.strategy(&actions, weight),
        None => node.current_strategy(&actions),
    };

    if !policy.enumerates(player) {
        let i = sample_index(&strategy, policy.rng());
        let mut child_reach = reach.to_vec();
        child_reach[player] *= strategy[i];
        return traverse(table, &state.take(actions[i])?, &child_reach, policy);
    }

    // Decided up front so the node borrow ends before recursing.
    let explored: Vec<bool> = actions
        .iter()
        .map(|&a| !policy.prunes(node.regret(a)))
        .collect();

    let mut node_value = vec![0.0; state.num_players()];
    let mut action_values = vec![0.0; actions.len()];
    for (i, &action) in actions.iter().enumerate() {
        if !explored[i] {
            trace!("pruned {} at {}", action, key);
            continue;
        }
        let mut child_reach = reach.to_vec();
        child_reach[player] *= strategy[i];
        let value = traverse(table, &state.take(action)?, &child_reach, policy)?;
        action_values[i] = value[player];
        for (total, v) in node_value.iter_mut().zip(&value) {
            *total += strategy[i] * v;
        }
    }

    if policy.updates_regret(player) {
        let weight = policy.regret_weight(reach, player);
        let node = table.entry(player, &key, &valid);
        for (i, &action) in actions.iter().enumerate() {
            if explored[i] {
                node.add_regret(action, weight * (action_values[i] - node_value[player]));
            }
        }
    }

    Ok(node_value)
}

/// Strategy pass of external sampling: `traverser` samples one action from
/// its current strategy and adds one unit of mass to it; every other player
/// branches over all of its actions.
pub fn update_strategy<P: SamplingPolicy>(
    table: &mut StrategyTable,
    state: &GameState,
    traverser: usize,
    policy: &mut P,
) -> Result<()> {
    if state.is_terminal() || policy.is_leaf(state) {
        return Ok(());
    }

    let player = state.turn();
    let valid = state.valid_actions();

    if player == traverser {
        let key = state.info_set();
        ensure_node(table, policy, player, &key, &valid);
        let actions = policy.actions(player, &key, valid.clone());
        let node = table.entry(player, &key, &valid);
        let strategy = node.current_strategy(&actions);
        let i = sample_index(&strategy, policy.rng());
        node.add_strategy(actions[i], 1.0);
        update_strategy(table, &state.take(actions[i])?, traverser, policy)
    } else {
        for action in valid {
            update_strategy(table, &state.take(action)?, traverser, policy)?;
        }
        Ok(())
    }
}
