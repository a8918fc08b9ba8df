//! Expected utility, best response and exploitability.
//!
//! Every deal is walked in lockstep along the shared public tree. At the
//! best-responding player's nodes, deals are grouped by that player's
//! information set and one action is chosen per group, weighted by the
//! other players' reach. A per-state maximum would let the responder see
//! hidden cards and overstate the value.

use log::{trace, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cfr::storage::StrategyTable;
use crate::error::{Result, SolverError};
use crate::games::{Action, GameState, PokerGame};

/// What to do when the profile has no node for an information set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unexplored {
    /// Raise [`SolverError::UnexploredInformationSet`].
    #[default]
    Fail,
    /// Play uniformly at random there. One warning per evaluation reports
    /// how many information sets were missing.
    Uniform,
}

/// Average-strategy distribution over `valid` at `key`.
fn profile_strategy(
    table: &StrategyTable,
    player: usize,
    key: &str,
    valid: &[Action],
    unexplored: Unexplored,
) -> Result<Vec<f64>> {
    match table.node(player, key) {
        Some(node) => Ok(node.avg_strategy_for(valid)),
        None => match unexplored {
            Unexplored::Fail => Err(SolverError::UnexploredInformationSet {
                player,
                key: key.to_string(),
            }),
            Unexplored::Uniform => {
                trace!("information set {:?} of player {} unexplored, playing uniform", key, player);
                Ok(vec![1.0 / valid.len() as f64; valid.len()])
            }
        },
    }
}

fn profile_value(table: &StrategyTable, state: &GameState, unexplored: Unexplored) -> Result<Vec<f64>> {
    if state.is_terminal() {
        return state.payoff();
    }

    let player = state.turn();
    let actions = state.valid_actions();
    let strategy = profile_strategy(table, player, &state.info_set(), &actions, unexplored)?;

    let mut value = vec![0.0; state.num_players()];
    for (&action, &p) in actions.iter().zip(&strategy) {
        if p == 0.0 {
            continue;
        }
        let child = profile_value(table, &state.take(action)?, unexplored)?;
        for (v, c) in value.iter_mut().zip(&child) {
            *v += p * c;
        }
    }
    Ok(value)
}

fn collect_unexplored(
    table: &StrategyTable,
    state: &GameState,
    missing: &mut FxHashSet<(usize, String)>,
) -> Result<()> {
    if state.is_terminal() {
        return Ok(());
    }
    let player = state.turn();
    let key = state.info_set();
    if !table.contains(player, &key) {
        missing.insert((player, key));
    }
    for action in state.valid_actions() {
        collect_unexplored(table, &state.take(action)?, missing)?;
    }
    Ok(())
}

/// Number of distinct information sets of the game the table has no node
/// for.
pub fn unexplored_count(game: &PokerGame, table: &StrategyTable) -> Result<usize> {
    let mut missing = FxHashSet::default();
    for deal in game.deals() {
        collect_unexplored(table, &game.initial_state(deal)?, &mut missing)?;
    }
    Ok(missing.len())
}

fn report_unexplored(game: &PokerGame, table: &StrategyTable, unexplored: Unexplored) -> Result<()> {
    if unexplored == Unexplored::Uniform {
        let missing = unexplored_count(game, table)?;
        if missing > 0 {
            warn!("{} information sets unexplored, playing uniform there", missing);
        }
    }
    Ok(())
}

fn profile_utility(game: &PokerGame, table: &StrategyTable, unexplored: Unexplored) -> Result<Vec<f64>> {
    let deals = game.deals();
    let mut total = vec![0.0; game.num_players()];
    for deal in &deals {
        let value = profile_value(table, &game.initial_state(deal.clone())?, unexplored)?;
        for (t, v) in total.iter_mut().zip(&value) {
            *t += v;
        }
    }
    let n = deals.len() as f64;
    Ok(total.into_iter().map(|t| t / n).collect())
}

/// Value of every player when everyone plays the table's average strategy,
/// averaged over all deals.
pub fn expected_utility(
    game: &PokerGame,
    table: &StrategyTable,
    unexplored: Unexplored,
) -> Result<Vec<f64>> {
    report_unexplored(game, table, unexplored)?;
    profile_utility(game, table, unexplored)
}

/// Per-deal values for `player` below `states`, which share one public
/// history. `reach` is chance times the other players' reach per deal.
fn best_response_walk(
    table: &StrategyTable,
    states: &[GameState],
    reach: &[f64],
    player: usize,
    unexplored: Unexplored,
) -> Result<Vec<f64>> {
    let first = &states[0];
    if first.is_terminal() {
        return states
            .iter()
            .map(|s| s.payoff().map(|payoff| payoff[player]))
            .collect();
    }

    let actor = first.turn();
    let actions = first.valid_actions();
    let advance = |action: Action| -> Result<Vec<GameState>> {
        states.iter().map(|s| s.take(action)).collect()
    };

    if actor == player {
        let children = actions
            .iter()
            .map(|&a| best_response_walk(table, &advance(a)?, reach, player, unexplored))
            .collect::<Result<Vec<_>>>()?;

        let keys: Vec<String> = states.iter().map(GameState::info_set).collect();
        let mut totals: FxHashMap<&str, Vec<f64>> = FxHashMap::default();
        for (d, key) in keys.iter().enumerate() {
            let sums = totals
                .entry(key.as_str())
                .or_insert_with(|| vec![0.0; actions.len()]);
            for (sum, child) in sums.iter_mut().zip(&children) {
                *sum += reach[d] * child[d];
            }
        }

        let best: FxHashMap<&str, usize> = totals
            .into_iter()
            .map(|(key, sums)| {
                let argmax = sums
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, &v)| if v > sums[best] { i } else { best });
                (key, argmax)
            })
            .collect();

        Ok(keys
            .iter()
            .enumerate()
            .map(|(d, key)| children[best[key.as_str()]][d])
            .collect())
    } else {
        let strategies = states
            .iter()
            .map(|s| profile_strategy(table, actor, &s.info_set(), &actions, unexplored))
            .collect::<Result<Vec<_>>>()?;

        let mut values = vec![0.0; states.len()];
        for (i, &action) in actions.iter().enumerate() {
            if strategies.iter().all(|sigma| sigma[i] == 0.0) {
                continue;
            }
            let child_reach: Vec<f64> = reach
                .iter()
                .zip(&strategies)
                .map(|(r, sigma)| r * sigma[i])
                .collect();
            let child = best_response_walk(table, &advance(action)?, &child_reach, player, unexplored)?;
            for (d, v) in values.iter_mut().enumerate() {
                *v += strategies[d][i] * child[d];
            }
        }
        Ok(values)
    }
}

fn best_response_inner(
    game: &PokerGame,
    table: &StrategyTable,
    player: usize,
    unexplored: Unexplored,
) -> Result<f64> {
    let states = game
        .deals()
        .into_iter()
        .map(|deal| game.initial_state(deal))
        .collect::<Result<Vec<_>>>()?;
    let chance = 1.0 / states.len() as f64;
    let reach = vec![chance; states.len()];

    let values = best_response_walk(table, &states, &reach, player, unexplored)?;
    Ok(values.iter().map(|v| v * chance).sum())
}

/// Value `player` obtains by best-responding to everyone else's average
/// strategy without seeing their cards.
pub fn best_response_value(
    game: &PokerGame,
    table: &StrategyTable,
    player: usize,
    unexplored: Unexplored,
) -> Result<f64> {
    report_unexplored(game, table, unexplored)?;
    best_response_inner(game, table, player, unexplored)
}

/// Mean over players of what a best response gains over the profile.
/// Zero exactly at a Nash equilibrium.
pub fn exploitability(game: &PokerGame, table: &StrategyTable, unexplored: Unexplored) -> Result<f64> {
    report_unexplored(game, table, unexplored)?;
    let utility = profile_utility(game, table, unexplored)?;
    let mut total = 0.0;
    for (player, u) in utility.iter().enumerate() {
        total += best_response_inner(game, table, player, unexplored)? - u;
    }
    Ok(total / game.num_players() as f64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two-player Kuhn equilibrium with alpha = 0.
    pub(crate) fn kuhn_equilibrium() -> StrategyTable {
        let open = [Action::Check, Action::Raise(1)];
        let facing = [Action::Fold, Action::Call];
        // (player, key, actions, probability of the second action)
        let profile: [(usize, &str, &[Action], f64); 12] = [
            (0, "1|", &open, 0.0),
            (0, "2|", &open, 0.0),
            (0, "3|", &open, 0.0),
            (0, "1|XR1", &facing, 0.0),
            (0, "2|XR1", &facing, 1.0 / 3.0),
            (0, "3|XR1", &facing, 1.0),
            (1, "1|X", &open, 1.0 / 3.0),
            (1, "2|X", &open, 0.0),
            (1, "3|X", &open, 1.0),
            (1, "1|R1", &facing, 0.0),
            (1, "2|R1", &facing, 1.0 / 3.0),
            (1, "3|R1", &facing, 1.0),
        ];

        let mut table = StrategyTable::new(2);
        for (player, key, actions, p) in profile {
            let node = table.entry(player, key, actions);
            node.add_strategy(actions[0], 1.0 - p);
            node.add_strategy(actions[1], p);
        }
        table
    }

    #[test]
    fn test_equilibrium_values() {
        let game = PokerGame::kuhn(2);
        let table = kuhn_equilibrium();

        let utility = expected_utility(&game, &table, Unexplored::Fail).unwrap();
        assert!((utility[0] + 1.0 / 18.0).abs() < 1e-9, "EV {:?}", utility);
        assert!((utility[0] + utility[1]).abs() < 1e-9);

        let exploit = exploitability(&game, &table, Unexplored::Fail).unwrap();
        assert!(exploit.abs() < 1e-9, "exploitability {}", exploit);
    }

    #[test]
    fn test_best_response_beats_profile() {
        let game = PokerGame::kuhn(2);
        let mut table = kuhn_equilibrium();
        // Player 1 gives up to every raise.
        for key in ["2|R1", "3|R1"] {
            table.node_mut(1, key).unwrap().clear();
            table.node_mut(1, key).unwrap().add_strategy(Action::Fold, 1.0);
        }

        let utility = expected_utility(&game, &table, Unexplored::Fail).unwrap();
        for player in 0..2 {
            let br = best_response_value(&game, &table, player, Unexplored::Fail).unwrap();
            assert!(br >= utility[player] - 1e-9);
        }
        assert!(exploitability(&game, &table, Unexplored::Fail).unwrap() > 0.1);
    }

    #[test]
    fn test_unexplored_policy() {
        let game = PokerGame::kuhn(2);
        let empty = StrategyTable::new(2);
        assert!(matches!(
            expected_utility(&game, &empty, Unexplored::Fail),
            Err(SolverError::UnexploredInformationSet { .. })
        ));

        let exploit = exploitability(&game, &empty, Unexplored::Uniform).unwrap();
        assert!(exploit > 0.0);
    }

    #[test]
    fn test_unexplored_count() {
        let game = PokerGame::kuhn(2);
        assert_eq!(unexplored_count(&game, &StrategyTable::new(2)).unwrap(), 12);
        assert_eq!(unexplored_count(&game, &kuhn_equilibrium()).unwrap(), 0);

        let full = kuhn_equilibrium();
        let mut partial = StrategyTable::new(2);
        for player in 0..2 {
            for (key, node) in full.iter(player).filter(|(key, _)| key.as_str() != "2|R1") {
                partial.insert(player, key.clone(), node.clone());
            }
        }
        assert_eq!(unexplored_count(&game, &partial).unwrap(), 1);
    }

    #[test]
    fn test_three_player_exploitability_non_negative() {
        let game = PokerGame::kuhn(3);
        let empty = StrategyTable::new(3);
        let exploit = exploitability(&game, &empty, Unexplored::Uniform).unwrap();
        assert!(exploit >= -1e-9);
    }
}
