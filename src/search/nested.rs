//! Nested real-time search during live play.
//!
//! The searching player keeps a live copy of the blueprint. At every round
//! boundary, and whenever an opponent takes an action the blueprint never
//! modelled, the current round is re-solved from its first public state
//! and the result is merged back into the live table.

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::cfr::config::SearchConfig;
use crate::cfr::mccfr::run_schedule;
use crate::cfr::node::RegretNode;
use crate::cfr::storage::StrategyTable;
use crate::cfr::traversal::{sample_index, SamplingPolicy};
use crate::error::{ConfigError, Result, SolverError};
use crate::games::{Action, Card, GameState, PokerGame};
use crate::search::rollout::{rollout, Continuation};
use crate::search::subgame::Subgame;

/// External sampling inside a subgame: nodes warm-start from the live
/// table, the searcher's earlier decisions this round are fixed, and leaves
/// are valued by continuation rollouts.
struct SubgamePolicy<'a> {
    subgame: &'a Subgame,
    live: &'a StrategyTable,
    frozen: &'a FxHashMap<String, Action>,
    config: &'a SearchConfig,
    continuations: Vec<FxHashMap<String, RegretNode<Continuation>>>,
    traverser: usize,
    prune: bool,
    rng: &'a mut StdRng,
}

impl SamplingPolicy for SubgamePolicy<'_> {
    fn enumerates(&self, player: usize) -> bool {
        player == self.traverser
    }

    fn updates_regret(&self, player: usize) -> bool {
        player == self.traverser
    }

    fn prunes(&self, regret: f64) -> bool {
        self.prune && regret <= self.config.mccfr.regret_min
    }

    fn actions(&self, player: usize, key: &str, valid: Vec<Action>) -> Vec<Action> {
        if player != self.subgame.player() {
            return valid;
        }
        match self.frozen.get(key) {
            Some(&played) if valid.contains(&played) => vec![played],
            _ => valid,
        }
    }

    fn prior(&self, player: usize, key: &str) -> Option<&RegretNode<Action>> {
        self.live.node(player, key)
    }

    fn is_leaf(&self, state: &GameState) -> bool {
        self.subgame.is_leaf(state)
    }

    fn leaf_value(&mut self, state: &GameState) -> Result<Vec<f64>> {
        let player = self.traverser;
        let key = format!("{}|{}", state.hole(player).rank_str(), state.public_state());
        let completions: Vec<&Vec<Card>> = self.subgame.completions(state).collect();

        let values = Continuation::ALL
            .iter()
            .map(|&c| rollout(self.live, state, &completions, player, c, self.config, &mut *self.rng))
            .collect::<Result<Vec<_>>>()?;

        let node = self.continuations[player]
            .entry(key)
            .or_insert_with(|| RegretNode::new(Continuation::ALL.to_vec()));
        let strategy = node.current_strategy(&Continuation::ALL);

        let mut node_value = vec![0.0; state.num_players()];
        for (value, p) in values.iter().zip(&strategy) {
            for (total, v) in node_value.iter_mut().zip(value) {
                *total += p * v;
            }
        }
        for (&c, value) in Continuation::ALL.iter().zip(&values) {
            node.add_regret(c, value[player] - node_value[player]);
        }
        trace!("leaf {} for player {}: {:?}", state.public_state(), player, strategy);

        Ok(node_value)
    }

    fn begin(&mut self, traverser: usize, prune: bool) {
        self.traverser = traverser;
        self.prune = prune;
    }

    fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }
}

/// Live-play driver for one searching player.
///
/// # Example
/// ```no_run
/// use cfr_search::cfr::{MccfrConfig, MonteCarloCfr, SearchConfig};
/// use cfr_search::games::{Action, PokerGame};
/// use cfr_search::search::NestedSearch;
/// use rand::thread_rng;
///
/// let game = PokerGame::leduc(2);
/// let mut trainer = MonteCarloCfr::new(game.clone(), MccfrConfig::default())?;
/// trainer.train(10_000)?;
///
/// let state = game.sample_state(&mut thread_rng())?;
/// let mut search = NestedSearch::new(game, trainer.into_table(), state, 0, SearchConfig::default())?;
/// search.traverser_turn()?;
/// search.opponent_turn(Action::Raise(6))?;
/// search.check_new_round()?;
/// # Ok::<(), cfr_search::error::SolverError>(())
/// ```
pub struct NestedSearch {
    game: PokerGame,
    config: SearchConfig,
    strategy: StrategyTable,
    state: GameState,
    round_start: GameState,
    player: usize,
    frozen: FxHashMap<String, Action>,
    searches: usize,
    rng: StdRng,
}

impl NestedSearch {
    /// Start live play from `state` for seat `player`, using `blueprint`
    /// as the initial live strategy.
    pub fn new(
        game: PokerGame,
        blueprint: StrategyTable,
        state: GameState,
        player: usize,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        if player >= game.num_players() {
            return Err(ConfigError::invalid(
                "player",
                format!("seat {} does not exist in a {}-player game", player, game.num_players()),
            )
            .into());
        }
        if blueprint.num_players() != game.num_players() {
            return Err(ConfigError::invalid(
                "blueprint",
                format!(
                    "table covers {} players, game has {}",
                    blueprint.num_players(),
                    game.num_players()
                ),
            )
            .into());
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            game,
            config,
            strategy: blueprint,
            round_start: state.clone(),
            state,
            player,
            frozen: FxHashMap::default(),
            searches: 0,
            rng,
        })
    }

    /// Current state of the hand.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Live strategy, blueprint plus every merged search.
    pub fn strategy(&self) -> &StrategyTable {
        &self.strategy
    }

    /// Consume the driver, keeping the live strategy.
    pub fn into_strategy(self) -> StrategyTable {
        self.strategy
    }

    /// Seat of the searching player.
    pub fn player(&self) -> usize {
        self.player
    }

    /// Seat due to act.
    pub fn turn(&self) -> usize {
        self.state.turn()
    }

    /// Whether the hand is over.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Final payoffs.
    pub fn payoff(&self) -> Result<Vec<f64>> {
        self.state.payoff()
    }

    /// Number of searches run so far.
    pub fn searches(&self) -> usize {
        self.searches
    }

    /// Action the searching player took at `key` this round, if any.
    pub fn frozen_action(&self, key: &str) -> Option<Action> {
        self.frozen.get(key).copied()
    }

    /// Re-solve the current round and merge the result into the live
    /// strategy. Returns the number of information sets merged.
    pub fn search(&mut self) -> Result<usize> {
        let subgame = Subgame::build(&self.game, &self.round_start, self.player)?;
        debug!(
            "search from {:?}: {} deals, {} public nodes, {} iterations",
            self.round_start.public_state(),
            subgame.deals().len(),
            subgame.public_nodes()?.len(),
            self.config.iterations
        );

        let mut working = StrategyTable::new(self.game.num_players());
        let mut policy = SubgamePolicy {
            subgame: &subgame,
            live: &self.strategy,
            frozen: &self.frozen,
            config: &self.config,
            continuations: vec![FxHashMap::default(); self.game.num_players()],
            traverser: 0,
            prune: false,
            rng: &mut self.rng,
        };
        for t in 1..=self.config.iterations {
            let root = subgame.sample_root(policy.rng())?;
            run_schedule(&mut working, &root, &self.config.mccfr, t, &mut policy)?;
        }

        let merged = self.strategy.merge(&working);
        self.searches += 1;
        debug!("search merged {} information sets", merged);
        Ok(merged)
    }

    /// Apply an opponent's action, searching first if the blueprint never
    /// modelled it.
    pub fn opponent_turn(&mut self, action: Action) -> Result<()> {
        if self.state.is_terminal() {
            return Err(SolverError::InvalidStateTransition {
                action: format!("{} by an opponent on a finished hand", action),
            });
        }
        let actor = self.state.turn();
        if actor == self.player {
            return Err(SolverError::OutOfTurn {
                turn: actor,
                player: self.player,
            });
        }

        let key = self.state.info_set();
        let modelled = self.state.is_valid(action)
            && self
                .strategy
                .node(actor, &key)
                .map_or(false, |node| node.contains(action));

        if !modelled {
            let mut extended_state = self.state.clone();
            if let Action::Raise(size) = action {
                extended_state.register_raise(size);
            }
            if !extended_state.is_valid(action) {
                return Err(SolverError::InvalidAction {
                    action,
                    history: self.state.history_string(),
                });
            }
            if let Action::Raise(size) = action {
                self.round_start.register_raise(size);
            }
            self.state = extended_state;

            let public = self.state.public_state();
            let extended = self.strategy.extend_public(&public, action);
            info!(
                "player {} played off-blueprint {} at {:?}; extended {} nodes",
                actor, action, public, extended
            );
            self.search()?;
        }

        debug!("player {} played {}", actor, action);
        self.state.apply(action)
    }

    /// Sample the searching player's action from the live current strategy,
    /// fix it for the rest of the round and apply it.
    ///
    /// The current strategy follows the regrets a search merges in; the
    /// average only moves on strategy passes.
    pub fn traverser_turn(&mut self) -> Result<Action> {
        if self.state.is_terminal() {
            return Err(SolverError::InvalidStateTransition {
                action: format!("turn of player {} on a finished hand", self.player),
            });
        }
        let turn = self.state.turn();
        if turn != self.player {
            return Err(SolverError::OutOfTurn {
                turn,
                player: self.player,
            });
        }

        let key = self.state.info_set();
        let valid = self.state.valid_actions();
        let strategy = match self.strategy.node(self.player, &key) {
            Some(node) => node.current_strategy(&valid),
            None => {
                warn!("no live strategy at {:?}, playing uniform", key);
                vec![1.0 / valid.len() as f64; valid.len()]
            }
        };

        let action = valid[sample_index(&strategy, &mut self.rng)];
        self.frozen.insert(key, action);
        self.state.apply(action)?;
        debug!("player {} (searching) played {}", self.player, action);
        Ok(action)
    }

    /// Search again if a new betting round has started. Returns whether a
    /// search ran.
    pub fn check_new_round(&mut self) -> Result<bool> {
        if self.state.is_terminal() || self.state.round() <= self.round_start.round() {
            return Ok(false);
        }

        self.round_start = self.state.clone();
        self.frozen.clear();
        info!(
            "round {} begins at {:?}",
            self.state.round(),
            self.state.public_state()
        );
        self.search()?;
        Ok(true)
    }
}
