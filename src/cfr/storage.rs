//! Storage for CFR regrets and strategies.
//!
//! One map per player from information-set key to [`RegretNode`]. The table
//! is owned by a single solver; searches work on a private table and merge
//! it back.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cfr::node::RegretNode;
use crate::error::Result;
use crate::games::{public_part, Action};

/// Per-player information-set storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyTable {
    players: Vec<FxHashMap<String, RegretNode<Action>>>,
}

impl StrategyTable {
    /// Create an empty table for `num_players` players.
    pub fn new(num_players: usize) -> Self {
        Self {
            players: vec![FxHashMap::default(); num_players],
        }
    }

    /// Number of players the table covers.
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Get the node at `key`, creating it over `actions` if missing.
    ///
    /// Actions missing from an existing node are added with zero mass.
    pub fn entry(&mut self, player: usize, key: &str, actions: &[Action]) -> &mut RegretNode<Action> {
        let node = self.players[player]
            .entry(key.to_string())
            .or_insert_with(|| RegretNode::new(actions.to_vec()));
        for &action in actions {
            node.add_action(action);
        }
        node
    }

    /// Look up a node.
    pub fn node(&self, player: usize, key: &str) -> Option<&RegretNode<Action>> {
        self.players.get(player)?.get(key)
    }

    /// Look up a node mutably.
    pub fn node_mut(&mut self, player: usize, key: &str) -> Option<&mut RegretNode<Action>> {
        self.players.get_mut(player)?.get_mut(key)
    }

    /// Whether the player has a node at `key`.
    pub fn contains(&self, player: usize, key: &str) -> bool {
        self.node(player, key).is_some()
    }

    /// Insert or replace a node.
    pub fn insert(&mut self, player: usize, key: String, node: RegretNode<Action>) {
        self.players[player].insert(key, node);
    }

    /// Iterate over one player's nodes in arbitrary order.
    pub fn iter(&self, player: usize) -> impl Iterator<Item = (&String, &RegretNode<Action>)> {
        self.players[player].iter()
    }

    /// Total number of information sets across all players.
    pub fn num_info_sets(&self) -> usize {
        self.players.iter().map(FxHashMap::len).sum()
    }

    /// Whether the table holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.num_info_sets() == 0
    }

    /// One player's keys ordered by length, then lexicographically, so that
    /// parents print before children.
    pub fn sorted_keys(&self, player: usize) -> Vec<&String> {
        let mut keys: Vec<&String> = self.players[player].keys().collect();
        keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        keys
    }

    /// Average strategy at a node, paired with its actions.
    pub fn average_strategy(&self, player: usize, key: &str) -> Option<Vec<(Action, f64)>> {
        let node = self.node(player, key)?;
        Some(node.actions().iter().copied().zip(node.avg_strategy()).collect())
    }

    /// Multiply every regret and strategy sum by `factor`.
    pub fn discount(&mut self, factor: f64) {
        for map in &mut self.players {
            map.values_mut().for_each(|node| node.discount(factor));
        }
    }

    /// Fold a search result back in.
    ///
    /// New information sets are inserted as they are. Existing ones receive
    /// the refined regrets and the added strategy mass, so established mass
    /// is never thrown away. Returns the number of nodes touched.
    pub fn merge(&mut self, refined: &StrategyTable) -> usize {
        let mut touched = 0;
        for (player, map) in refined.players.iter().enumerate() {
            for (key, node) in map {
                match self.players[player].get_mut(key) {
                    Some(existing) => existing.absorb(node),
                    None => {
                        self.players[player].insert(key.clone(), node.clone());
                    }
                }
                touched += 1;
            }
        }
        touched
    }

    /// Add `action` to every node, for every player, whose key has the
    /// given public state. Returns the number of nodes extended.
    pub fn extend_public(&mut self, public_state: &str, action: Action) -> usize {
        let mut extended = 0;
        for map in &mut self.players {
            for (key, node) in map.iter_mut() {
                if public_part(key) == public_state && node.add_action(action) {
                    extended += 1;
                }
            }
        }
        extended
    }

    /// Save the table as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a table saved with [`save_json`](Self::save_json).
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creates_once() {
        let mut table = StrategyTable::new(2);
        table
            .entry(0, "3|", &[Action::Check, Action::Raise(1)])
            .add_regret(Action::Raise(1), 1.0);
        let node = table.entry(0, "3|", &[Action::Check, Action::Raise(1)]);
        assert_eq!(node.regret(Action::Raise(1)), 1.0);
        assert_eq!(table.num_info_sets(), 1);
        assert!(!table.contains(1, "3|"));
    }

    #[test]
    fn test_sorted_keys() {
        let mut table = StrategyTable::new(2);
        for key in ["2|XR1", "1|", "3|", "1|XR1"] {
            table.entry(0, key, &[Action::Check]);
        }
        let keys: Vec<&str> = table.sorted_keys(0).into_iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["1|", "3|", "1|XR1", "2|XR1"]);
    }

    #[test]
    fn test_merge_adds_mass_and_replaces_regret() {
        let mut live = StrategyTable::new(2);
        let node = live.entry(1, "2|R1", &[Action::Fold, Action::Call]);
        node.add_regret(Action::Call, 1.0);
        node.add_strategy(Action::Call, 6.0);

        let mut refined = StrategyTable::new(2);
        let node = refined.entry(1, "2|R1", &[Action::Fold, Action::Call]);
        node.add_regret(Action::Call, 4.0);
        node.add_strategy(Action::Fold, 2.0);
        refined.entry(0, "2|", &[Action::Check, Action::Raise(1)]);

        assert_eq!(live.merge(&refined), 2);
        let node = live.node(1, "2|R1").unwrap();
        assert_eq!(node.regret(Action::Call), 4.0);
        assert_eq!(node.strategy_sum(), &[2.0, 6.0]);
        assert!(live.contains(0, "2|"));
    }

    #[test]
    fn test_extend_public() {
        let mut table = StrategyTable::new(2);
        table.entry(0, "Q|A|R2C/R4", &[Action::Fold, Action::Call]);
        table.entry(0, "A|K|R2C/R4", &[Action::Fold, Action::Call]);
        table.entry(1, "K|K|R2C/R4", &[Action::Fold, Action::Call]);
        table.entry(1, "K|K|R2C/", &[Action::Check]);

        assert_eq!(table.extend_public("K|R2C/R4", Action::Raise(9)), 2);
        assert!(table.node(0, "A|K|R2C/R4").unwrap().contains(Action::Raise(9)));
        assert!(!table.node(0, "Q|A|R2C/R4").unwrap().contains(Action::Raise(9)));
        assert!(!table.node(1, "K|K|R2C/").unwrap().contains(Action::Raise(9)));
    }

    #[test]
    fn test_json_persistence() {
        let mut table = StrategyTable::new(2);
        table
            .entry(0, "1|", &[Action::Check, Action::Raise(1)])
            .add_strategy(Action::Check, 3.0);

        let path = std::env::temp_dir().join("cfr_search_table_test.json");
        table.save_json(&path).unwrap();
        let loaded = StrategyTable::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.node(0, "1|"), table.node(0, "1|"));
        assert_eq!(loaded.num_players(), 2);
    }
}
