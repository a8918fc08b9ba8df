//! Per-information-set regret and strategy accumulators.

use serde::{Deserialize, Serialize};

/// Cumulative regret and strategy mass for one information set.
///
/// The node stores its own action list so that the universe can grow at
/// runtime ([`add_action`](Self::add_action)) and so that strategies can be
/// requested for any subset of it. Generic over the action type: the
/// solvers use betting actions, the subgame search uses continuation
/// choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegretNode<A> {
    actions: Vec<A>,
    regret_sum: Vec<f64>,
    strategy_sum: Vec<f64>,
}

impl<A: Copy + PartialEq> RegretNode<A> {
    /// Create a node with zero regret and strategy mass.
    pub fn new(actions: Vec<A>) -> Self {
        let n = actions.len();
        Self {
            actions,
            regret_sum: vec![0.0; n],
            strategy_sum: vec![0.0; n],
        }
    }

    /// Every action known to this node.
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Cumulative regrets, parallel to [`actions`](Self::actions).
    pub fn regret_sum(&self) -> &[f64] {
        &self.regret_sum
    }

    /// Cumulative strategy mass, parallel to [`actions`](Self::actions).
    pub fn strategy_sum(&self) -> &[f64] {
        &self.strategy_sum
    }

    /// Sum of all strategy mass.
    pub fn strategy_mass(&self) -> f64 {
        self.strategy_sum.iter().sum()
    }

    fn index_of(&self, action: A) -> Option<usize> {
        self.actions.iter().position(|&a| a == action)
    }

    /// Whether the node knows `action`.
    pub fn contains(&self, action: A) -> bool {
        self.index_of(action).is_some()
    }

    /// Cumulative regret of one action, zero if unknown.
    pub fn regret(&self, action: A) -> f64 {
        self.index_of(action).map_or(0.0, |i| self.regret_sum[i])
    }

    /// Extend the action universe. Returns `false` if already present.
    pub fn add_action(&mut self, action: A) -> bool {
        if self.contains(action) {
            return false;
        }
        self.actions.push(action);
        self.regret_sum.push(0.0);
        self.strategy_sum.push(0.0);
        true
    }

    /// Regret-matching strategy over `valid`, in `valid` order.
    ///
    /// Proportional to positive regret; uniform if no valid action has any.
    pub fn current_strategy(&self, valid: &[A]) -> Vec<f64> {
        let positive: Vec<f64> = valid.iter().map(|&a| self.regret(a).max(0.0)).collect();
        normalize_or_uniform(positive)
    }

    /// Regret-matching strategy over `valid`, also adding
    /// `weight * probability` to every action's strategy mass.
    pub fn strategy(&mut self, valid: &[A], weight: f64) -> Vec<f64> {
        let strategy = self.current_strategy(valid);
        for (&action, &p) in valid.iter().zip(&strategy) {
            self.add_strategy(action, weight * p);
        }
        strategy
    }

    /// Normalised strategy mass over every known action; uniform if there is
    /// no mass yet.
    pub fn avg_strategy(&self) -> Vec<f64> {
        normalize_or_uniform(self.strategy_sum.clone())
    }

    /// Normalised strategy mass restricted to `valid`, in `valid` order.
    pub fn avg_strategy_for(&self, valid: &[A]) -> Vec<f64> {
        let mass = valid
            .iter()
            .map(|&a| self.index_of(a).map_or(0.0, |i| self.strategy_sum[i]))
            .collect();
        normalize_or_uniform(mass)
    }

    /// Add to an action's cumulative regret, growing the universe if needed.
    pub fn add_regret(&mut self, action: A, regret: f64) {
        let i = self.index_or_insert(action);
        self.regret_sum[i] += regret;
    }

    /// Add to an action's cumulative strategy mass.
    pub fn add_strategy(&mut self, action: A, mass: f64) {
        let i = self.index_or_insert(action);
        self.strategy_sum[i] += mass;
    }

    fn index_or_insert(&mut self, action: A) -> usize {
        match self.index_of(action) {
            Some(i) => i,
            None => {
                self.add_action(action);
                self.actions.len() - 1
            }
        }
    }

    /// Multiply every regret and strategy sum by `factor`.
    pub fn discount(&mut self, factor: f64) {
        self.regret_sum.iter_mut().for_each(|r| *r *= factor);
        self.strategy_sum.iter_mut().for_each(|s| *s *= factor);
    }

    /// Reset every accumulator to zero, keeping the action universe.
    pub fn clear(&mut self) {
        self.regret_sum.iter_mut().for_each(|r| *r = 0.0);
        self.strategy_sum.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Copy of this node carrying its regrets but no strategy mass, used to
    /// seed a search from an established blueprint.
    pub fn warm_start(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            regret_sum: self.regret_sum.clone(),
            strategy_sum: vec![0.0; self.actions.len()],
        }
    }

    /// Fold a refined copy of this node back in: strategy mass is added,
    /// regrets are replaced.
    pub fn absorb(&mut self, refined: &Self) {
        for (i, &action) in refined.actions.iter().enumerate() {
            let j = self.index_or_insert(action);
            self.regret_sum[j] = refined.regret_sum[i];
            self.strategy_sum[j] += refined.strategy_sum[i];
        }
    }
}

fn normalize_or_uniform(mut weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    let n = weights.len();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    } else if n > 0 {
        weights.iter_mut().for_each(|w| *w = 1.0 / n as f64);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Action;

    fn assert_distribution(probs: &[f64]) {
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_without_regret() {
        let node = RegretNode::new(vec![Action::Check, Action::Raise(1)]);
        assert_eq!(node.current_strategy(node.actions()), vec![0.5, 0.5]);
        assert_eq!(node.avg_strategy(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_regret_matching() {
        let mut node = RegretNode::new(vec![Action::Fold, Action::Call, Action::Raise(2)]);
        node.add_regret(Action::Fold, -5.0);
        node.add_regret(Action::Call, 3.0);
        node.add_regret(Action::Raise(2), 1.0);

        let strategy = node.current_strategy(&[Action::Fold, Action::Call, Action::Raise(2)]);
        assert_eq!(strategy, vec![0.0, 0.75, 0.25]);

        // Restricted to actions without positive regret: uniform.
        let strategy = node.current_strategy(&[Action::Fold]);
        assert_eq!(strategy, vec![1.0]);
    }

    #[test]
    fn test_strategy_accumulates_mass() {
        let actions = vec![Action::Check, Action::Raise(1)];
        let mut node = RegretNode::new(actions.clone());
        node.add_regret(Action::Raise(1), 2.0);

        let mut previous = node.strategy_sum().to_vec();
        for _ in 0..3 {
            let strategy = node.strategy(&actions, 0.5);
            assert_distribution(&strategy);
            // Strategy mass never decreases without discounting.
            assert!(node.strategy_sum().iter().zip(&previous).all(|(a, b)| a >= b));
            previous = node.strategy_sum().to_vec();
        }
        assert_eq!(node.strategy_sum(), &[0.0, 1.5]);
        assert_eq!(node.avg_strategy(), vec![0.0, 1.0]);
        // Reading the average does not change it.
        assert_eq!(node.avg_strategy(), node.avg_strategy());
    }

    #[test]
    fn test_add_action_starts_empty() {
        let mut node = RegretNode::new(vec![Action::Fold, Action::Call]);
        node.add_strategy(Action::Call, 4.0);
        assert!(node.add_action(Action::Raise(6)));
        assert!(!node.add_action(Action::Raise(6)));
        assert_eq!(node.regret(Action::Raise(6)), 0.0);
        assert_eq!(node.avg_strategy(), vec![0.0, 1.0, 0.0]);
        assert_distribution(&node.current_strategy(node.actions()));
    }

    #[test]
    fn test_discount_and_clear() {
        let mut node = RegretNode::new(vec![Action::Check, Action::Raise(1)]);
        node.add_regret(Action::Check, 4.0);
        node.add_strategy(Action::Raise(1), 2.0);
        node.discount(0.5);
        assert_eq!(node.regret_sum(), &[2.0, 0.0]);
        assert_eq!(node.strategy_sum(), &[0.0, 1.0]);
        node.clear();
        assert_eq!(node.strategy_mass(), 0.0);
    }

    #[test]
    fn test_warm_start_and_absorb() {
        let mut live = RegretNode::new(vec![Action::Check, Action::Raise(1)]);
        live.add_regret(Action::Check, 3.0);
        live.add_strategy(Action::Check, 10.0);

        let mut refined = live.warm_start();
        assert_eq!(refined.regret_sum(), live.regret_sum());
        assert_eq!(refined.strategy_mass(), 0.0);

        refined.add_regret(Action::Raise(1), 5.0);
        refined.add_strategy(Action::Raise(1), 2.0);
        live.absorb(&refined);

        assert_eq!(live.regret_sum(), &[3.0, 5.0]);
        assert_eq!(live.strategy_sum(), &[10.0, 2.0]);
    }
}
