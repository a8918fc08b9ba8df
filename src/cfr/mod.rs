//! CFR (Counterfactual Regret Minimization) solvers.
//!
//! # Overview
//!
//! CFR is an iterative algorithm that converges to Nash equilibrium by:
//! 1. Computing counterfactual regret for each action at each decision point
//! 2. Updating strategies to minimize regret over time
//! 3. Averaging strategies across iterations to converge to equilibrium
//!
//! # Solvers
//!
//! - [`VanillaCfr`]: full-tree traversal with reach-weighted regret
//! - [`MonteCarloCfr`]: external sampling with negative-regret pruning and
//!   linear discounting of early iterations
//!
//! Both drive the same [`traversal::traverse`]; they differ only in their
//! [`SamplingPolicy`]. [`best_response`] measures the result.
//!
//! # Example
//!
//! ```
//! use cfr_search::cfr::{exploitability, MccfrConfig, MonteCarloCfr, Unexplored};
//! use cfr_search::games::PokerGame;
//!
//! let game = PokerGame::kuhn(2);
//! let mut solver = MonteCarloCfr::new(game.clone(), MccfrConfig::default().with_seed(1))?;
//! solver.train(1_000)?;
//!
//! let exploit = exploitability(&game, solver.table(), Unexplored::Uniform)?;
//! assert!(exploit >= -1e-9);
//! # Ok::<(), cfr_search::error::SolverError>(())
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value of the current strategy.
//! ```text
//! Regret(a) = Value(a) - Value(current_strategy)
//! ```
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! **Convergence**: Average regret decreases as O(1/sqrt(T)), and the average strategy
//! converges to Nash equilibrium in two-player zero-sum games. With more players the
//! solvers still run but carry no such guarantee.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Lanctot, M., et al. "Monte Carlo Sampling for Regret Minimization in Extensive Games" (2009)
//! - Brown, N., Sandholm, T. "Superhuman AI for multiplayer poker" (2019)

pub mod best_response;
pub mod config;
pub mod mccfr;
pub mod node;
pub mod storage;
pub mod traversal;
pub mod vanilla;

// Re-export main types for convenient access
pub use best_response::{best_response_value, expected_utility, exploitability, unexplored_count, Unexplored};
pub use config::{CFRStats, ExploitabilityPoint, MccfrConfig, SearchConfig};
pub use mccfr::MonteCarloCfr;
pub use node::RegretNode;
pub use storage::StrategyTable;
pub use traversal::SamplingPolicy;
pub use vanilla::{StrategyLine, TrainingReport, VanillaCfr};
