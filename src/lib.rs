//! # CFR Search
//!
//! Counterfactual Regret Minimization for small poker variants, with
//! nested real-time subgame search on top of the trained blueprint.
//!
//! ## Features
//!
//! - **Game engine**: Kuhn and Leduc style betting with any number of
//!   players, configurable raise sizes and a pluggable hand evaluator
//! - **Vanilla CFR**: full-tree traversal, exact or chance-sampled
//! - **Monte Carlo CFR**: external sampling with negative-regret pruning and
//!   linear discounting
//! - **Best response**: exact exploitability of any strategy table
//! - **Nested search**: re-solve the current round during play, including
//!   after opponent actions the blueprint never modelled
//!
//! ## Quick Start
//!
//! ```
//! use cfr_search::cfr::{MccfrConfig, MonteCarloCfr};
//! use cfr_search::games::PokerGame;
//!
//! let mut solver = MonteCarloCfr::new(PokerGame::kuhn(2), MccfrConfig::default().with_seed(7))?;
//! solver.train(500)?;
//! let strategy = solver.table().average_strategy(0, "1|");
//! assert!(strategy.is_some());
//! # Ok::<(), cfr_search::error::SolverError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    games: PokerGame / GameState                 │
//! │  - deals and betting rounds  - payoffs via HandEvaluator        │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            cfr: traverse() driven by a SamplingPolicy           │
//! │  - VanillaCfr   - MonteCarloCfr   - best response               │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │ blueprint StrategyTable
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │           search: NestedSearch over depth-limited subgames       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

/// Regret minimization: nodes, storage, traversal and solvers.
pub mod cfr;

/// Errors shared by every module.
pub mod error;

/// Cards, actions, game configuration and the betting state machine.
pub mod games;

/// Real-time subgame search during play.
pub mod search;

pub use cfr::{MccfrConfig, MonteCarloCfr, SearchConfig, StrategyTable, VanillaCfr};
pub use error::{Result, SolverError};
pub use games::{Action, Card, GameState, PokerGame};
pub use search::NestedSearch;
