//! Real-time search on top of a trained blueprint.
//!
//! # Overview
//!
//! ```text
//!   blueprint (StrategyTable)
//!        │
//!        ▼
//!   NestedSearch ── live play: opponent_turn / traverser_turn / check_new_round
//!        │
//!        ├── Subgame      round-start root, chance root over consistent deals
//!        ├── SubgamePolicy external sampling, frozen own actions, warm start
//!        └── rollout      leaf value: four continuations over sampled deals
//! ```
//!
//! A search re-solves the current betting round and merges the refined
//! nodes back into the live table. Leaves at the next round boundary are
//! valued by letting the player being trained choose how to continue:
//! blueprint, or blueprint leaning towards fold, call or raise.

pub mod nested;
pub mod rollout;
pub mod subgame;

pub use nested::NestedSearch;
pub use rollout::{apply_bias, playout, rollout, Continuation};
pub use subgame::Subgame;
