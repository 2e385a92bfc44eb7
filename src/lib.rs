//! Candy Match (workspace facade crate).
//!
//! Re-exports the simulation as `candy_match::{core, types}`; the
//! implementation lives in dedicated crates under `crates/`.

pub use candy_match_core as core;
pub use candy_match_types as types;
