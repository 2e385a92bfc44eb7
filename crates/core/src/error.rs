//! Level-load errors.
//!
//! Only configuration problems are errors. Out-of-range indices and other
//! caller bugs panic, and running out of moves or time is a [`LevelResult`],
//! not a failure.
//!
//! [`LevelResult`]: crate::types::LevelResult

use thiserror::Error;

use crate::types::PassConditionKind;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed level json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("grid must have at least one row and column (got {rows}x{columns})")]
    EmptyGrid { rows: usize, columns: usize },
    #[error("expected {expected} cells for the grid, found {found}")]
    CellCount { expected: usize, found: usize },
    #[error("cell {index}: clear count {value} is below -1")]
    ClearCount { index: usize, value: i32 },
    #[error("cell {index}: unknown item `{value}`")]
    UnknownItem { index: usize, value: String },
    #[error("cell {index}: obstacle cells cannot hold an item")]
    ItemOnObstacle { index: usize },
    #[error("level has no pass conditions")]
    MissingPassConditions,
    #[error("unknown pass condition `{0}`")]
    UnknownCondition(String),
    #[error("pass condition {0} needs a target above zero")]
    ZeroTarget(PassConditionKind),
    #[error("pass condition {0} listed twice")]
    DuplicateCondition(PassConditionKind),
    #[error("{field} must be within 0..=100 (got {value})")]
    Probability { field: &'static str, value: u32 },
    #[error("time limit must be positive (got {0})")]
    TimeLimit(f32),
    #[error("minimum match number must be at least 2 (got {0})")]
    MinMatch(usize),
    #[error("bad layout: {0}")]
    Layout(String),
}
