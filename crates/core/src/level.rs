//! Level descriptors
//!
//! [`LevelData`] is the JSON shape on disk; [`Level`] is the validated form a
//! game is built from. Validation is all-or-nothing: a descriptor either
//! converts completely or yields a [`LevelError`].
//!
//! ```json
//! {
//!   "rows": 2,
//!   "columns": 3,
//!   "cells": [
//!     { "clear_count": 1 }, { "item": "red" }, { "clear_count": -1 },
//!     { "item": "blue+bomb" }, { "item": 5 }, {}
//!   ],
//!   "pass_conditions": [{ "kind": "cell_clear", "count": 1 }],
//!   "special_item_probability": 10,
//!   "special_weights": { "bomb": 4, "vertical_bomb": 2, "horizontal_bomb": 2, "star": 1 },
//!   "time_limit_secs": 90.0
//! }
//! ```
//!
//! Cells are listed row-major. A missing `item` means "random"; numbers are
//! legacy item codes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LevelError;
use crate::grid::Grid;
use crate::spawner::SpecialWeights;
use crate::types::{CellIndex, ItemKind, PassConditionKind};

/// Item named either by text (`"red+vbomb"`) or by legacy numeric code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemSpec {
    Code(u8),
    Name(String),
}

impl ItemSpec {
    fn parse(&self) -> Option<ItemKind> {
        match self {
            ItemSpec::Code(code) => ItemKind::from_code(*code),
            ItemSpec::Name(name) => ItemKind::from_str(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    #[serde(default)]
    pub clear_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassConditionData {
    pub kind: String,
    pub count: u32,
}

/// Level descriptor as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<CellData>,
    pub pass_conditions: Vec<PassConditionData>,
    #[serde(default)]
    pub special_item_probability: u32,
    #[serde(default)]
    pub special_weights: SpecialWeights,
    pub time_limit_secs: f32,
}

/// One validated cell: terrain plus an optional fixed starting item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpec {
    pub clear_count: i32,
    /// `None` on an available cell means a random item
    pub item: Option<ItemKind>,
}

/// Validated level descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    rows: usize,
    columns: usize,
    cells: Vec<CellSpec>,
    pass_conditions: Vec<(PassConditionKind, u32)>,
    special_item_probability: u32,
    special_weights: SpecialWeights,
    time_limit_secs: f32,
}

impl Level {
    pub fn from_data(data: &LevelData) -> Result<Self, LevelError> {
        if data.rows == 0 || data.columns == 0 {
            return Err(LevelError::EmptyGrid {
                rows: data.rows,
                columns: data.columns,
            });
        }
        let expected = data.rows * data.columns;
        if data.cells.len() != expected {
            return Err(LevelError::CellCount {
                expected,
                found: data.cells.len(),
            });
        }

        let mut cells = Vec::with_capacity(expected);
        for (index, cell) in data.cells.iter().enumerate() {
            if cell.clear_count < -1 {
                return Err(LevelError::ClearCount {
                    index,
                    value: cell.clear_count,
                });
            }
            let item = match &cell.item {
                Some(spec) => Some(spec.parse().ok_or_else(|| LevelError::UnknownItem {
                    index,
                    value: match spec {
                        ItemSpec::Code(code) => code.to_string(),
                        ItemSpec::Name(name) => name.clone(),
                    },
                })?),
                None => None,
            };
            if item.is_some() && cell.clear_count < 0 {
                return Err(LevelError::ItemOnObstacle { index });
            }
            cells.push(CellSpec {
                clear_count: cell.clear_count,
                item,
            });
        }

        if data.pass_conditions.is_empty() {
            return Err(LevelError::MissingPassConditions);
        }
        let mut pass_conditions: Vec<(PassConditionKind, u32)> = Vec::new();
        for cond in &data.pass_conditions {
            let kind = PassConditionKind::from_str(&cond.kind)
                .ok_or_else(|| LevelError::UnknownCondition(cond.kind.clone()))?;
            if cond.count == 0 {
                return Err(LevelError::ZeroTarget(kind));
            }
            if pass_conditions.iter().any(|&(k, _)| k == kind) {
                return Err(LevelError::DuplicateCondition(kind));
            }
            pass_conditions.push((kind, cond.count));
        }

        if data.special_item_probability > 100 {
            return Err(LevelError::Probability {
                field: "special_item_probability",
                value: data.special_item_probability,
            });
        }
        if !(data.time_limit_secs.is_finite() && data.time_limit_secs > 0.0) {
            return Err(LevelError::TimeLimit(data.time_limit_secs));
        }

        Ok(Self {
            rows: data.rows,
            columns: data.columns,
            cells,
            pass_conditions,
            special_item_probability: data.special_item_probability,
            special_weights: data.special_weights,
            time_limit_secs: data.time_limit_secs,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let data: LevelData = serde_json::from_str(json)?;
        Self::from_data(&data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let level = Self::from_json_str(&json)?;
        debug!(path = %path.display(), rows = level.rows, columns = level.columns, "level loaded");
        Ok(level)
    }

    /// Build a level from the compact grid layout used by [`Grid::from_layout`].
    ///
    /// Empty cells (`.`) become random items. Pass conditions default to a
    /// single star, which a level without specials never reaches; use
    /// [`with_conditions`](Self::with_conditions) to set real ones.
    pub fn from_layout(rows: &[&str]) -> Result<Self, LevelError> {
        let grid = Grid::from_layout(rows)?;
        let cells = grid
            .cells()
            .iter()
            .map(|c| CellSpec {
                clear_count: c.clear_count(),
                item: c.occupant.map(|item| item.kind),
            })
            .collect();
        Ok(Self {
            rows: grid.rows(),
            columns: grid.columns(),
            cells,
            pass_conditions: vec![(PassConditionKind::CollectStar, 1)],
            special_item_probability: 0,
            special_weights: SpecialWeights::default(),
            time_limit_secs: 120.0,
        })
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = (PassConditionKind, u32)>) -> Self {
        self.pass_conditions = conditions.into_iter().collect();
        self
    }

    pub fn with_time_limit(mut self, secs: f32) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_specials(mut self, probability: u32, weights: SpecialWeights) -> Self {
        self.special_item_probability = probability;
        self.special_weights = weights;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell(&self, idx: CellIndex) -> &CellSpec {
        &self.cells[idx.row as usize * self.columns + idx.col as usize]
    }

    pub fn cells(&self) -> &[CellSpec] {
        &self.cells
    }

    pub fn pass_conditions(&self) -> &[(PassConditionKind, u32)] {
        &self.pass_conditions
    }

    pub fn special_item_probability(&self) -> u32 {
        self.special_item_probability
    }

    pub fn special_weights(&self) -> SpecialWeights {
        self.special_weights
    }

    pub fn time_limit_secs(&self) -> f32 {
        self.time_limit_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Tier};

    const SAMPLE: &str = r#"{
        "rows": 2,
        "columns": 3,
        "cells": [
            { "clear_count": 1 }, { "item": "red" }, { "clear_count": -1 },
            { "item": "blue+bomb" }, { "item": 5 }, {}
        ],
        "pass_conditions": [{ "kind": "cell_clear", "count": 1 }, { "kind": "collect_red", "count": 4 }],
        "special_item_probability": 10,
        "special_weights": { "bomb": 4, "star": 1 },
        "time_limit_secs": 90.0
    }"#;

    fn sample() -> LevelData {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let level = Level::from_json_str(SAMPLE).unwrap();
        assert_eq!((level.rows(), level.columns()), (2, 3));
        assert_eq!(level.cell(CellIndex::new(0, 0)).clear_count, 1);
        assert_eq!(level.cell(CellIndex::new(0, 0)).item, None);
        assert_eq!(level.cell(CellIndex::new(0, 2)).clear_count, -1);
        assert_eq!(
            level.cell(CellIndex::new(1, 0)).item,
            Some(ItemKind::new(Color::Blue, Tier::Bomb))
        );
        assert_eq!(level.cell(CellIndex::new(1, 1)).item, Some(ItemKind::usual(Color::Blue)));
        assert_eq!(level.pass_conditions().len(), 2);
        assert_eq!(level.special_weights().bomb, 4);
        assert_eq!(level.special_weights().vertical_bomb, 0);
    }

    #[test]
    fn test_wrong_cell_count() {
        let mut data = sample();
        data.cells.pop();
        assert!(matches!(
            Level::from_data(&data),
            Err(LevelError::CellCount { expected: 6, found: 5 })
        ));
    }

    #[test]
    fn test_zero_dimensions() {
        let mut data = sample();
        data.rows = 0;
        assert!(matches!(Level::from_data(&data), Err(LevelError::EmptyGrid { .. })));
    }

    #[test]
    fn test_missing_conditions() {
        let mut data = sample();
        data.pass_conditions.clear();
        assert!(matches!(Level::from_data(&data), Err(LevelError::MissingPassConditions)));
    }

    #[test]
    fn test_bad_conditions() {
        let mut data = sample();
        data.pass_conditions[1].kind = "collect_pink".into();
        assert!(matches!(Level::from_data(&data), Err(LevelError::UnknownCondition(_))));

        let mut data = sample();
        data.pass_conditions[1].count = 0;
        assert!(matches!(Level::from_data(&data), Err(LevelError::ZeroTarget(_))));

        let mut data = sample();
        data.pass_conditions[1].kind = "cell_clear".into();
        assert!(matches!(
            Level::from_data(&data),
            Err(LevelError::DuplicateCondition(PassConditionKind::CellClear))
        ));
    }

    #[test]
    fn test_bad_cells() {
        let mut data = sample();
        data.cells[0].clear_count = -2;
        assert!(matches!(Level::from_data(&data), Err(LevelError::ClearCount { index: 0, value: -2 })));

        let mut data = sample();
        data.cells[1].item = Some(ItemSpec::Name("red+laser".into()));
        assert!(matches!(Level::from_data(&data), Err(LevelError::UnknownItem { index: 1, .. })));

        let mut data = sample();
        data.cells[2].item = Some(ItemSpec::Code(3));
        assert!(matches!(Level::from_data(&data), Err(LevelError::ItemOnObstacle { index: 2 })));
    }

    #[test]
    fn test_bad_probability_and_time() {
        let mut data = sample();
        data.special_item_probability = 101;
        assert!(matches!(Level::from_data(&data), Err(LevelError::Probability { .. })));

        let mut data = sample();
        data.time_limit_secs = 0.0;
        assert!(matches!(Level::from_data(&data), Err(LevelError::TimeLimit(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Level::from_json_str("{"), Err(LevelError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Level::load("/definitely/not/here.json"),
            Err(LevelError::Io(_))
        ));
    }

    #[test]
    fn test_from_layout() {
        let level = Level::from_layout(&["R . #", "2:G B* Y"])
            .unwrap()
            .with_conditions([(PassConditionKind::CellClear, 1)]);
        assert_eq!(level.cell(CellIndex::new(0, 1)).item, None);
        assert_eq!(level.cell(CellIndex::new(0, 2)).clear_count, -1);
        assert_eq!(level.cell(CellIndex::new(1, 0)).clear_count, 2);
        assert_eq!(level.pass_conditions(), &[(PassConditionKind::CellClear, 1)]);
    }
}
