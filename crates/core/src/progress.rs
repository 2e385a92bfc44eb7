//! Level progress tracking
//!
//! - [`PassConditions`]: remaining counts per tracked condition kind
//! - [`ScoreBoard`]: score earned in the current level
//! - [`SessionProgress`]: running totals across the levels of one session

use crate::scoring::score_for_match;
use crate::types::PassConditionKind;

/// Result of feeding one event into [`PassConditions::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionUpdate {
    pub kind: PassConditionKind,
    pub remaining: u32,
    /// This update emptied the last tracked condition
    pub all_reached: bool,
}

/// Active pass conditions in level-descriptor order.
///
/// A condition leaves the set when its count reaches zero; further events of
/// that kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassConditions {
    active: Vec<(PassConditionKind, u32)>,
}

impl PassConditions {
    /// Zero targets are dropped; level loading rejects them before they get here.
    pub fn new(conditions: impl IntoIterator<Item = (PassConditionKind, u32)>) -> Self {
        Self {
            active: conditions.into_iter().filter(|&(_, n)| n > 0).collect(),
        }
    }

    /// Count one occurrence of `kind`. `None` if the kind is not tracked.
    pub fn update(&mut self, kind: PassConditionKind) -> Option<ConditionUpdate> {
        let pos = self.active.iter().position(|&(k, _)| k == kind)?;
        let remaining = {
            let entry = &mut self.active[pos];
            entry.1 -= 1;
            entry.1
        };
        if remaining == 0 {
            self.active.remove(pos);
        }
        Some(ConditionUpdate {
            kind,
            remaining,
            all_reached: remaining == 0 && self.active.is_empty(),
        })
    }

    pub fn remaining(&self, kind: PassConditionKind) -> Option<u32> {
        self.active.iter().find(|&&(k, _)| k == kind).map(|&(_, n)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PassConditionKind, u32)> + '_ {
        self.active.iter().copied()
    }
}

/// Score earned in the current level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    level_score: u32,
}

impl ScoreBoard {
    /// Pay one causal match. Returns the points added (0 for a non-match).
    pub fn add_match(&mut self, cells: usize) -> u32 {
        let points = score_for_match(cells);
        self.level_score += points;
        points
    }

    pub fn level_score(&self) -> u32 {
        self.level_score
    }
}

/// In-memory progress across the levels of one run.
///
/// Points are banked into the total as they are earned. A failed level takes
/// its own points back out; a completed level keeps them and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    current_level: u32,
    levels_total: u32,
    max_reached_level: u32,
    level_score: u32,
    total_score: u32,
}

impl SessionProgress {
    pub fn new(levels_total: u32) -> Self {
        Self {
            current_level: 1,
            levels_total: levels_total.max(1),
            max_reached_level: 1,
            level_score: 0,
            total_score: 0,
        }
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn levels_total(&self) -> u32 {
        self.levels_total
    }

    pub fn max_reached_level(&self) -> u32 {
        self.max_reached_level
    }

    pub fn level_score(&self) -> u32 {
        self.level_score
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn add_score(&mut self, points: u32) {
        self.level_score += points;
        self.total_score += points;
    }

    /// Close a won level. Returns true when it was the last one.
    pub fn complete_level(&mut self) -> bool {
        self.level_score = 0;
        if self.current_level >= self.levels_total {
            return true;
        }
        self.current_level += 1;
        self.max_reached_level = self.max_reached_level.max(self.current_level);
        false
    }

    /// Close a lost level; its points are forfeited and the level stays current.
    pub fn fail_level(&mut self) {
        self.total_score -= self.level_score;
        self.level_score = 0;
    }
}
