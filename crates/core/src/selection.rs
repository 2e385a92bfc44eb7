//! Pointer selection
//!
//! Turns abstract pointer intents into swap proposals. A move is proposed
//! either by pressing two adjacent cells in turn or by pressing one cell and
//! dragging toward a neighbour.

use crate::grid::Grid;
use crate::types::{CellIndex, CellPair};

/// What a pointer intent did to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Nothing changed
    Ignored,
    /// First cell picked (or re-picked to start a drag)
    Selected(CellIndex),
    /// Selection dropped
    Cleared,
    /// Two adjacent occupied cells proposed for a swap
    Move(CellPair),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTracker {
    first: Option<CellIndex>,
    dragging: bool,
    min_drag_delta: f32,
}

impl SelectionTracker {
    pub fn new(min_drag_delta: f32) -> Self {
        Self {
            first: None,
            dragging: false,
            min_drag_delta,
        }
    }

    pub fn selected(&self) -> Option<CellIndex> {
        self.first
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn reset(&mut self) {
        self.first = None;
        self.dragging = false;
    }

    /// Press on `idx`
    pub fn select(&mut self, grid: &Grid, idx: CellIndex) -> Selection {
        if !grid.is_occupied(idx) {
            self.reset();
            return Selection::Cleared;
        }
        match self.first {
            None => {
                self.first = Some(idx);
                self.dragging = true;
                Selection::Selected(idx)
            }
            Some(first) if first == idx => {
                self.dragging = true;
                Selection::Selected(idx)
            }
            Some(first) => {
                self.reset();
                if first.is_adjacent(idx) {
                    Selection::Move(CellPair::new(first, idx))
                } else {
                    Selection::Cleared
                }
            }
        }
    }

    /// Pointer moved by `(dx, dy)` cells since the press; `dy > 0` is up.
    ///
    /// Once the drag is long enough it resolves to the horizontal neighbour
    /// when `|dx| >= |dy|`, otherwise to the vertical one.
    pub fn drag(&mut self, grid: &Grid, dx: f32, dy: f32) -> Selection {
        let Some(first) = self.first.filter(|_| self.dragging) else {
            return Selection::Ignored;
        };
        if dx.hypot(dy) < self.min_drag_delta {
            return Selection::Ignored;
        }

        let target = if dx.abs() >= dy.abs() {
            first.offset(0, if dx > 0.0 { 1 } else { -1 })
        } else {
            first.offset(if dy > 0.0 { -1 } else { 1 }, 0)
        };
        self.reset();
        if grid.is_occupied(target) {
            Selection::Move(CellPair::new(first, target))
        } else {
            Selection::Cleared
        }
    }

    /// Pointer released: stop dragging but keep the selected cell
    pub fn release(&mut self) {
        self.dragging = false;
    }
}
