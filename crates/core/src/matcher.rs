//! Match detection
//!
//! A match is checked per axis: the run of same-colored occupied cells to the
//! left and right of an origin forms the horizontal candidate, the run above
//! and below forms the vertical one. Each axis has to reach the threshold on
//! its own; qualifying axes are unioned.

use crate::grid::Grid;
use crate::rng::SimpleRng;
use crate::types::{CellIndex, CellPair, Color, ItemKind, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDetector {
    min_match_number: usize,
}

impl MatchDetector {
    pub fn new(min_match_number: usize) -> Self {
        assert!(min_match_number >= 2, "min match number must be at least 2");
        Self { min_match_number }
    }

    pub fn min_match_number(&self) -> usize {
        self.min_match_number
    }

    /// Cells that would match an item of `color` placed at `origin`.
    ///
    /// The origin itself is never part of the result.
    pub fn find_matches(&self, grid: &Grid, origin: CellIndex, color: Color) -> Vec<CellIndex> {
        let mut matches = self.axis_matches(grid, origin, color, (0, -1), (0, 1));
        matches.extend(self.axis_matches(grid, origin, color, (-1, 0), (1, 0)));
        matches
    }

    /// [`find_matches`](Self::find_matches) for the item currently in `origin`
    pub fn matches_at(&self, grid: &Grid, origin: CellIndex) -> Vec<CellIndex> {
        match grid.item(origin) {
            Some(item) if grid.is_available(origin) => {
                self.find_matches(grid, origin, item.kind.color)
            }
            _ => Vec::new(),
        }
    }

    /// Scanned cells (origin excluded) reach the threshold
    pub fn is_enough_matches(&self, matches: &[CellIndex]) -> bool {
        matches.len() + 1 >= self.min_match_number
    }

    /// Would placing `kind` at `idx` complete a match right away
    pub fn creates_match(&self, grid: &Grid, idx: CellIndex, kind: ItemKind) -> bool {
        !self.find_matches(grid, idx, kind.color).is_empty()
    }

    /// Special item left behind by a match of `match_size` cells (origin inclusive).
    ///
    /// Exactly the threshold yields a bomb, anything longer a line bomb whose
    /// direction is a coin flip.
    pub fn upgrade_for(&self, color: Color, match_size: usize, rng: &mut SimpleRng) -> Option<ItemKind> {
        if match_size == self.min_match_number {
            Some(ItemKind::new(color, Tier::Bomb))
        } else if match_size > self.min_match_number {
            let tier = if rng.coin() {
                Tier::VerticalBomb
            } else {
                Tier::HorizontalBomb
            };
            Some(ItemKind::new(color, tier))
        } else {
            None
        }
    }

    /// Swap, scan both ends, swap back. The grid is left as it was.
    pub fn is_successful_swap(&self, grid: &mut Grid, pair: CellPair) -> bool {
        grid.swap_occupants(pair);
        let ok = self.is_enough_matches(&self.matches_at(grid, pair.first))
            || self.is_enough_matches(&self.matches_at(grid, pair.second));
        grid.swap_occupants(pair);
        ok
    }

    /// Every adjacent pair of occupied cells whose swap produces a match.
    ///
    /// Pairs are normalized and unique, listed in row-major order of their
    /// first cell.
    pub fn possible_moves(&self, grid: &mut Grid) -> Vec<CellPair> {
        let mut moves = Vec::new();
        for row in 0..grid.rows() as i32 {
            for col in 0..grid.columns() as i32 {
                let first = CellIndex::new(row, col);
                if !grid.is_occupied(first) {
                    continue;
                }
                // right and down only, so each unordered pair is tried once
                for second in [first.offset(0, 1), first.offset(1, 0)] {
                    if !grid.is_occupied(second) {
                        continue;
                    }
                    let pair = CellPair::new(first, second);
                    if self.is_successful_swap(grid, pair) {
                        moves.push(pair);
                    }
                }
            }
        }
        moves
    }

    fn axis_matches(
        &self,
        grid: &Grid,
        origin: CellIndex,
        color: Color,
        back: (i32, i32),
        forward: (i32, i32),
    ) -> Vec<CellIndex> {
        let mut run: Vec<CellIndex> = same_color_prefix(grid, origin, color, back);
        run.extend(same_color_prefix(grid, origin, color, forward));
        if self.is_enough_matches(&run) {
            run
        } else {
            Vec::new()
        }
    }
}

impl Default for MatchDetector {
    fn default() -> Self {
        Self::new(crate::types::MIN_MATCH_NUMBER)
    }
}

fn same_color_prefix(grid: &Grid, origin: CellIndex, color: Color, (dr, dc): (i32, i32)) -> Vec<CellIndex> {
    grid.run(origin, dr, dc)
        .into_iter()
        .take_while(|&idx| grid.item(idx).is_some_and(|item| item.kind.color == color))
        .collect()
}
