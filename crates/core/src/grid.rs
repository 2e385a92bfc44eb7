//! Grid module - owns the playing field
//!
//! The grid is a `rows x columns` field of [`Cell`]s stored in a flat,
//! row-major vector. Coordinates are `(row, col)`; row 0 is the top and
//! gravity pulls toward larger rows.
//!
//! A cell with clear count `-1` is a permanent obstacle: it never holds an
//! item and every query below skips it.

use arrayvec::ArrayVec;

use crate::error::LevelError;
use crate::types::{CellIndex, CellPair, Color, Item, ItemId, ItemKind, Tier};

const DELTAS_4: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

const DELTAS_8: [(i32, i32); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// One grid position plus its occupant and per-cascade bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    index: CellIndex,
    /// Remaining hits before the cell is plain terrain, or -1 for an obstacle
    clear_count: i32,
    pub occupant: Option<Item>,
    /// Cascade pacing rank; `None` until a detonation assigns one
    pub delay_rank: Option<i32>,
    /// Origin-inclusive size of the match this cell caused (0 if none)
    pub caused_detonations: u32,
    /// Set once a special occupant has been expanded in the current cascade
    pub queued_for_detonation: bool,
    /// Special item to spawn here after the current occupant clears
    pub pending_upgrade: Option<ItemKind>,
}

impl Cell {
    fn new(index: CellIndex, clear_count: i32) -> Self {
        Self {
            index,
            clear_count,
            occupant: None,
            delay_rank: None,
            caused_detonations: 0,
            queued_for_detonation: false,
            pending_upgrade: None,
        }
    }

    pub fn index(&self) -> CellIndex {
        self.index
    }

    pub fn clear_count(&self) -> i32 {
        self.clear_count
    }

    pub fn is_available(&self) -> bool {
        self.clear_count >= 0
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Available and holding an item
    pub fn is_occupied(&self) -> bool {
        self.is_available() && self.occupant.is_some()
    }

    /// Apply one detonation hit to the terrain.
    ///
    /// Returns true if the cell still had clear count left (and lost one).
    pub fn hit(&mut self) -> bool {
        if self.clear_count > 0 {
            self.clear_count -= 1;
            true
        } else {
            false
        }
    }

    /// Forget all per-cascade state
    pub fn reset_transient(&mut self) {
        self.delay_rank = None;
        self.caused_detonations = 0;
        self.queued_for_detonation = false;
        self.pending_upgrade = None;
    }
}

/// The playing field
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    /// Flat array of cells, row-major order (row * columns + col)
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid of available, empty cells
    pub fn new(rows: usize, columns: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for col in 0..columns {
                cells.push(Cell::new(CellIndex::new(row as i32, col as i32), 0));
            }
        }
        Self {
            rows,
            columns,
            cells,
        }
    }

    /// Build a grid from a compact text layout, one string per row.
    ///
    /// Tokens are whitespace separated:
    /// - `#` obstacle, `.` empty available cell
    /// - a color initial `R O Y G B P`, optionally followed by a tier mark:
    ///   `*` bomb, `|` vertical bomb, `-` horizontal bomb, `^` star
    /// - or a full item name such as `red+bomb`
    /// - any token may carry a clear-count prefix, e.g. `2:R`
    ///
    /// Items get ids `1..` in row-major order.
    ///
    /// ```
    /// use candy_match_core::Grid;
    /// use candy_match_core::types::{CellIndex, Color};
    ///
    /// let grid = Grid::from_layout(&["R R B", "# G* 1:."]).unwrap();
    /// assert_eq!(grid.item(CellIndex::new(0, 2)).unwrap().kind.color, Color::Blue);
    /// assert!(!grid.is_available(CellIndex::new(1, 0)));
    /// assert_eq!(grid.cell(CellIndex::new(1, 2)).clear_count(), 1);
    /// ```
    pub fn from_layout(rows: &[&str]) -> Result<Self, LevelError> {
        let parsed: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.split_whitespace().collect())
            .collect();
        let columns = parsed.first().map(Vec::len).unwrap_or(0);
        if parsed.is_empty() || columns == 0 {
            return Err(LevelError::EmptyGrid {
                rows: parsed.len(),
                columns,
            });
        }

        let mut grid = Self::new(parsed.len(), columns);
        let mut next_id = 1;
        for (row, tokens) in parsed.iter().enumerate() {
            if tokens.len() != columns {
                return Err(LevelError::Layout(format!(
                    "row {row} has {} cells, expected {columns}",
                    tokens.len()
                )));
            }
            for (col, token) in tokens.iter().enumerate() {
                let idx = CellIndex::new(row as i32, col as i32);
                let (clear_count, kind) = parse_layout_token(token)?;
                grid.set_clear_count(idx, clear_count);
                if let Some(kind) = kind {
                    grid.set_item(
                        idx,
                        Some(Item {
                            id: ItemId(next_id),
                            kind,
                        }),
                    );
                    next_id += 1;
                }
            }
        }
        Ok(grid)
    }

    /// Calculate flat index from (row, col)
    #[inline(always)]
    fn index(&self, idx: CellIndex) -> Option<usize> {
        if self.is_valid_index(idx.row, idx.col) {
            Some(idx.row as usize * self.columns + idx.col as usize)
        } else {
            None
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Bounds check
    pub fn is_valid_index(&self, row: i32, col: i32) -> bool {
        row >= 0 && (row as usize) < self.rows && col >= 0 && (col as usize) < self.columns
    }

    pub fn contains(&self, idx: CellIndex) -> bool {
        self.is_valid_index(idx.row, idx.col)
    }

    /// Direct access. Panics on an out-of-bounds index.
    pub fn cell(&self, idx: CellIndex) -> &Cell {
        match self.index(idx) {
            Some(i) => &self.cells[i],
            None => panic!("cell {idx} outside {}x{} grid", self.rows, self.columns),
        }
    }

    /// Direct mutable access. Panics on an out-of-bounds index.
    pub fn cell_mut(&mut self, idx: CellIndex) -> &mut Cell {
        match self.index(idx) {
            Some(i) => &mut self.cells[i],
            None => panic!("cell {idx} outside {}x{} grid", self.rows, self.columns),
        }
    }

    /// Checked access
    pub fn get(&self, idx: CellIndex) -> Option<&Cell> {
        self.index(idx).map(|i| &self.cells[i])
    }

    /// In bounds and not an obstacle
    pub fn is_available(&self, idx: CellIndex) -> bool {
        self.get(idx).is_some_and(Cell::is_available)
    }

    /// In bounds, not an obstacle, and holding an item
    pub fn is_occupied(&self, idx: CellIndex) -> bool {
        self.get(idx).is_some_and(Cell::is_occupied)
    }

    pub fn item(&self, idx: CellIndex) -> Option<Item> {
        self.get(idx).and_then(|c| c.occupant)
    }

    /// Place or clear an occupant. Obstacles never take an item.
    pub fn set_item(&mut self, idx: CellIndex, item: Option<Item>) {
        let cell = self.cell_mut(idx);
        assert!(
            item.is_none() || cell.is_available(),
            "cannot place an item on obstacle {idx}"
        );
        cell.occupant = item;
    }

    pub fn take_item(&mut self, idx: CellIndex) -> Option<Item> {
        self.cell_mut(idx).occupant.take()
    }

    /// Set terrain clear count (level construction only)
    pub fn set_clear_count(&mut self, idx: CellIndex, clear_count: i32) {
        let cell = self.cell_mut(idx);
        cell.clear_count = clear_count;
        if clear_count < 0 {
            cell.occupant = None;
        }
    }

    /// Available up/down/left/right neighbours
    pub fn neighbors4(&self, idx: CellIndex) -> ArrayVec<CellIndex, 4> {
        DELTAS_4
            .iter()
            .map(|&(dr, dc)| idx.offset(dr, dc))
            .filter(|&n| self.is_available(n))
            .collect()
    }

    /// Available neighbours including diagonals
    pub fn neighbors8(&self, idx: CellIndex) -> ArrayVec<CellIndex, 8> {
        DELTAS_8
            .iter()
            .map(|&(dr, dc)| idx.offset(dr, dc))
            .filter(|&n| self.is_available(n))
            .collect()
    }

    /// Exchange the occupants of two adjacent available cells
    pub fn swap_occupants(&mut self, pair: CellPair) {
        assert!(pair.is_adjacent(), "swap of non-adjacent cells {pair:?}");
        assert!(
            self.is_available(pair.first) && self.is_available(pair.second),
            "swap involving an unavailable cell {pair:?}"
        );
        let a = self.take_item(pair.first);
        let b = self.take_item(pair.second);
        self.set_item(pair.first, b);
        self.set_item(pair.second, a);
    }

    /// Contiguous occupied cells walking from `idx` (exclusive) in one direction.
    ///
    /// Stops at the edge, an obstacle or an empty cell.
    pub fn run(&self, idx: CellIndex, d_row: i32, d_col: i32) -> Vec<CellIndex> {
        let mut out = Vec::new();
        let mut cur = idx.offset(d_row, d_col);
        while self.is_occupied(cur) {
            out.push(cur);
            cur = cur.offset(d_row, d_col);
        }
        out
    }

    /// All indices in row-major order
    pub fn indices(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells.iter().map(Cell::index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Highest item id currently on the grid
    pub fn max_item_id(&self) -> Option<ItemId> {
        self.cells.iter().filter_map(|c| c.occupant.map(|i| i.id)).max()
    }

    /// Let every item drop as far as it can in its column.
    ///
    /// Rows are processed bottom-up, so lower gaps are filled before the items
    /// above them move. Each item lands in the lowest available empty cell
    /// below it, passing over obstacles. Returns `(from, to)` per moved item
    /// in the order they were moved.
    pub fn apply_gravity(&mut self) -> Vec<(CellIndex, CellIndex)> {
        let mut moves = Vec::new();
        if self.rows < 2 {
            return moves;
        }

        for row in (0..self.rows - 1).rev() {
            for col in 0..self.columns {
                let from = CellIndex::new(row as i32, col as i32);
                if !self.is_occupied(from) {
                    continue;
                }
                let target = ((row + 1)..self.rows)
                    .map(|r| CellIndex::new(r as i32, col as i32))
                    .filter(|&c| self.is_available(c) && self.cell(c).is_empty())
                    .last();
                if let Some(to) = target {
                    let item = self.take_item(from);
                    self.set_item(to, item);
                    moves.push((from, to));
                }
            }
        }
        moves
    }

    /// Available empty cells in refill order: columns left to right, each bottom-up
    pub fn empty_cells_for_refill(&self) -> Vec<CellIndex> {
        let mut out = Vec::new();
        for col in 0..self.columns {
            for row in (0..self.rows).rev() {
                let idx = CellIndex::new(row as i32, col as i32);
                let cell = self.cell(idx);
                if cell.is_available() && cell.is_empty() {
                    out.push(idx);
                }
            }
        }
        out
    }

    /// Number of available cells that still need hits
    pub fn uncleared_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.clear_count > 0).count()
    }
}

fn parse_layout_token(token: &str) -> Result<(i32, Option<ItemKind>), LevelError> {
    let (clear_count, body) = match token.split_once(':') {
        Some((n, rest)) => {
            let n: i32 = n
                .parse()
                .map_err(|_| LevelError::Layout(format!("bad clear count in `{token}`")))?;
            if n < -1 {
                return Err(LevelError::Layout(format!("clear count below -1 in `{token}`")));
            }
            (n, rest)
        }
        None => (0, token),
    };

    match body {
        "#" => return Ok((-1, None)),
        "." => return Ok((clear_count, None)),
        _ => {}
    }

    let kind = parse_layout_item(token, body)?;
    if clear_count < 0 {
        return Err(LevelError::Layout(format!("item on an obstacle in `{token}`")));
    }
    Ok((clear_count, Some(kind)))
}

fn parse_layout_item(token: &str, body: &str) -> Result<ItemKind, LevelError> {
    if let Some(kind) = ItemKind::from_str(body) {
        return Ok(kind);
    }

    let mut chars = body.chars();
    let color = match chars.next() {
        Some('R') => Color::Red,
        Some('O') => Color::Orange,
        Some('Y') => Color::Yellow,
        Some('G') => Color::Green,
        Some('B') => Color::Blue,
        Some('P') => Color::Purple,
        _ => return Err(LevelError::Layout(format!("unknown token `{token}`"))),
    };
    let tier = match chars.next() {
        None => Tier::Usual,
        Some('*') => Tier::Bomb,
        Some('|') => Tier::VerticalBomb,
        Some('-') => Tier::HorizontalBomb,
        Some('^') => Tier::Star,
        Some(_) => return Err(LevelError::Layout(format!("unknown tier in `{token}`"))),
    };
    if chars.next().is_some() {
        return Err(LevelError::Layout(format!("trailing characters in `{token}`")));
    }
    Ok(ItemKind::new(color, tier))
}
