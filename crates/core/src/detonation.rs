//! Special-item resolution
//!
//! Builds the set of cells that detonate together. A working set starts from
//! the matched cells; every explosive item found in it is expanded once and
//! its blast is appended, so blasts that reach further bombs chain until no
//! unexpanded bomb is left. `queued_for_detonation` marks expanded cells,
//! which bounds the walk by the number of cells.
//!
//! Each affected cell also gets a delay rank for pacing. The first rank
//! assigned to a cell wins.

use tracing::trace;

use crate::grid::Grid;
use crate::matcher::MatchDetector;
use crate::rng::SimpleRng;
use crate::types::{CellIndex, CellPair, Tier};

fn push_unique(set: &mut Vec<CellIndex>, idx: CellIndex) {
    if !set.contains(&idx) {
        set.push(idx);
    }
}

fn assign_rank(grid: &mut Grid, idx: CellIndex, rank: i32) {
    let cell = grid.cell_mut(idx);
    if cell.delay_rank.is_none() {
        cell.delay_rank = Some(rank);
    }
}

/// Origin detonates first (rank -1); matched cells are ranked by their
/// distance from the origin along the shared axis.
pub fn assign_match_delays(grid: &mut Grid, origin: CellIndex, matches: &[CellIndex]) {
    grid.cell_mut(origin).delay_rank = Some(-1);
    for &idx in matches {
        if idx.row == origin.row {
            assign_rank(grid, idx, (idx.col - origin.col).abs());
        } else if idx.col == origin.col {
            assign_rank(grid, idx, (idx.row - origin.row).abs());
        }
    }
}

/// Record a qualifying match rooted at `origin` and add it to the working set
pub fn add_match(grid: &mut Grid, set: &mut Vec<CellIndex>, origin: CellIndex, matches: &[CellIndex]) {
    grid.cell_mut(origin).caused_detonations = matches.len() as u32 + 1;
    assign_match_delays(grid, origin, matches);
    push_unique(set, origin);
    for &idx in matches {
        push_unique(set, idx);
    }
}

/// Blast area of the special item in `idx`, with ranks assigned.
///
/// Bombs hit their available 8-neighbourhood. Line bombs hit the occupied
/// cells of their column or row, whatever their color, up to the first
/// obstacle or empty cell each way. Stars and usual items have no blast.
pub fn launch_special_item(grid: &mut Grid, idx: CellIndex) -> Vec<CellIndex> {
    let Some(item) = grid.item(idx) else {
        return Vec::new();
    };
    let base = grid.cell(idx).delay_rank.unwrap_or(0);

    let affected: Vec<CellIndex> = match item.kind.tier {
        Tier::Bomb => grid.neighbors8(idx).into_iter().collect(),
        Tier::VerticalBomb => {
            let mut cells = grid.run(idx, -1, 0);
            cells.extend(grid.run(idx, 1, 0));
            cells
        }
        Tier::HorizontalBomb => {
            let mut cells = grid.run(idx, 0, -1);
            cells.extend(grid.run(idx, 0, 1));
            cells
        }
        Tier::Usual | Tier::Star => Vec::new(),
    };

    for &cell in &affected {
        let distance = match item.kind.tier {
            Tier::Bomb => 1,
            Tier::VerticalBomb => (cell.row - idx.row).abs(),
            _ => (cell.col - idx.col).abs(),
        };
        assign_rank(grid, cell, base + distance);
    }
    affected
}

/// Expand every not-yet-expanded explosive item in `set`, appending blasts
/// until the set is closed.
pub fn expand_specials(grid: &mut Grid, set: &mut Vec<CellIndex>) {
    let mut i = 0;
    while i < set.len() {
        let idx = set[i];
        i += 1;

        let explosive = grid.item(idx).is_some_and(|item| item.kind.tier.is_explosive());
        if !explosive || grid.cell(idx).queued_for_detonation {
            continue;
        }
        grid.cell_mut(idx).queued_for_detonation = true;
        let blast = launch_special_item(grid, idx);
        trace!(cell = %idx, hits = blast.len(), "special item launched");
        for cell in blast {
            push_unique(set, cell);
        }
    }
}

fn record_upgrade(grid: &mut Grid, detector: &MatchDetector, rng: &mut SimpleRng, origin: CellIndex, match_size: usize) {
    if let Some(item) = grid.item(origin) {
        grid.cell_mut(origin).pending_upgrade = detector.upgrade_for(item.kind.color, match_size, rng);
    }
}

/// Commit a swap if it produces a match at either end.
///
/// Returns the closed detonation set, or an empty set after reverting the
/// swap when neither end qualifies.
pub fn resolve_swap(
    grid: &mut Grid,
    detector: &MatchDetector,
    rng: &mut SimpleRng,
    pair: CellPair,
) -> Vec<CellIndex> {
    grid.swap_occupants(pair);
    let first = detector.matches_at(grid, pair.first);
    let second = detector.matches_at(grid, pair.second);
    let first_ok = detector.is_enough_matches(&first);
    let second_ok = detector.is_enough_matches(&second);

    if !first_ok && !second_ok {
        grid.swap_occupants(pair);
        return Vec::new();
    }

    let mut set = Vec::new();
    if first_ok {
        add_match(grid, &mut set, pair.first, &first);
        record_upgrade(grid, detector, rng, pair.first, first.len() + 1);
    }
    if second_ok {
        add_match(grid, &mut set, pair.second, &second);
        record_upgrade(grid, detector, rng, pair.second, second.len() + 1);
    }
    expand_specials(grid, &mut set);
    set
}

/// Rescan `candidates` as match origins after a fall.
///
/// A candidate already collected into the set is not used as an origin.
pub fn collect_detonations(
    grid: &mut Grid,
    detector: &MatchDetector,
    rng: &mut SimpleRng,
    candidates: &[CellIndex],
) -> Vec<CellIndex> {
    let mut set = Vec::new();
    for &origin in candidates {
        if !grid.is_occupied(origin) || set.contains(&origin) {
            continue;
        }
        let matches = detector.matches_at(grid, origin);
        if detector.is_enough_matches(&matches) {
            add_match(grid, &mut set, origin, &matches);
            record_upgrade(grid, detector, rng, origin, matches.len() + 1);
        }
    }
    expand_specials(grid, &mut set);
    set
}
