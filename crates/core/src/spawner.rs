//! Item spawner
//!
//! Allocates items (ids plus kinds) and places them into cells. Random draws
//! first pick usual vs special with a 1..=99 roll against the level's special
//! probability, then a special tier by cumulative weight, then a color.
//! Draws that would complete a match on the spot are rejected and redrawn.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grid::Grid;
use crate::matcher::MatchDetector;
use crate::rng::SimpleRng;
use crate::types::{CellIndex, Color, Item, ItemId, ItemKind, Tier, DEFAULT_SPAWN_RETRIES};

/// Relative weights of the special tiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialWeights {
    pub bomb: u32,
    pub vertical_bomb: u32,
    pub horizontal_bomb: u32,
    pub star: u32,
}

impl SpecialWeights {
    fn weight(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Bomb => self.bomb,
            Tier::VerticalBomb => self.vertical_bomb,
            Tier::HorizontalBomb => self.horizontal_bomb,
            Tier::Star => self.star,
            Tier::Usual => 0,
        }
    }

    pub fn total(&self) -> u32 {
        Tier::SPECIAL.iter().map(|&t| self.weight(t)).sum()
    }

    /// Tier whose cumulative weight first reaches `roll`
    fn tier_for_roll(&self, roll: u32) -> Tier {
        let mut cumulative = 0;
        for tier in Tier::SPECIAL {
            cumulative += self.weight(tier);
            if cumulative >= roll {
                return tier;
            }
        }
        Tier::Star
    }
}

#[derive(Debug, Clone)]
pub struct ItemSpawner {
    special_probability: u32,
    weights: SpecialWeights,
    max_retries: u32,
    detector: MatchDetector,
    next_id: u32,
}

impl ItemSpawner {
    pub fn new(special_probability: u32, weights: SpecialWeights, detector: MatchDetector) -> Self {
        Self {
            special_probability,
            weights,
            max_retries: DEFAULT_SPAWN_RETRIES,
            detector,
            next_id: 1,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Continue id allocation after `last` (for grids built elsewhere)
    pub fn resume_after(&mut self, last: Option<ItemId>) {
        if let Some(ItemId(id)) = last {
            self.next_id = self.next_id.max(id + 1);
        }
    }

    pub fn special_probability(&self) -> u32 {
        self.special_probability
    }

    pub fn weights(&self) -> SpecialWeights {
        self.weights
    }

    fn allocate(&mut self, kind: ItemKind) -> Item {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        Item { id, kind }
    }

    /// Place an item of `kind` at `idx`.
    ///
    /// Unless `ignore_match_check` is set, a kind that would complete a match
    /// is swapped for a random one of the same class (usual or special).
    pub fn create_item_for_cell(
        &mut self,
        grid: &mut Grid,
        idx: CellIndex,
        kind: ItemKind,
        ignore_match_check: bool,
        rng: &mut SimpleRng,
    ) -> Item {
        let kind = if ignore_match_check || !self.detector.creates_match(grid, idx, kind) {
            kind
        } else {
            self.draw_matchless(grid, idx, kind.tier.is_usual(), rng)
        };
        let item = self.allocate(kind);
        grid.set_item(idx, Some(item));
        item
    }

    /// Place a random item that does not complete a match at `idx`
    pub fn generate_random_item(&mut self, grid: &mut Grid, idx: CellIndex, rng: &mut SimpleRng) -> Item {
        let usual = rng.range_inclusive(1, 99) > self.special_probability;
        let kind = self.draw_matchless(grid, idx, usual, rng);
        let item = self.allocate(kind);
        grid.set_item(idx, Some(item));
        item
    }

    fn draw(&self, usual: bool, rng: &mut SimpleRng) -> ItemKind {
        if usual {
            let color = Color::ALL[rng.next_range(Color::ALL.len() as u32) as usize];
            return ItemKind::usual(color);
        }
        let roll = rng.range_inclusive(0, self.weights.total());
        let tier = self.weights.tier_for_roll(roll);
        let color = Color::ALL[rng.next_range(Color::ALL.len() as u32) as usize];
        ItemKind::new(color, tier)
    }

    fn draw_matchless(&self, grid: &Grid, idx: CellIndex, usual: bool, rng: &mut SimpleRng) -> ItemKind {
        let mut last = self.draw(usual, rng);
        for _ in 0..self.max_retries {
            if !self.detector.creates_match(grid, idx, last) {
                return last;
            }
            last = self.draw(usual, rng);
        }
        if !self.detector.creates_match(grid, idx, last) {
            return last;
        }

        let tiers: &[Tier] = if usual { &[Tier::Usual] } else { &Tier::SPECIAL };
        let fallback = tiers
            .iter()
            .flat_map(|&tier| Color::ALL.map(|color| ItemKind::new(color, tier)))
            .find(|&kind| !self.detector.creates_match(grid, idx, kind));
        match fallback {
            Some(kind) => {
                warn!(cell = %idx, %kind, retries = self.max_retries, "spawn retries exhausted, using first matchless kind");
                kind
            }
            None => {
                warn!(cell = %idx, kind = %last, "no matchless kind for cell, accepting a match");
                last
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(row: i32, col: i32) -> CellIndex {
        CellIndex::new(row, col)
    }

    fn spawner(special_probability: u32, weights: SpecialWeights) -> ItemSpawner {
        ItemSpawner::new(special_probability, weights, MatchDetector::default())
    }

    #[test]
    fn test_tier_for_roll_is_cumulative() {
        let w = SpecialWeights {
            bomb: 10,
            vertical_bomb: 5,
            horizontal_bomb: 0,
            star: 5,
        };
        assert_eq!(w.total(), 20);
        assert_eq!(w.tier_for_roll(0), Tier::Bomb);
        assert_eq!(w.tier_for_roll(10), Tier::Bomb);
        assert_eq!(w.tier_for_roll(11), Tier::VerticalBomb);
        assert_eq!(w.tier_for_roll(15), Tier::VerticalBomb);
        assert_eq!(w.tier_for_roll(16), Tier::Star);
        assert_eq!(w.tier_for_roll(20), Tier::Star);
    }

    #[test]
    fn test_zero_probability_spawns_usual_only() {
        let mut grid = Grid::new(4, 4);
        let mut s = spawner(0, SpecialWeights { bomb: 1, ..Default::default() });
        let mut rng = SimpleRng::new(11);
        for cell in grid.indices().collect::<Vec<_>>() {
            let item = s.generate_random_item(&mut grid, cell, &mut rng);
            assert!(item.kind.tier.is_usual());
        }
    }

    #[test]
    fn test_full_probability_spawns_weighted_specials() {
        let mut grid = Grid::new(3, 3);
        let mut s = spawner(99, SpecialWeights { star: 1, ..Default::default() });
        let mut rng = SimpleRng::new(5);
        for cell in grid.indices().collect::<Vec<_>>() {
            let item = s.generate_random_item(&mut grid, cell, &mut rng);
            // roll 0 lands on bomb (cumulative 0 >= 0), roll 1 on star
            assert!(matches!(item.kind.tier, Tier::Bomb | Tier::Star));
        }
    }

    #[test]
    fn test_random_items_never_complete_a_match() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..20 {
            let mut grid = Grid::new(6, 6);
            let mut s = spawner(10, SpecialWeights { bomb: 1, vertical_bomb: 1, horizontal_bomb: 1, star: 1 });
            for cell in grid.indices().collect::<Vec<_>>() {
                s.generate_random_item(&mut grid, cell, &mut rng);
            }
            let detector = MatchDetector::default();
            for cell in grid.indices() {
                assert!(!detector.is_enough_matches(&detector.matches_at(&grid, cell)));
            }
        }
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut grid = Grid::new(1, 4);
        let mut s = spawner(0, SpecialWeights::default());
        let mut rng = SimpleRng::new(1);
        let ids: Vec<_> = (0..4)
            .map(|c| s.generate_random_item(&mut grid, idx(0, c), &mut rng).id)
            .collect();
        assert_eq!(ids, vec![ItemId(1), ItemId(2), ItemId(3), ItemId(4)]);

        s.resume_after(Some(ItemId(10)));
        grid.take_item(idx(0, 0));
        assert_eq!(s.generate_random_item(&mut grid, idx(0, 0), &mut rng).id, ItemId(11));
    }

    #[test]
    fn test_create_item_respects_match_check() {
        let mut grid = Grid::from_layout(&["R R ."]).unwrap();
        let mut s = spawner(0, SpecialWeights::default());
        s.resume_after(grid.max_item_id());
        let mut rng = SimpleRng::new(3);
        let red = ItemKind::usual(Color::Red);

        let placed = s.create_item_for_cell(&mut grid, idx(0, 2), red, false, &mut rng);
        assert_ne!(placed.kind.color, Color::Red);
        assert!(placed.kind.tier.is_usual());

        grid.take_item(idx(0, 2));
        let forced = s.create_item_for_cell(&mut grid, idx(0, 2), red, true, &mut rng);
        assert_eq!(forced.kind, red);
    }

    #[test]
    fn test_retry_cap_falls_back_to_matchless_kind() {
        // Red, orange and yellow are all blocked at (0, 2)
        let mut grid = Grid::from_layout(&["R R . O O", ". . Y . .", ". . Y . ."]).unwrap();
        let detector = MatchDetector::default();
        let mut s = ItemSpawner::new(0, SpecialWeights::default(), detector).with_max_retries(1);
        s.resume_after(grid.max_item_id());
        let mut rng = SimpleRng::new(9);
        for _ in 0..50 {
            grid.take_item(idx(0, 2));
            let item = s.generate_random_item(&mut grid, idx(0, 2), &mut rng);
            assert!(!detector.creates_match(&grid, idx(0, 2), item.kind));
            assert!(matches!(item.kind.color, Color::Green | Color::Blue | Color::Purple));
        }
    }
}
