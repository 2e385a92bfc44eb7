//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (simulation core, view layer, headless runners).
//!
//! # Grid Coordinates
//!
//! Cells are addressed by [`CellIndex`] `(row, col)`:
//!
//! - **row** grows downward; row 0 is the top of the field and gravity pulls
//!   items toward larger rows
//! - **col** grows to the right
//!
//! # Items
//!
//! Every item has a base [`Color`] and a [`Tier`]. Matching only looks at the
//! color, so a red bomb lines up with plain red items.
//!
//! | Tier | Text suffix | Legacy code | Effect when detonated |
//! |------|-------------|-------------|------------------------|
//! | `Usual` | none | 1-6 | none |
//! | `Bomb` | `+bomb` | 11-16 | clears the 8 surrounding cells |
//! | `VerticalBomb` | `+vbomb` | 21-26 | clears its column run |
//! | `HorizontalBomb` | `+hbomb` | 31-36 | clears its row run |
//! | `Star` | `+star` | 41-46 | counts toward the star pass condition |
//!
//! # Balance Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MIN_MATCH_NUMBER` | 3 | Shortest run that counts as a match |
//! | `DEFAULT_HINT_INTERVAL_SECS` | 10.0 | Idle time before a hint is shown |
//! | `DEFAULT_TIME_ALARM_SECS` | 30.0 | Remaining time that raises the "expiring" signal |
//! | `DEFAULT_MIN_DRAG_DELTA` | 0.35 | Drag length (in cells) that resolves to a swap |
//! | `DEFAULT_SPAWN_RETRIES` | 64 | Rejection-sampling cap for the spawner |
//!
//! # Examples
//!
//! ```
//! use candy_match_types::{CellIndex, CellPair, Color, ItemKind, Tier};
//!
//! let kind = ItemKind::from_str("red+bomb").unwrap();
//! assert_eq!(kind.color, Color::Red);
//! assert_eq!(kind.tier, Tier::Bomb);
//! assert_eq!(kind.to_string(), "red+bomb");
//!
//! // Legacy numeric codes are decoded explicitly.
//! assert_eq!(ItemKind::from_code(23), Some(ItemKind::new(Color::Yellow, Tier::VerticalBomb)));
//!
//! let pair = CellPair::new(CellIndex::new(2, 3), CellIndex::new(2, 4));
//! assert!(pair.is_adjacent());
//! ```

use std::fmt;

/// Shortest contiguous run (origin inclusive) that counts as a match
pub const MIN_MATCH_NUMBER: usize = 3;

/// Number of base colors
pub const COLOR_COUNT: usize = 6;

/// Idle time before a move hint is suggested (seconds)
pub const DEFAULT_HINT_INTERVAL_SECS: f32 = 10.0;

/// Remaining level time at which the "expiring" signal fires (seconds)
pub const DEFAULT_TIME_ALARM_SECS: f32 = 30.0;

/// Minimum drag length, in cell units, that resolves to a neighbour
pub const DEFAULT_MIN_DRAG_DELTA: f32 = 0.35;

/// Rejection-sampling cap for random item generation
pub const DEFAULT_SPAWN_RETRIES: u32 = 64;

/// Points awarded for one causal match, indexed by the number of cells it cleared.
///
/// Index 0-2 are not valid matches. Sizes past [`MAX_SCORED_MATCH`] have no
/// entry and are not paid.
pub const MATCH_SCORES: [u32; 9] = [0, 0, 0, 25, 50, 100, 250, 500, 1000];

/// Largest match size with its own entry in [`MATCH_SCORES`]
pub const MAX_SCORED_MATCH: usize = 8;

/// The six base colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Color {
    /// All colors in legacy-code order
    pub const ALL: [Color; COLOR_COUNT] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
    ];

    /// Parse a color from its name or 1-based digit (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use candy_match_types::Color;
    ///
    /// assert_eq!(Color::from_str("Green"), Some(Color::Green));
    /// assert_eq!(Color::from_str("1"), Some(Color::Red));
    /// assert_eq!(Color::from_str("pink"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "red" | "1" => Some(Color::Red),
            "orange" | "2" => Some(Color::Orange),
            "yellow" | "3" => Some(Color::Yellow),
            "green" | "4" => Some(Color::Green),
            "blue" | "5" => Some(Color::Blue),
            "purple" | "6" => Some(Color::Purple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
        }
    }

    /// 1-based legacy code
    pub fn code(&self) -> u8 {
        match self {
            Color::Red => 1,
            Color::Orange => 2,
            Color::Yellow => 3,
            Color::Green => 4,
            Color::Blue => 5,
            Color::Purple => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=6 => Some(Self::ALL[(code - 1) as usize]),
            _ => None,
        }
    }
}

/// Item tier
///
/// - **Usual**: plain item, only clears itself
/// - **Bomb**: clears the eight surrounding cells
/// - **VerticalBomb** / **HorizontalBomb**: clear the run of occupied cells along a column / row
/// - **Star**: no blast; collected for the star pass condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Usual,
    Bomb,
    VerticalBomb,
    HorizontalBomb,
    Star,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Usual,
        Tier::Bomb,
        Tier::VerticalBomb,
        Tier::HorizontalBomb,
        Tier::Star,
    ];

    /// Special tiers in the order their generation weights are accumulated
    pub const SPECIAL: [Tier; 4] = [
        Tier::Bomb,
        Tier::VerticalBomb,
        Tier::HorizontalBomb,
        Tier::Star,
    ];

    pub fn is_usual(&self) -> bool {
        matches!(self, Tier::Usual)
    }

    pub fn is_special(&self) -> bool {
        !self.is_usual()
    }

    /// True for tiers that expand into a blast when detonated
    pub fn is_explosive(&self) -> bool {
        matches!(self, Tier::Bomb | Tier::VerticalBomb | Tier::HorizontalBomb)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "usual" => Some(Tier::Usual),
            "bomb" => Some(Tier::Bomb),
            "vbomb" | "vertical" | "vertical_bomb" => Some(Tier::VerticalBomb),
            "hbomb" | "horizontal" | "horizontal_bomb" => Some(Tier::HorizontalBomb),
            "star" => Some(Tier::Star),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Usual => "usual",
            Tier::Bomb => "bomb",
            Tier::VerticalBomb => "vbomb",
            Tier::HorizontalBomb => "hbomb",
            Tier::Star => "star",
        }
    }

    fn code_offset(&self) -> u8 {
        match self {
            Tier::Usual => 0,
            Tier::Bomb => 10,
            Tier::VerticalBomb => 20,
            Tier::HorizontalBomb => 30,
            Tier::Star => 40,
        }
    }
}

/// What an item is: base color plus tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKind {
    pub color: Color,
    pub tier: Tier,
}

impl ItemKind {
    pub const fn new(color: Color, tier: Tier) -> Self {
        Self { color, tier }
    }

    pub const fn usual(color: Color) -> Self {
        Self::new(color, Tier::Usual)
    }

    /// Same color, different tier
    pub fn with_tier(self, tier: Tier) -> Self {
        Self { tier, ..self }
    }

    /// Parse `"<color>"` or `"<color>+<tier>"`
    ///
    /// # Examples
    ///
    /// ```
    /// use candy_match_types::{Color, ItemKind, Tier};
    ///
    /// assert_eq!(ItemKind::from_str("blue"), Some(ItemKind::usual(Color::Blue)));
    /// assert_eq!(
    ///     ItemKind::from_str("purple+hbomb"),
    ///     Some(ItemKind::new(Color::Purple, Tier::HorizontalBomb))
    /// );
    /// assert_eq!(ItemKind::from_str("blue+laser"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        let (color, tier) = match s.split_once('+') {
            Some((c, t)) => (c, t),
            None => (s, ""),
        };
        Some(Self::new(Color::from_str(color)?, Tier::from_str(tier)?))
    }

    /// Decode a legacy numeric code (`code % 10` = color, decade = tier)
    pub fn from_code(code: u8) -> Option<Self> {
        let color = Color::from_code(code % 10)?;
        let tier = match code / 10 {
            0 => Tier::Usual,
            1 => Tier::Bomb,
            2 => Tier::VerticalBomb,
            3 => Tier::HorizontalBomb,
            4 => Tier::Star,
            _ => return None,
        };
        Some(Self::new(color, tier))
    }

    /// Encode as a legacy numeric code
    pub fn code(&self) -> u8 {
        self.tier.code_offset() + self.color.code()
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tier {
            Tier::Usual => f.write_str(self.color.as_str()),
            tier => write!(f, "{}+{}", self.color.as_str(), tier.as_str()),
        }
    }
}

/// Handle identifying one spawned item for its whole lifetime.
///
/// The view echoes it back in [`Intent::ItemAnimationComplete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

/// A playable token occupying a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
}

/// Grid position `(row, col)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub row: i32,
    pub col: i32,
}

impl CellIndex {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    /// Manhattan distance of exactly one (no diagonals)
    pub fn is_adjacent(self, other: Self) -> bool {
        (self.row - other.row).abs() + (self.col - other.col).abs() == 1
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Two cells proposed for (or taking part in) a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPair {
    pub first: CellIndex,
    pub second: CellIndex,
}

impl CellPair {
    pub const fn new(first: CellIndex, second: CellIndex) -> Self {
        Self { first, second }
    }

    pub fn is_adjacent(&self) -> bool {
        self.first.is_adjacent(self.second)
    }

    /// Order the two cells so that equal pairs compare equal regardless of direction
    pub fn normalized(self) -> Self {
        if self.second < self.first {
            Self::new(self.second, self.first)
        } else {
            self
        }
    }

    pub fn contains(&self, idx: CellIndex) -> bool {
        self.first == idx || self.second == idx
    }
}

/// What a pass condition counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassConditionKind {
    /// A hit on a cell that still had clear count left
    CellClear,
    /// A detonated non-star item of the given color
    Collect(Color),
    /// A detonated star of any color
    CollectStar,
}

impl PassConditionKind {
    /// Parse `cell_clear`, `collect_<color>` or `collect_star` (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "cell_clear" => Some(PassConditionKind::CellClear),
            "collect_star" => Some(PassConditionKind::CollectStar),
            other => other
                .strip_prefix("collect_")
                .and_then(Color::from_str)
                .map(PassConditionKind::Collect),
        }
    }

    /// The condition an item feeds when it is detonated
    pub fn for_item(kind: ItemKind) -> Self {
        match kind.tier {
            Tier::Star => PassConditionKind::CollectStar,
            _ => PassConditionKind::Collect(kind.color),
        }
    }
}

impl fmt::Display for PassConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassConditionKind::CellClear => f.write_str("cell_clear"),
            PassConditionKind::Collect(color) => write!(f, "collect_{}", color.as_str()),
            PassConditionKind::CollectStar => f.write_str("collect_star"),
        }
    }
}

/// Turn state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelState {
    Initializing,
    Idle,
    Swapping,
    Detonating,
    Falling,
    Finalizing,
}

impl LevelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelState::Initializing => "initializing",
            LevelState::Idle => "idle",
            LevelState::Swapping => "swapping",
            LevelState::Detonating => "detonating",
            LevelState::Falling => "falling",
            LevelState::Finalizing => "finalizing",
        }
    }
}

/// Outcome of a level. `Uncertain` while play continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelResult {
    Uncertain,
    AllConditionsReached,
    NoMoreMoves,
    TimeExpired,
}

impl LevelResult {
    pub fn is_finished(&self) -> bool {
        !matches!(self, LevelResult::Uncertain)
    }

    pub fn is_win(&self) -> bool {
        matches!(self, LevelResult::AllConditionsReached)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelResult::Uncertain => "uncertain",
            LevelResult::AllConditionsReached => "allConditionsReached",
            LevelResult::NoMoreMoves => "noMoreMoves",
            LevelResult::TimeExpired => "timeExpired",
        }
    }
}

/// Why an item appeared in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnSource {
    /// Placed while building the level
    Initial,
    /// Upgrade left behind by a large match
    Upgrade,
    /// Refill falling in from above the grid
    Refill,
}

/// View-to-core intents
///
/// Pointer intents are abstract: the view maps its input device to cells and
/// drag vectors. Drag vectors are in cell units with `dy > 0` pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Press on a cell
    SelectCell(CellIndex),
    /// Pointer moved by `(dx, dy)` since the press
    Drag { dx: f32, dy: f32 },
    /// Pointer released without completing a drag
    ReleasePointer,
    /// The view finished animating the given item (swap, detonation or fall)
    ItemAnimationComplete(ItemId),
    /// The view finished showing the current hint
    HintComplete,
    /// Toggle pause
    Pause,
    /// Discard the level and rebuild it from its descriptor
    Restart,
}

/// Core-to-view semantic events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    StateChanged { from: LevelState, to: LevelState },
    /// A swap started animating. Rejected swaps animate there and back.
    CellSwapStarted { pair: CellPair, accepted: bool },
    /// A cell lost one point of clear count
    CellCleared { cell: CellIndex, remaining: i32 },
    /// An occupant started detonating; `delay_rank` paces the cascade
    ItemDetonated { cell: CellIndex, item: Item, delay_rank: i32 },
    ItemSpawned { cell: CellIndex, item: Item, source: SpawnSource, delay_rank: i32 },
    ItemFell { from: CellIndex, to: CellIndex, item: Item, delay_rank: i32 },
    ItemSettledAfterFall { cell: CellIndex, item: Item },
    ConditionUpdated { kind: PassConditionKind, remaining: u32 },
    AllConditionsReached,
    NoMoreMoves,
    PossibleMovesChanged { count: usize },
    ComboAdvanced { count: u32 },
    HintSuggested { pair: CellPair },
    HintCancelled,
    LevelTimeExpiring,
    LevelTimeExpired,
    ScoreChanged { delta: u32, level_score: u32 },
    Paused { paused: bool },
    LevelCompleted { score: u32, max_combo: u32, time_played: f32 },
    LevelFailed { result: LevelResult, score: u32, time_played: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_defaults() {
        assert_eq!(MIN_MATCH_NUMBER, 3);
        assert_eq!(MATCH_SCORES[3], 25);
        assert_eq!(MATCH_SCORES[5], 100);
        assert_eq!(MATCH_SCORES[MAX_SCORED_MATCH], 1000);
        assert_eq!(DEFAULT_TIME_ALARM_SECS, 30.0);
    }

    #[test]
    fn legacy_codes_roundtrip_every_kind() {
        for color in Color::ALL {
            for tier in Tier::ALL {
                let kind = ItemKind::new(color, tier);
                assert_eq!(ItemKind::from_code(kind.code()), Some(kind));
                assert_eq!(ItemKind::from_str(&kind.to_string()), Some(kind));
            }
        }
        assert_eq!(ItemKind::from_code(0), None);
        assert_eq!(ItemKind::from_code(17), None);
        assert_eq!(ItemKind::from_code(51), None);
    }

    #[test]
    fn pair_adjacency() {
        let a = CellIndex::new(1, 1);
        assert!(CellPair::new(a, CellIndex::new(0, 1)).is_adjacent());
        assert!(CellPair::new(a, CellIndex::new(1, 2)).is_adjacent());
        assert!(!CellPair::new(a, CellIndex::new(2, 2)).is_adjacent());
        assert!(!CellPair::new(a, a).is_adjacent());
    }

    #[test]
    fn pair_normalization_is_order_independent() {
        let a = CellIndex::new(3, 1);
        let b = CellIndex::new(2, 1);
        assert_eq!(CellPair::new(a, b).normalized(), CellPair::new(b, a).normalized());
        assert_eq!(CellPair::new(a, b).normalized().first, b);
    }

    #[test]
    fn condition_kind_parsing() {
        assert_eq!(PassConditionKind::from_str("cell_clear"), Some(PassConditionKind::CellClear));
        assert_eq!(
            PassConditionKind::from_str("collect_blue"),
            Some(PassConditionKind::Collect(Color::Blue))
        );
        assert_eq!(PassConditionKind::from_str("Collect_Star"), Some(PassConditionKind::CollectStar));
        assert_eq!(PassConditionKind::from_str("collect_pink"), None);
    }
}
