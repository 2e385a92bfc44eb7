//! Core simulation module - pure, deterministic, and testable
//!
//! This crate holds every rule of the match-3 board: grid terrain, match
//! detection, special-item cascades, item generation, the turn state machine
//! and level progress. It draws nothing and reads no input device; a view
//! drives it with [`Intent`](types::Intent)s and renders the
//! [`GameEvent`](types::GameEvent)s it emits.
//!
//! - **Deterministic**: the same level, config and seed replay identically
//! - **Headless**: [`Pacing::Immediate`] resolves a whole move per call
//!
//! # Module Structure
//!
//! - [`grid`]: cells, terrain, neighbourhoods, gravity
//! - [`matcher`]: runs, legal moves, upgrade policy
//! - [`detonation`]: detonation sets, delay ranks and special-item blasts
//! - [`spawner`]: weighted random items that never complete a match
//! - [`game_state`]: the turn state machine
//! - [`progress`] / [`timer`] / [`scoring`]: pass conditions, score and level clock
//! - [`level`]: level descriptors and their validation
//! - [`selection`]: pointer intents to swap proposals
//!
//! # Example
//!
//! ```
//! use candy_match_core::{GameConfig, GameState, Level};
//! use candy_match_core::types::{CellIndex, Color, Intent, PassConditionKind};
//!
//! let level = Level::from_layout(&["R R G B", "O P R Y", "G B O P"])
//!     .unwrap()
//!     .with_conditions([(PassConditionKind::Collect(Color::Red), 3)]);
//! let mut game = GameState::new(level, GameConfig::default(), 12345).unwrap();
//!
//! game.apply_intent(Intent::SelectCell(CellIndex::new(0, 2)));
//! game.apply_intent(Intent::SelectCell(CellIndex::new(1, 2)));
//! game.tick(0.016);
//!
//! assert_eq!(game.score(), 25);
//! assert!(game.result().is_win());
//! ```

pub mod config;
pub mod detonation;
pub mod error;
pub mod event;
pub mod game_state;
pub mod grid;
pub mod level;
pub mod matcher;
pub mod progress;
pub mod rng;
pub mod scoring;
pub mod selection;
pub mod snapshot;
pub mod spawner;
pub mod timer;

pub use candy_match_types as types;

// Re-export commonly used types for convenience
pub use config::{GameConfig, Pacing};
pub use error::LevelError;
pub use event::{EventQueue, EventSink};
pub use game_state::GameState;
pub use grid::{Cell, Grid};
pub use level::{Level, LevelData};
pub use matcher::MatchDetector;
pub use progress::{PassConditions, ScoreBoard, SessionProgress};
pub use rng::SimpleRng;
pub use scoring::score_for_match;
pub use snapshot::{CellSnapshot, GameSnapshot};
pub use spawner::{ItemSpawner, SpecialWeights};
pub use timer::{LevelTimer, TimerSignal};
