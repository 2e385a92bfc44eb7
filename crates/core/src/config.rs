//! Simulation settings shared by every level of a run

use crate::types::{
    DEFAULT_HINT_INTERVAL_SECS, DEFAULT_MIN_DRAG_DELTA, DEFAULT_SPAWN_RETRIES, DEFAULT_TIME_ALARM_SECS,
    MIN_MATCH_NUMBER,
};

/// How completion barriers are released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// No view attached: every dispatched animation counts as finished at once
    #[default]
    Immediate,
    /// Wait for `ItemAnimationComplete` / `HintComplete` intents
    Driven,
}

impl Pacing {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Some(Pacing::Immediate),
            "driven" => Some(Pacing::Driven),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pacing::Immediate => "immediate",
            Pacing::Driven => "driven",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub min_match_number: usize,
    pub hint_interval_secs: f32,
    pub alarm_threshold_secs: f32,
    pub min_drag_delta: f32,
    pub max_spawn_retries: u32,
    pub pacing: Pacing,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_match_number: MIN_MATCH_NUMBER,
            hint_interval_secs: DEFAULT_HINT_INTERVAL_SECS,
            alarm_threshold_secs: DEFAULT_TIME_ALARM_SECS,
            min_drag_delta: DEFAULT_MIN_DRAG_DELTA,
            max_spawn_retries: DEFAULT_SPAWN_RETRIES,
            pacing: Pacing::Immediate,
        }
    }
}

impl GameConfig {
    /// Create from environment variables; unset or unparsable values keep their default
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let min_match_number = env::var("CANDY_MIN_MATCH")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n >= 2)
            .unwrap_or(defaults.min_match_number);

        let hint_interval_secs = env::var("CANDY_HINT_INTERVAL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.hint_interval_secs);

        let alarm_threshold_secs = env::var("CANDY_TIME_ALARM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.alarm_threshold_secs);

        let min_drag_delta = env::var("CANDY_MIN_DRAG")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_drag_delta);

        let max_spawn_retries = env::var("CANDY_SPAWN_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_spawn_retries);

        let pacing = env::var("CANDY_PACING")
            .ok()
            .and_then(|s| Pacing::from_str(&s))
            .unwrap_or(defaults.pacing);

        Self {
            min_match_number,
            hint_interval_secs,
            alarm_threshold_secs,
            min_drag_delta,
            max_spawn_retries,
            pacing,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}
