//! Game state module - the turn state machine
//!
//! Ties together the grid, match detector, special-item resolver, spawner
//! and progress tracking, and drives one level through
//!
//! ```text
//! Initializing -> Idle -> Swapping -> Detonating -> Falling -+-> Idle
//!                  ^          |           ^                   |
//!                  +----------+ (rejected) +---- combo -------+
//!                                                             Idle -> Finalizing
//! ```
//!
//! `Swapping`, `Detonating` and `Falling` each dispatch a batch of item
//! animations and wait until every one of them is reported complete. With
//! [`Pacing::Immediate`] the wait collapses and a whole move resolves inside
//! the call that started it.

use tracing::{debug, info, instrument, trace};

use crate::config::{GameConfig, Pacing};
use crate::detonation::{collect_detonations, resolve_swap};
use crate::error::LevelError;
use crate::event::{EventQueue, EventSink};
use crate::grid::Grid;
use crate::level::Level;
use crate::matcher::MatchDetector;
use crate::progress::{PassConditions, ScoreBoard};
use crate::rng::SimpleRng;
use crate::selection::{Selection, SelectionTracker};
use crate::snapshot::{CellSnapshot, GameSnapshot};
use crate::spawner::ItemSpawner;
use crate::timer::{LevelTimer, TimerSignal};
use crate::types::{
    CellIndex, CellPair, GameEvent, Intent, ItemId, LevelResult, LevelState, PassConditionKind, SpawnSource,
};

/// One level in play
#[derive(Debug, Clone)]
pub struct GameState<S: EventSink = EventQueue> {
    level: Level,
    config: GameConfig,
    seed: u32,
    /// Monotonic episode id (increments on restart)
    episode_id: u32,
    rng: SimpleRng,
    grid: Grid,
    detector: MatchDetector,
    spawner: ItemSpawner,
    selection: SelectionTracker,
    conditions: PassConditions,
    score: ScoreBoard,
    timer: LevelTimer,
    state: LevelState,
    result: LevelResult,
    // Outcome flags, latched as they happen and resolved on the next Idle tick
    conditions_reached: bool,
    no_more_moves: bool,
    time_expired: bool,
    possible_moves: Vec<CellPair>,
    combo: u32,
    max_combo: u32,
    hint_countdown: f32,
    hint: Option<CellPair>,
    paused: bool,
    /// Animations the current state is waiting for, with the cell each item sits in
    pending: Vec<(ItemId, CellIndex)>,
    /// Cells that will detonate when the current swap settles
    detonating: Vec<CellIndex>,
    /// Cells whose occupant fell or was spawned during the current fall
    fallen: Vec<CellIndex>,
    sink: S,
}

impl GameState<EventQueue> {
    /// Start `level` with events buffered in an [`EventQueue`]
    pub fn new(level: Level, config: GameConfig, seed: u32) -> Result<Self, LevelError> {
        Self::with_sink(level, config, seed, EventQueue::new())
    }

    /// Drain every event emitted so far
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.sink.drain()
    }
}

impl<S: EventSink> GameState<S> {
    #[instrument(skip(level, config, sink), fields(rows = level.rows(), columns = level.columns()))]
    pub fn with_sink(level: Level, config: GameConfig, seed: u32, sink: S) -> Result<Self, LevelError> {
        if config.min_match_number < 2 {
            return Err(LevelError::MinMatch(config.min_match_number));
        }
        let detector = MatchDetector::new(config.min_match_number);
        let spawner = ItemSpawner::new(level.special_item_probability(), level.special_weights(), detector)
            .with_max_retries(config.max_spawn_retries);

        let mut game = Self {
            grid: Grid::new(level.rows(), level.columns()),
            timer: LevelTimer::new(level.time_limit_secs(), config.alarm_threshold_secs),
            conditions: PassConditions::new(level.pass_conditions().iter().copied()),
            selection: SelectionTracker::new(config.min_drag_delta),
            level,
            seed,
            episode_id: 0,
            rng: SimpleRng::new(seed),
            detector,
            spawner,
            score: ScoreBoard::default(),
            state: LevelState::Initializing,
            result: LevelResult::Uncertain,
            conditions_reached: false,
            no_more_moves: false,
            time_expired: false,
            possible_moves: Vec::new(),
            combo: 1,
            max_combo: 1,
            hint_countdown: config.hint_interval_secs,
            hint: None,
            paused: false,
            pending: Vec::new(),
            detonating: Vec::new(),
            fallen: Vec::new(),
            config,
            sink,
        };
        game.init_level();
        Ok(game)
    }

    /// Rebuild everything that belongs to one attempt at the level
    fn init_level(&mut self) {
        self.set_state(LevelState::Initializing);

        let detector = MatchDetector::new(self.config.min_match_number);
        self.detector = detector;
        self.rng = SimpleRng::new(self.seed);
        self.spawner = ItemSpawner::new(
            self.level.special_item_probability(),
            self.level.special_weights(),
            detector,
        )
        .with_max_retries(self.config.max_spawn_retries);
        self.selection = SelectionTracker::new(self.config.min_drag_delta);
        self.conditions = PassConditions::new(self.level.pass_conditions().iter().copied());
        self.score = ScoreBoard::default();
        self.timer = LevelTimer::new(self.level.time_limit_secs(), self.config.alarm_threshold_secs);
        self.result = LevelResult::Uncertain;
        self.conditions_reached = false;
        self.no_more_moves = false;
        self.time_expired = false;
        self.combo = 1;
        self.max_combo = 1;
        self.hint = None;
        self.paused = false;
        self.pending.clear();
        self.detonating.clear();
        self.fallen.clear();

        self.grid = Grid::new(self.level.rows(), self.level.columns());
        for i in 0..self.level.cells().len() {
            let idx = CellIndex::new((i / self.level.columns()) as i32, (i % self.level.columns()) as i32);
            let spec = self.level.cells()[i];
            self.grid.set_clear_count(idx, spec.clear_count);
            if spec.clear_count < 0 {
                continue;
            }
            let item = match spec.item {
                Some(kind) => self
                    .spawner
                    .create_item_for_cell(&mut self.grid, idx, kind, false, &mut self.rng),
                None => self.spawner.generate_random_item(&mut self.grid, idx, &mut self.rng),
            };
            self.sink.emit(GameEvent::ItemSpawned {
                cell: idx,
                item,
                source: SpawnSource::Initial,
                delay_rank: 0,
            });
        }

        self.enter_idle();
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn result(&self) -> LevelResult {
        self.result
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Test hook: mutate the grid directly. Possible moves are not recomputed.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn score(&self) -> u32 {
        self.score.level_score()
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn conditions(&self) -> &PassConditions {
        &self.conditions
    }

    pub fn timer(&self) -> &LevelTimer {
        &self.timer
    }

    pub fn possible_moves(&self) -> &[CellPair] {
        &self.possible_moves
    }

    pub fn is_legal_move(&self, pair: CellPair) -> bool {
        self.possible_moves.contains(&pair.normalized())
    }

    pub fn hint(&self) -> Option<CellPair> {
        self.hint
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn selected(&self) -> Option<CellIndex> {
        self.selection.selected()
    }

    /// Number of animations the current state is still waiting for
    pub fn pending_animations(&self) -> usize {
        self.pending.len()
    }

    /// Item ids the current state is waiting for, in dispatch order
    pub fn pending_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.pending.iter().map(|&(id, _)| id)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            rows: self.grid.rows(),
            columns: self.grid.columns(),
            cells: self
                .grid
                .cells()
                .iter()
                .map(|c| CellSnapshot {
                    clear_count: c.clear_count(),
                    item: c.occupant,
                })
                .collect(),
            state: self.state,
            result: self.result,
            level_score: self.score.level_score(),
            combo: self.combo,
            max_combo: self.max_combo,
            time_remaining: self.timer.remaining(),
            time_played: self.timer.time_played(),
            possible_moves: self.possible_moves.len(),
            hint: self.hint,
            selected: self.selection.selected(),
            conditions: self.conditions.iter().collect(),
            paused: self.paused,
            episode_id: self.episode_id,
            seed: self.seed,
        }
    }

    // ---------------------------------------------------------------
    // Driving the simulation
    // ---------------------------------------------------------------

    /// Advance time by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if self.paused || self.state == LevelState::Finalizing {
            return;
        }

        if !self.outcome_pending() {
            let signals: Vec<TimerSignal> = self.timer.tick(dt).collect();
            for signal in signals {
                match signal {
                    TimerSignal::Expiring => self.sink.emit(GameEvent::LevelTimeExpiring),
                    TimerSignal::Expired => {
                        self.time_expired = true;
                        self.sink.emit(GameEvent::LevelTimeExpired);
                    }
                }
            }
        }

        if self.state == LevelState::Idle {
            if self.check_level_result() {
                return;
            }
            self.update_hint(dt);
        }
        self.settle();
    }

    /// Apply one view intent. Returns false when the intent had no effect.
    pub fn apply_intent(&mut self, intent: Intent) -> bool {
        let handled = match intent {
            Intent::Pause => {
                if self.state == LevelState::Finalizing {
                    return false;
                }
                self.paused = !self.paused;
                self.sink.emit(GameEvent::Paused { paused: self.paused });
                true
            }
            Intent::Restart => {
                self.restart();
                true
            }
            Intent::ItemAnimationComplete(id) => self.complete_item(id),
            Intent::HintComplete => self.complete_hint(),
            Intent::SelectCell(idx) => {
                if !self.accepts_pointer() {
                    return false;
                }
                let selection = self.selection.select(&self.grid, idx);
                self.handle_selection(selection)
            }
            Intent::Drag { dx, dy } => {
                if !self.accepts_pointer() {
                    return false;
                }
                let selection = self.selection.drag(&self.grid, dx, dy);
                self.handle_selection(selection)
            }
            Intent::ReleasePointer => {
                if !self.accepts_pointer() {
                    return false;
                }
                self.selection.release();
                true
            }
        };
        self.settle();
        handled
    }

    /// Discard the current attempt and rebuild the level from its descriptor
    pub fn restart(&mut self) {
        self.episode_id = self.episode_id.wrapping_add(1);
        debug!(episode = self.episode_id, "level restarted");
        self.init_level();
    }

    fn accepts_pointer(&self) -> bool {
        self.state == LevelState::Idle && !self.paused && !self.outcome_pending()
    }

    fn outcome_pending(&self) -> bool {
        self.conditions_reached || self.no_more_moves || self.time_expired
    }

    fn set_state(&mut self, to: LevelState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(from = from.as_str(), to = to.as_str(), "state changed");
        self.sink.emit(GameEvent::StateChanged { from, to });
    }

    fn handle_selection(&mut self, selection: Selection) -> bool {
        match selection {
            Selection::Ignored => false,
            Selection::Selected(_) | Selection::Cleared => true,
            Selection::Move(pair) => {
                self.start_swap(pair);
                true
            }
        }
    }

    /// Release every barrier at once when no view paces the simulation
    fn settle(&mut self) {
        if self.config.pacing != Pacing::Immediate {
            return;
        }
        while let Some(id) = self.next_pending() {
            if !self.complete_item(id) {
                break;
            }
        }
    }

    /// Next animation to finish: lowest delay rank first while detonating
    fn next_pending(&self) -> Option<ItemId> {
        if self.state == LevelState::Detonating {
            self.pending
                .iter()
                .min_by_key(|&&(_, cell)| (self.grid.cell(cell).delay_rank.unwrap_or(0), cell.row, cell.col))
                .map(|&(id, _)| id)
        } else {
            self.pending.first().map(|&(id, _)| id)
        }
    }

    fn take_pending(&mut self, id: ItemId) -> Option<CellIndex> {
        let pos = self.pending.iter().position(|&(pending, _)| pending == id)?;
        Some(self.pending.remove(pos).1)
    }

    fn complete_item(&mut self, id: ItemId) -> bool {
        match self.state {
            LevelState::Swapping => {
                if self.take_pending(id).is_none() {
                    return false;
                }
                if self.pending.is_empty() {
                    self.finish_swap();
                }
                true
            }
            LevelState::Detonating => {
                let Some(cell) = self.take_pending(id) else {
                    return false;
                };
                self.finish_detonation(cell);
                if self.pending.is_empty() {
                    self.start_falling();
                }
                true
            }
            LevelState::Falling => {
                let Some(cell) = self.take_pending(id) else {
                    return false;
                };
                if let Some(item) = self.grid.item(cell) {
                    self.sink.emit(GameEvent::ItemSettledAfterFall { cell, item });
                }
                if self.pending.is_empty() {
                    self.finish_fall();
                }
                true
            }
            _ => false,
        }
    }

    // ---------------------------------------------------------------
    // Idle
    // ---------------------------------------------------------------

    fn enter_idle(&mut self) {
        self.possible_moves = self.detector.possible_moves(&mut self.grid);
        self.sink.emit(GameEvent::PossibleMovesChanged {
            count: self.possible_moves.len(),
        });
        if self.possible_moves.is_empty() {
            self.no_more_moves = true;
            self.sink.emit(GameEvent::NoMoreMoves);
        }
        self.combo = 1;
        self.hint_countdown = self.config.hint_interval_secs;
        self.set_state(LevelState::Idle);
    }

    /// Resolve latched outcome flags: a win beats running out of moves,
    /// which beats running out of time.
    fn check_level_result(&mut self) -> bool {
        let result = if self.conditions_reached {
            LevelResult::AllConditionsReached
        } else if self.no_more_moves {
            LevelResult::NoMoreMoves
        } else if self.time_expired {
            LevelResult::TimeExpired
        } else {
            return false;
        };

        self.result = result;
        self.selection.reset();
        self.cancel_hint();
        self.set_state(LevelState::Finalizing);

        let score = self.score.level_score();
        let time_played = self.timer.time_played();
        if result.is_win() {
            info!(score, max_combo = self.max_combo, time_played, "level completed");
            self.sink.emit(GameEvent::LevelCompleted {
                score,
                max_combo: self.max_combo,
                time_played,
            });
        } else {
            info!(result = result.as_str(), score, time_played, "level failed");
            self.sink.emit(GameEvent::LevelFailed {
                result,
                score,
                time_played,
            });
        }
        true
    }

    fn update_hint(&mut self, dt: f32) {
        if self.hint.is_some() || self.hint_countdown <= 0.0 {
            return;
        }
        self.hint_countdown -= dt;
        if self.hint_countdown > 0.0 {
            return;
        }
        let Some(&pair) = self.rng.pick(&self.possible_moves) else {
            return;
        };
        self.hint = Some(pair);
        self.sink.emit(GameEvent::HintSuggested { pair });
        if self.config.pacing == Pacing::Immediate {
            self.complete_hint();
        }
    }

    fn complete_hint(&mut self) -> bool {
        if self.hint.take().is_none() {
            return false;
        }
        self.hint_countdown = self.config.hint_interval_secs / 2.0;
        true
    }

    fn cancel_hint(&mut self) {
        if self.hint.take().is_some() {
            self.sink.emit(GameEvent::HintCancelled);
        }
    }

    // ---------------------------------------------------------------
    // Swapping
    // ---------------------------------------------------------------

    fn start_swap(&mut self, pair: CellPair) {
        self.cancel_hint();
        self.hint_countdown = self.config.hint_interval_secs;

        self.detonating = if self.is_legal_move(pair) {
            resolve_swap(&mut self.grid, &self.detector, &mut self.rng, pair)
        } else {
            Vec::new()
        };
        let accepted = !self.detonating.is_empty();
        debug!(first = %pair.first, second = %pair.second, accepted, "swap started");

        self.set_state(LevelState::Swapping);
        self.sink.emit(GameEvent::CellSwapStarted { pair, accepted });
        for cell in [pair.first, pair.second] {
            if let Some(item) = self.grid.item(cell) {
                self.pending.push((item.id, cell));
            }
        }
        if self.pending.is_empty() {
            self.finish_swap();
        }
    }

    fn finish_swap(&mut self) {
        if self.detonating.is_empty() {
            self.set_state(LevelState::Idle);
        } else {
            self.start_detonation();
        }
    }

    // ---------------------------------------------------------------
    // Detonating
    // ---------------------------------------------------------------

    fn start_detonation(&mut self) {
        self.set_state(LevelState::Detonating);
        let set = std::mem::take(&mut self.detonating);
        trace!(cells = set.len(), "detonation started");

        for idx in set {
            let cell = self.grid.cell_mut(idx);
            let rank = cell.delay_rank.unwrap_or(0).max(0);
            cell.delay_rank = Some(rank);
            if cell.hit() {
                let remaining = cell.clear_count();
                self.sink.emit(GameEvent::CellCleared { cell: idx, remaining });
                self.update_condition(PassConditionKind::CellClear);
            }

            match self.grid.item(idx) {
                Some(item) => {
                    self.sink.emit(GameEvent::ItemDetonated {
                        cell: idx,
                        item,
                        delay_rank: rank,
                    });
                    self.pending.push((item.id, idx));
                }
                None => self.grid.cell_mut(idx).reset_transient(),
            }
        }

        if self.pending.is_empty() {
            self.start_falling();
        }
    }

    fn finish_detonation(&mut self, idx: CellIndex) {
        let Some(item) = self.grid.take_item(idx) else {
            return;
        };
        self.update_condition(PassConditionKind::for_item(item.kind));

        let cell = self.grid.cell_mut(idx);
        let caused = cell.caused_detonations;
        let upgrade = cell.pending_upgrade;
        cell.reset_transient();

        if caused > 0 {
            let delta = self.score.add_match(caused as usize);
            if delta > 0 {
                self.sink.emit(GameEvent::ScoreChanged {
                    delta,
                    level_score: self.score.level_score(),
                });
            }
        }

        if let Some(kind) = upgrade {
            let item = self
                .spawner
                .create_item_for_cell(&mut self.grid, idx, kind, true, &mut self.rng);
            self.sink.emit(GameEvent::ItemSpawned {
                cell: idx,
                item,
                source: SpawnSource::Upgrade,
                delay_rank: 0,
            });
        }
    }

    fn update_condition(&mut self, kind: PassConditionKind) {
        let Some(update) = self.conditions.update(kind) else {
            return;
        };
        self.sink.emit(GameEvent::ConditionUpdated {
            kind,
            remaining: update.remaining,
        });
        if update.all_reached {
            self.conditions_reached = true;
            self.sink.emit(GameEvent::AllConditionsReached);
        }
    }

    // ---------------------------------------------------------------
    // Falling
    // ---------------------------------------------------------------

    fn fall_rank(&self, cell: CellIndex) -> i32 {
        (self.grid.columns() as i32 / 2 - cell.col).abs()
    }

    fn start_falling(&mut self) {
        self.set_state(LevelState::Falling);
        self.fallen.clear();

        for (from, to) in self.grid.apply_gravity() {
            let Some(item) = self.grid.item(to) else {
                continue;
            };
            let delay_rank = self.fall_rank(to);
            self.sink.emit(GameEvent::ItemFell {
                from,
                to,
                item,
                delay_rank,
            });
            self.pending.push((item.id, to));
            self.fallen.push(to);
        }

        for idx in self.grid.empty_cells_for_refill() {
            let item = self
                .spawner
                .generate_random_item(&mut self.grid, idx, &mut self.rng);
            let delay_rank = self.fall_rank(idx);
            self.sink.emit(GameEvent::ItemSpawned {
                cell: idx,
                item,
                source: SpawnSource::Refill,
                delay_rank,
            });
            self.pending.push((item.id, idx));
            self.fallen.push(idx);
        }

        trace!(items = self.pending.len(), "fall started");
        if self.pending.is_empty() {
            self.finish_fall();
        }
    }

    fn finish_fall(&mut self) {
        let candidates = std::mem::take(&mut self.fallen);
        let set = collect_detonations(&mut self.grid, &self.detector, &mut self.rng, &candidates);
        if set.is_empty() {
            self.enter_idle();
            return;
        }

        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        debug!(combo = self.combo, cells = set.len(), "combo advanced");
        self.sink.emit(GameEvent::ComboAdvanced { count: self.combo });
        self.detonating = set;
        self.start_detonation();
    }
}
