//! Turn state machine tests - swaps, cascades, outcomes

use candy_match::core::{GameConfig, GameState, Level, Pacing};
use candy_match::types::{
    CellIndex, CellPair, Color, GameEvent, Intent, ItemKind, LevelResult, LevelState, PassConditionKind, SpawnSource,
    Tier,
};

fn idx(row: i32, col: i32) -> CellIndex {
    CellIndex::new(row, col)
}

fn driven() -> GameConfig {
    GameConfig::default().with_pacing(Pacing::Driven)
}

fn swap(game: &mut GameState, a: CellIndex, b: CellIndex) {
    assert!(game.apply_intent(Intent::SelectCell(a)));
    assert!(game.apply_intent(Intent::SelectCell(b)));
}

/// Acknowledge animations until the state machine stops waiting
fn finish_animations(game: &mut GameState) {
    loop {
        let next = game.pending_items().next();
        match next {
            Some(id) => assert!(game.apply_intent(Intent::ItemAnimationComplete(id))),
            None => break,
        }
    }
}

fn detonated_cells(events: &[GameEvent]) -> Vec<CellIndex> {
    let mut cells: Vec<CellIndex> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ItemDetonated { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    cells.sort();
    cells
}

fn red_level(layout: &[&str], target: u32) -> Level {
    Level::from_layout(layout)
        .unwrap()
        .with_conditions([(PassConditionKind::Collect(Color::Red), target)])
}

#[test]
fn test_single_row_swap_end_to_end() {
    let mut game = GameState::new(red_level(&["R R B R R"], 3), driven(), 11).unwrap();
    assert_eq!(game.possible_moves().len(), 2);
    game.take_events();

    swap(&mut game, idx(0, 2), idx(0, 3));
    assert_eq!(game.state(), LevelState::Swapping);
    assert!(game.take_events().contains(&GameEvent::CellSwapStarted {
        pair: CellPair::new(idx(0, 2), idx(0, 3)),
        accepted: true,
    }));

    // both swapped items must report in before anything detonates
    let ids: Vec<_> = game.pending_items().collect();
    game.apply_intent(Intent::ItemAnimationComplete(ids[0]));
    assert!(game.take_events().is_empty());
    game.apply_intent(Intent::ItemAnimationComplete(ids[1]));
    assert_eq!(game.state(), LevelState::Detonating);

    let events = game.take_events();
    assert_eq!(detonated_cells(&events), vec![idx(0, 0), idx(0, 1), idx(0, 2)]);
    assert_eq!(game.grid().item(idx(0, 3)).unwrap().kind.color, Color::Blue);
    assert_eq!(game.grid().item(idx(0, 4)).unwrap().kind.color, Color::Red);

    finish_animations(&mut game);
    assert_eq!(game.state(), LevelState::Idle);
    let events = game.take_events();
    assert!(events.contains(&GameEvent::ScoreChanged { delta: 25, level_score: 25 }));
    assert!(events.contains(&GameEvent::AllConditionsReached));
    assert_eq!(
        game.grid().item(idx(0, 2)).unwrap().kind,
        ItemKind::new(Color::Red, Tier::Bomb)
    );
    let refills = events
        .iter()
        .filter(|e| matches!(e, GameEvent::ItemSpawned { source: SpawnSource::Refill, .. }))
        .count();
    assert_eq!(refills, 2);

    // the outcome is settled on the next idle tick
    assert_eq!(game.result(), LevelResult::Uncertain);
    assert!(!game.apply_intent(Intent::SelectCell(idx(0, 0))));
    game.tick(0.1);
    assert_eq!(game.result(), LevelResult::AllConditionsReached);
    assert_eq!(game.state(), LevelState::Finalizing);
    assert!(game.take_events().iter().any(|e| matches!(
        e,
        GameEvent::LevelCompleted { score: 25, max_combo: 1, .. }
    )));
}

#[test]
fn test_swap_with_empty_result_reverts() {
    let layout = ["R R G B", "O P R Y", "G B O P"];
    let mut game = GameState::new(red_level(&layout, 10), GameConfig::default(), 5).unwrap();
    let before = game.grid().clone();
    let moves = game.possible_moves().to_vec();
    game.take_events();

    swap(&mut game, idx(1, 0), idx(1, 1));
    assert_eq!(game.state(), LevelState::Idle);
    assert_eq!(game.grid(), &before);
    assert_eq!(game.score(), 0);
    assert_eq!(game.possible_moves(), &moves[..]);

    let events = game.take_events();
    assert!(events.contains(&GameEvent::CellSwapStarted {
        pair: CellPair::new(idx(1, 0), idx(1, 1)),
        accepted: false,
    }));
    assert!(detonated_cells(&events).is_empty());
}

#[test]
fn test_non_adjacent_selection_does_not_swap() {
    let mut game = GameState::new(red_level(&["R R G B", "O P R Y", "G B O P"], 10), driven(), 5).unwrap();
    game.apply_intent(Intent::SelectCell(idx(0, 0)));
    game.apply_intent(Intent::SelectCell(idx(2, 2)));
    assert_eq!(game.state(), LevelState::Idle);
    assert_eq!(game.selected(), None);
}

#[test]
fn test_pointer_ignored_while_busy() {
    let mut game = GameState::new(red_level(&["R R G B", "O P R Y", "G B O P"], 10), driven(), 5).unwrap();
    swap(&mut game, idx(0, 2), idx(1, 2));
    assert_eq!(game.state(), LevelState::Swapping);
    assert!(!game.apply_intent(Intent::SelectCell(idx(2, 0))));
    assert!(!game.apply_intent(Intent::Drag { dx: 1.0, dy: 0.0 }));
    assert_eq!(game.selected(), None);
}

#[test]
fn test_bomb_in_match_blasts_neighbours() {
    let layout = ["R R G", "G B R*", "O P Y"];
    let mut game = GameState::new(red_level(&layout, 20), GameConfig::default(), 9).unwrap();
    game.take_events();

    swap(&mut game, idx(0, 2), idx(1, 2));
    assert_eq!(game.state(), LevelState::Idle);

    let events = game.take_events();
    assert_eq!(
        detonated_cells(&events),
        vec![idx(0, 0), idx(0, 1), idx(0, 2), idx(1, 1), idx(1, 2)]
    );
    let rank_of = |cell: CellIndex| {
        events.iter().find_map(|e| match e {
            GameEvent::ItemDetonated { cell: c, delay_rank, .. } if *c == cell => Some(*delay_rank),
            _ => None,
        })
    };
    assert_eq!(rank_of(idx(0, 2)), Some(0));
    assert_eq!(rank_of(idx(1, 1)), Some(0));
    assert_eq!(rank_of(idx(0, 1)), Some(1));
    assert_eq!(rank_of(idx(0, 0)), Some(2));

    // only the match origin scores
    let first_score = events.iter().find_map(|e| match e {
        GameEvent::ScoreChanged { delta, .. } => Some(*delta),
        _ => None,
    });
    assert_eq!(first_score, Some(25));

    // the upgrade left at (0,2) drops into the blasted cell below it
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::ItemFell { from, to, item, .. }
            if *from == idx(0, 2) && *to == idx(1, 2) && item.kind.tier == Tier::Bomb
    )));
    assert_eq!(
        game.conditions().remaining(PassConditionKind::Collect(Color::Red)),
        Some(17)
    );
}

#[test]
fn test_barrier_cells_feed_cell_clear() {
    let layout = ["1:R 1:R G B", "O P R Y", "G B O P"];
    let level = Level::from_layout(&layout)
        .unwrap()
        .with_conditions([(PassConditionKind::CellClear, 2)]);
    let mut game = GameState::new(level, GameConfig::default(), 3).unwrap();
    game.take_events();

    swap(&mut game, idx(0, 2), idx(1, 2));
    let events = game.take_events();
    assert!(events.contains(&GameEvent::CellCleared { cell: idx(0, 0), remaining: 0 }));
    assert!(events.contains(&GameEvent::CellCleared { cell: idx(0, 1), remaining: 0 }));
    assert!(events.contains(&GameEvent::AllConditionsReached));
    assert_eq!(game.grid().uncleared_cells(), 0);

    game.tick(0.016);
    assert_eq!(game.result(), LevelResult::AllConditionsReached);
}

#[test]
fn test_win_beats_time_expiry() {
    let level = red_level(&["R R B R R"], 3).with_time_limit(5.0);
    let mut game = GameState::new(level, driven(), 11).unwrap();
    swap(&mut game, idx(0, 2), idx(0, 3));

    game.tick(10.0);
    assert_eq!(game.state(), LevelState::Swapping);
    assert!(game.take_events().contains(&GameEvent::LevelTimeExpired));
    assert_eq!(game.result(), LevelResult::Uncertain);

    finish_animations(&mut game);
    game.tick(0.1);
    assert_eq!(game.result(), LevelResult::AllConditionsReached);
}

#[test]
fn test_no_moves_fails_level_and_stops_clock() {
    let mut game = GameState::new(red_level(&["R G B", "G B R"], 3), GameConfig::default(), 1).unwrap();
    assert!(game.possible_moves().is_empty());
    assert!(game.take_events().contains(&GameEvent::NoMoreMoves));

    // the pending outcome freezes input before the tick resolves it
    assert!(!game.apply_intent(Intent::SelectCell(idx(0, 0))));

    game.tick(500.0);
    assert_eq!(game.result(), LevelResult::NoMoreMoves);
    let events = game.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::LevelFailed { result: LevelResult::NoMoreMoves, .. }
    )));
    assert!(!events.contains(&GameEvent::LevelTimeExpired));
}

#[test]
fn test_timer_signals_fire_once() {
    let level = red_level(&["R R G B", "O P R Y", "G B O P"], 10).with_time_limit(40.0);
    let mut game = GameState::new(level, GameConfig::default(), 2).unwrap();
    game.take_events();

    game.tick(5.0);
    assert!(!game.take_events().contains(&GameEvent::LevelTimeExpiring));
    game.tick(6.0);
    assert!(game.take_events().contains(&GameEvent::LevelTimeExpiring));
    game.tick(6.0);
    assert!(!game.take_events().contains(&GameEvent::LevelTimeExpiring));

    game.tick(100.0);
    assert_eq!(game.result(), LevelResult::TimeExpired);
    assert_eq!(game.timer().remaining(), 0.0);
    assert_eq!(game.timer().time_played(), 40.0);
}

#[test]
fn test_custom_sink_receives_events() {
    let level = red_level(&["R R G B", "O P R Y", "G B O P"], 10);
    let mut game = GameState::with_sink(level, GameConfig::default(), 4, Vec::new()).unwrap();
    assert!(game.sink().contains(&GameEvent::StateChanged {
        from: LevelState::Initializing,
        to: LevelState::Idle,
    }));

    game.sink_mut().clear();
    game.apply_intent(Intent::Pause);
    assert_eq!(game.sink(), &vec![GameEvent::Paused { paused: true }]);
}

#[test]
fn test_same_seed_same_game() {
    let layout = [". . . . .", ". . # . .", ". . . . .", ". . . . ."];
    let play = || {
        let mut game = GameState::new(red_level(&layout, 500), GameConfig::default(), 77).unwrap();
        for _ in 0..5 {
            let Some(&pair) = game.possible_moves().first() else {
                break;
            };
            swap(&mut game, pair.first, pair.second);
            game.tick(0.5);
        }
        (game.snapshot(), game.take_events())
    };
    assert_eq!(play(), play());
}
