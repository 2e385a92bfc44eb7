//! Snapshot module - plain-data copy of a game for views and tests

use crate::types::{CellIndex, CellPair, Color, Item, LevelResult, LevelState, PassConditionKind, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSnapshot {
    pub clear_count: i32,
    pub item: Option<Item>,
}

/// Read-only copy of everything a view needs to draw a frame
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub rows: usize,
    pub columns: usize,
    /// Row-major
    pub cells: Vec<CellSnapshot>,
    pub state: LevelState,
    pub result: LevelResult,
    pub level_score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub time_remaining: f32,
    pub time_played: f32,
    pub possible_moves: usize,
    pub hint: Option<CellPair>,
    pub selected: Option<CellIndex>,
    pub conditions: Vec<(PassConditionKind, u32)>,
    pub paused: bool,
    pub episode_id: u32,
    pub seed: u32,
}

impl GameSnapshot {
    pub fn cell(&self, idx: CellIndex) -> &CellSnapshot {
        &self.cells[idx.row as usize * self.columns + idx.col as usize]
    }

    pub fn playable(&self) -> bool {
        !self.paused && !self.result.is_finished() && self.state == LevelState::Idle
    }

    /// The grid in layout notation (`R`, `B*`, `2:G|`, `#`, `.`), one string per row
    pub fn layout_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.columns)
            .map(|row| row.iter().map(layout_token).collect::<Vec<_>>().join(" "))
            .collect()
    }
}

fn layout_token(cell: &CellSnapshot) -> String {
    if cell.clear_count < 0 {
        return "#".to_string();
    }
    let body = match cell.item {
        None => ".".to_string(),
        Some(item) => {
            let color = match item.kind.color {
                Color::Red => 'R',
                Color::Orange => 'O',
                Color::Yellow => 'Y',
                Color::Green => 'G',
                Color::Blue => 'B',
                Color::Purple => 'P',
            };
            let mark = match item.kind.tier {
                Tier::Usual => "",
                Tier::Bomb => "*",
                Tier::VerticalBomb => "|",
                Tier::HorizontalBomb => "-",
                Tier::Star => "^",
            };
            format!("{color}{mark}")
        }
    };
    if cell.clear_count > 0 {
        format!("{}:{body}", cell.clear_count)
    } else {
        body
    }
}
