//! Read-only views of the engine for renderers and the network adapter

use crate::pieces::Tetromino;
use crate::types::{PieceKind, Rotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
    /// Board coordinates of the four minos
    pub cells: [(i32, i32); 4],
}

impl From<Tetromino> for ActiveSnapshot {
    fn from(value: Tetromino) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.x,
            y: value.y,
            cells: value.cells(),
        }
    }
}

/// Copy of everything a frame needs
///
/// `board` is row-major, `board[y][x]`, with 0 for empty and [`PieceKind::code`]
/// otherwise. The active piece is not drawn into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub width: u8,
    pub height: u8,
    pub board: Vec<Vec<u8>>,
    pub active: Option<ActiveSnapshot>,
    pub ghost_y: Option<i32>,
    pub next: Option<PieceKind>,
    pub hold: Option<PieceKind>,
    pub can_hold: bool,
    pub game_over: bool,
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub combo: u32,
    pub drop_interval_ms: u32,
}

impl GameSnapshot {
    /// Code at `(x, y)` with the active piece overlaid
    pub fn cell_with_active(&self, x: i32, y: i32) -> u8 {
        if let Some(active) = &self.active {
            if active.cells.contains(&(x, y)) {
                return active.kind.code();
            }
        }
        if x < 0 || y < 0 {
            return 0;
        }
        self.board
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn playable(&self) -> bool {
        !self.game_over && self.active.is_some()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            board: Vec::new(),
            active: None,
            ghost_y: None,
            next: None,
            hold: None,
            can_hold: true,
            game_over: false,
            score: 0,
            level: 1,
            lines: 0,
            combo: 0,
            drop_interval_ms: 0,
        }
    }
}
