//! Engine events
//!
//! Every mutating call pushes the events it causes onto the engine's queue, in the
//! order they happen. Collaborators (renderer, audio, haptics, stats, the network
//! adapter) drain the queue after each call with
//! [`GameState::take_events`](crate::GameState::take_events).

use crate::board::ClearedRows;
use crate::scoring::ScoreResult;
use crate::types::{PieceKind, Rotation};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The active piece changed position or rotation
    PieceMoved,
    /// The active piece was written into the grid at this position
    PieceLocked {
        kind: PieceKind,
        rotation: Rotation,
        x: i32,
        y: i32,
    },
    /// Rows were removed; `rows` are bottom to top, numbered before the shift
    LinesCleared {
        count: u32,
        rows: ClearedRows,
        /// Combo counter including this clear
        combo: u32,
        score: ScoreResult,
    },
    /// A new piece entered the next slot
    NextPieceChanged { kind: PieceKind },
    /// The hold slot now contains `kind`
    HoldChanged { kind: PieceKind },
    /// The level went up after a clear
    LevelChanged { level: u32 },
    /// A freshly spawned piece overlapped the stack
    GameOver,
}

impl EngineEvent {
    /// Short lowercase tag, used in logs and on the wire
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::PieceMoved => "piece_moved",
            EngineEvent::PieceLocked { .. } => "piece_locked",
            EngineEvent::LinesCleared { .. } => "lines_cleared",
            EngineEvent::NextPieceChanged { .. } => "next_piece_changed",
            EngineEvent::HoldChanged { .. } => "hold_changed",
            EngineEvent::LevelChanged { .. } => "level_changed",
            EngineEvent::GameOver => "game_over",
        }
    }
}
