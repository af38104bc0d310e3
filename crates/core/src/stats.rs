//! Session statistics folded from engine events

use crate::event::EngineEvent;

/// Running totals for one session
///
/// Feed it every event drained from the engine; it never looks at engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub games: u32,
    pub pieces_locked: u32,
    pub singles: u32,
    pub doubles: u32,
    pub triples: u32,
    pub tetrises: u32,
    pub total_lines: u32,
    pub max_level: u32,
    pub max_combo: u32,
    pub perfect_clears: u32,
    pub t_spin_clears: u32,
    pub back_to_backs: u32,
    /// Largest score awarded by a single clear
    pub best_clear_score: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::PieceLocked { .. } => {
                self.pieces_locked += 1;
            }
            EngineEvent::LinesCleared {
                count,
                combo,
                score,
                ..
            } => {
                match *count {
                    1 => self.singles += 1,
                    2 => self.doubles += 1,
                    3 => self.triples += 1,
                    4 => self.tetrises += 1,
                    _ => {}
                }
                self.total_lines += count;
                self.max_combo = self.max_combo.max(*combo);
                if score.is_perfect_clear() {
                    self.perfect_clears += 1;
                }
                if score.is_t_spin() {
                    self.t_spin_clears += 1;
                }
                if score.is_back_to_back() {
                    self.back_to_backs += 1;
                }
                self.best_clear_score = self.best_clear_score.max(score.total);
            }
            EngineEvent::LevelChanged { level } => {
                self.max_level = self.max_level.max(*level);
            }
            EngineEvent::GameOver => {
                self.games += 1;
            }
            EngineEvent::PieceMoved
            | EngineEvent::NextPieceChanged { .. }
            | EngineEvent::HoldChanged { .. } => {}
        }
    }

    /// Fold a batch, e.g. the result of `take_events`
    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a EngineEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// Lines per piece, 0.0 before the first lock
    pub fn efficiency(&self) -> f64 {
        if self.pieces_locked == 0 {
            return 0.0;
        }
        self.total_lines as f64 / self.pieces_locked as f64
    }
}
