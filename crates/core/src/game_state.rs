//! Game state module - the board engine state machine
//!
//! `GameState` owns the grid, the 7-bag, and the current, next, and held pieces, and
//! runs every transition of a game:
//!
//! ```text
//! Idle -> Falling <-> (HardDropping) -> Locking -> line clear -> Falling
//!                                                      \-> GameOver (spawn overlaps)
//! ```
//!
//! Every operation is synchronous and runs to completion. The engine keeps no
//! wall-clock time of its own: the host advances a logical clock through
//! [`GameState::tick`] (or [`GameState::advance_clock`]) and the spawn grace period is
//! measured on that clock.

use std::mem;

use log::{debug, info};

use crate::board::{Board, ClearedRows};
use crate::config::GameConfig;
use crate::event::EngineEvent;
use crate::pieces::{try_rotate, Tetromino};
use crate::rng::Bag;
use crate::scoring::{
    calculate_score, clamp_start_level, drop_interval_ms, drop_score, level_for_lines, ScoreInput,
};
use crate::snapshot::{ActiveSnapshot, GameSnapshot};
use crate::types::{GameAction, PieceKind};

/// Where the engine is in its lifecycle
///
/// `HardDropping` and `Locking` are held only while the corresponding call runs;
/// seeing one of them on entry means the call overlaps another and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not started, or reset and waiting for `start_game`
    Idle,
    /// A piece is active and accepts input
    Falling,
    HardDropping,
    Locking,
    /// Terminal until `reset` or `start_game`
    GameOver,
}

/// The board engine
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    bag: Bag,
    current: Option<Tetromino>,
    next: Option<Tetromino>,
    /// Stashed piece, rotation kept
    hold: Option<Tetromino>,
    can_hold: bool,
    phase: Phase,
    score: u64,
    level: u32,
    starting_level: u32,
    lines: u32,
    combo: u32,
    last_clear_was_tetris: bool,
    last_clear_was_perfect: bool,
    drop_interval_ms: u32,
    /// Logical time in milliseconds, advanced by the host
    clock_ms: u64,
    spawn_time_ms: u64,
    gravity_timer_ms: u32,
    events: Vec<EngineEvent>,
}

impl GameState {
    /// Create an idle engine; call [`GameState::start_game`] to spawn the first piece
    pub fn new(config: GameConfig) -> Self {
        let starting_level = clamp_start_level(config.starting_level);
        Self {
            board: Board::new(config.width, config.height),
            bag: Bag::new(config.seed),
            config,
            current: None,
            next: None,
            hold: None,
            can_hold: true,
            phase: Phase::Idle,
            score: 0,
            level: starting_level,
            starting_level,
            lines: 0,
            combo: 0,
            last_clear_was_tetris: false,
            last_clear_was_perfect: false,
            drop_interval_ms: drop_interval_ms(starting_level),
            clock_ms: 0,
            spawn_time_ms: 0,
            gravity_timer_ms: 0,
            events: Vec::new(),
        }
    }

    /// Reset and spawn the first piece
    pub fn start_game(&mut self) {
        self.reset();
        self.prepare_next();
        self.spawn_piece();
        info!(
            "game started at level {} on a {}x{} board",
            self.level,
            self.board.width(),
            self.board.height()
        );
    }

    /// Clear the board and all counters; the starting level is kept
    ///
    /// The engine is left idle with no current or next piece. Undrained events stay
    /// queued.
    pub fn reset(&mut self) {
        self.board.clear();
        self.score = 0;
        self.level = self.starting_level;
        self.lines = 0;
        self.drop_interval_ms = drop_interval_ms(self.level);
        self.combo = 0;
        self.last_clear_was_tetris = false;
        self.last_clear_was_perfect = false;
        self.hold = None;
        self.can_hold = true;
        self.bag.clear();
        self.current = None;
        self.next = None;
        self.gravity_timer_ms = 0;
        self.phase = Phase::Idle;
    }

    /// Set the level (clamped to 1..=20); it also becomes the starting level
    pub fn update_level(&mut self, level: u32) {
        self.level = clamp_start_level(level);
        self.starting_level = self.level;
        self.drop_interval_ms = drop_interval_ms(self.level);
        debug!(
            "level set to {}, drop interval {}ms",
            self.level, self.drop_interval_ms
        );
    }

    /// Draw a new next piece from the bag
    fn prepare_next(&mut self) {
        let kind = self.bag.draw();
        self.next = Some(Tetromino::new(kind));
        self.events.push(EngineEvent::NextPieceChanged { kind });
    }

    /// Promote the next piece to current and draw a new next piece
    ///
    /// The new piece is centered on row 0. If it overlaps the stack the game is over.
    /// Returns whether a playable piece was spawned.
    pub fn spawn_piece(&mut self) -> bool {
        if self.phase == Phase::GameOver {
            return false;
        }
        if self.next.is_none() {
            self.prepare_next();
        }
        let Some(next) = self.next.take() else {
            return false;
        };
        self.prepare_next();

        let piece = next.centered(self.board.width() as i32);
        self.spawn_time_ms = self.clock_ms;
        self.gravity_timer_ms = 0;

        if !self.fits(&piece) {
            self.current = None;
            self.phase = Phase::GameOver;
            self.events.push(EngineEvent::GameOver);
            info!(
                "game over: {:?} blocked at spawn, score {} lines {} level {}",
                piece.kind, self.score, self.lines, self.level
            );
            return false;
        }

        debug!("spawned {:?} at ({}, {})", piece.kind, piece.x, piece.y);
        self.current = Some(piece);
        self.phase = Phase::Falling;
        true
    }

    /// Whether `piece` lies inside the walls, above the floor, and off locked cells
    fn fits(&self, piece: &Tetromino) -> bool {
        piece
            .cells()
            .iter()
            .all(|&(x, y)| !self.board.blocks_movement(x, y))
    }

    /// Whether the current piece could be translated by `(dx, dy)`
    pub fn can_move(&self, dx: i32, dy: i32) -> bool {
        let Some(piece) = self.current else {
            return false;
        };
        piece
            .cells_at(dx, dy)
            .iter()
            .all(|&(x, y)| !self.board.blocks_movement(x, y))
    }

    fn shift(&mut self, dx: i32, dy: i32) -> bool {
        if self.phase != Phase::Falling || !self.can_move(dx, dy) {
            return false;
        }
        if let Some(piece) = self.current.as_mut() {
            piece.x += dx;
            piece.y += dy;
            self.events.push(EngineEvent::PieceMoved);
            return true;
        }
        false
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(-1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1, 0)
    }

    /// Gravity step: move down one row without scoring, locking when blocked
    pub fn move_down(&mut self) -> bool {
        self.step_down(false)
    }

    /// Player soft drop: like [`GameState::move_down`] but worth one point per row
    pub fn soft_drop(&mut self) -> bool {
        self.step_down(true)
    }

    fn step_down(&mut self, player: bool) -> bool {
        if self.phase != Phase::Falling {
            return false;
        }
        if self.shift(0, 1) {
            if player {
                self.score += drop_score(1, false) as u64;
            }
            return true;
        }
        if self.in_spawn_grace() {
            debug!(
                "drop blocked {}ms after spawn, lock deferred",
                self.clock_ms - self.spawn_time_ms
            );
            return false;
        }
        self.lock_piece();
        false
    }

    fn in_spawn_grace(&self) -> bool {
        self.clock_ms.saturating_sub(self.spawn_time_ms) < self.config.spawn_grace_ms as u64
    }

    /// Rows the current piece can still fall
    fn drop_distance(&self) -> i32 {
        let mut distance = 0;
        while self.can_move(0, distance + 1) {
            distance += 1;
        }
        distance
    }

    /// Drop the current piece to its landing row and lock it
    ///
    /// Awards two points per row fallen. Rejected inside the spawn grace period and
    /// while another drop or lock is in progress.
    pub fn hard_drop(&mut self) -> bool {
        match self.phase {
            Phase::Falling => {}
            Phase::HardDropping | Phase::Locking => {
                debug!("hard drop rejected: {:?} in progress", self.phase);
                return false;
            }
            Phase::Idle | Phase::GameOver => return false,
        }
        if self.in_spawn_grace() {
            debug!(
                "hard drop rejected {}ms after spawn",
                self.clock_ms - self.spawn_time_ms
            );
            return false;
        }

        self.phase = Phase::HardDropping;
        let distance = self.drop_distance();
        if let Some(piece) = self.current.as_mut() {
            if distance > 0 {
                piece.y += distance;
                self.events.push(EngineEvent::PieceMoved);
            }
        }
        self.score += drop_score(distance as u32, true) as u64;
        debug!("hard drop fell {} rows", distance);

        self.lock_piece();
        true
    }

    /// Rotate clockwise, trying the wall and floor kicks when the plain rotation collides
    ///
    /// When nothing fits the piece keeps its original rotation and position.
    pub fn rotate(&mut self) -> bool {
        if self.phase != Phase::Falling {
            return false;
        }
        let Some(piece) = self.current else {
            return false;
        };
        match try_rotate(&piece, |candidate| self.fits(candidate)) {
            Some(rotated) => {
                self.current = Some(rotated);
                self.events.push(EngineEvent::PieceMoved);
                true
            }
            None => false,
        }
    }

    /// Swap the current piece with the hold slot, once per lock
    ///
    /// With an empty slot the current piece is stashed and the next piece spawns.
    /// Otherwise the held piece comes back centered on the top row in the rotation it
    /// was stashed with; if it would overlap the stack there the hold is refused.
    pub fn hold_piece(&mut self) -> bool {
        if self.phase != Phase::Falling || !self.can_hold {
            return false;
        }
        let Some(piece) = self.current else {
            return false;
        };

        match self.hold {
            None => {
                self.hold = Some(piece);
                self.current = None;
                self.events.push(EngineEvent::HoldChanged { kind: piece.kind });
                self.spawn_piece();
            }
            Some(held) => {
                let swapped = held.centered(self.board.width() as i32);
                if !self.fits(&swapped) {
                    debug!("hold refused: {:?} does not fit at spawn", held.kind);
                    return false;
                }
                self.hold = Some(piece);
                self.current = Some(swapped);
                self.spawn_time_ms = self.clock_ms;
                self.gravity_timer_ms = 0;
                self.events.push(EngineEvent::HoldChanged { kind: piece.kind });
                self.events.push(EngineEvent::PieceMoved);
            }
        }
        self.can_hold = false;
        true
    }

    /// Write the current piece into the grid, clear lines, score, and spawn the next piece
    fn lock_piece(&mut self) {
        if self.phase == Phase::Locking {
            debug!("lock rejected: already locking");
            return;
        }
        let Some(piece) = self.current.take() else {
            return;
        };
        self.phase = Phase::Locking;

        // Minos above row 0 are dropped by the board
        self.board.lock_cells(&piece.cells(), piece.kind);
        self.events.push(EngineEvent::PieceLocked {
            kind: piece.kind,
            rotation: piece.rotation,
            x: piece.x,
            y: piece.y,
        });

        let t_spin = self.is_t_spin(&piece);
        let rows = self.board.clear_full_rows();
        self.resolve_clear(rows, t_spin);

        self.spawn_piece();
        self.can_hold = true;
    }

    /// T piece with at least three occupied cells diagonal to its center
    fn is_t_spin(&self, piece: &Tetromino) -> bool {
        if piece.kind != PieceKind::T {
            return false;
        }
        let (cx, cy) = (piece.x + 1, piece.y + 1);
        let occupied = [(-1, -1), (1, -1), (-1, 1), (1, 1)]
            .iter()
            .filter(|&&(dx, dy)| self.board.is_occupied(cx + dx, cy + dy))
            .count();
        occupied >= 3
    }

    fn resolve_clear(&mut self, rows: ClearedRows, t_spin: bool) {
        let count = rows.len() as u32;
        if count == 0 {
            self.combo = 0;
            return;
        }
        self.combo += 1;

        let board_empty = self.board.is_empty();
        let result = calculate_score(ScoreInput {
            lines_cleared: count,
            level: self.level,
            combo: self.combo,
            last_clear_was_tetris: self.last_clear_was_tetris,
            board_empty_after: board_empty,
            pieces_pending: self.current.is_some() || self.next.is_some(),
            t_spin,
        });

        self.score += result.total;
        self.last_clear_was_tetris = count == 4;
        self.last_clear_was_perfect = board_empty;
        self.lines += count;

        info!(
            "cleared {} rows {:?}: +{} (combo {}, level {})",
            count,
            rows.as_slice(),
            result.total,
            self.combo,
            self.level
        );
        self.events.push(EngineEvent::LinesCleared {
            count,
            rows,
            combo: self.combo,
            score: result,
        });

        let level = level_for_lines(self.lines, self.starting_level);
        if level != self.level {
            self.level = level;
            self.events.push(EngineEvent::LevelChanged { level });
        }
        self.drop_interval_ms = drop_interval_ms(self.level);
    }

    /// Advance the logical clock without applying gravity
    pub fn advance_clock(&mut self, elapsed_ms: u32) {
        self.clock_ms += elapsed_ms as u64;
    }

    /// Advance the clock and apply gravity once per drop interval
    ///
    /// Returns true when a gravity step ran.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        self.advance_clock(elapsed_ms);
        if self.phase != Phase::Falling {
            return false;
        }
        self.gravity_timer_ms = self.gravity_timer_ms.saturating_add(elapsed_ms);
        if self.gravity_timer_ms < self.drop_interval_ms {
            return false;
        }
        self.gravity_timer_ms = 0;
        self.update();
        true
    }

    /// One gravity step, as the host's game loop would trigger it
    pub fn update(&mut self) -> bool {
        if self.phase == Phase::GameOver {
            return false;
        }
        self.move_down()
    }

    /// Apply an action from an input layer or the network adapter
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft => self.move_left(),
            GameAction::MoveRight => self.move_right(),
            GameAction::SoftDrop => self.soft_drop(),
            GameAction::HardDrop => self.hard_drop(),
            GameAction::Rotate => self.rotate(),
            GameAction::Hold => self.hold_piece(),
            GameAction::Restart => {
                self.start_game();
                true
            }
        }
    }

    /// Row the current piece would occupy after a hard drop
    pub fn ghost_y(&self) -> Option<i32> {
        let piece = self.current?;
        let landing = piece.y + self.drop_distance();
        Some(landing.min(self.board.height() as i32 - 1))
    }

    /// Take every event queued since the last call
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.events)
    }

    /// Events queued since the last [`GameState::take_events`]
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn current_piece(&self) -> Option<Tetromino> {
        self.current
    }

    pub fn next_piece(&self) -> Option<Tetromino> {
        self.next
    }

    pub fn held_piece(&self) -> Option<PieceKind> {
        self.hold.map(|piece| piece.kind)
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.board.is_occupied(x, y)
    }

    pub fn is_line_full(&self, y: i32) -> bool {
        self.board.is_row_full(y)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Direct grid access for puzzle setups and test harnesses
    ///
    /// Nothing is re-validated: cells written under the current piece overlap it
    /// until it moves or locks.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn starting_level(&self) -> u32 {
        self.starting_level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn last_clear_was_tetris(&self) -> bool {
        self.last_clear_was_tetris
    }

    pub fn last_clear_was_perfect(&self) -> bool {
        self.last_clear_was_perfect
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn drop_interval_ms(&self) -> u32 {
        self.drop_interval_ms
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fill `out` with the current state, reusing its allocations
    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.board.write_u8_grid(&mut out.board);
        out.width = self.board.width() as u8;
        out.height = self.board.height() as u8;
        out.active = self.current.map(ActiveSnapshot::from);
        out.ghost_y = self.ghost_y();
        out.next = self.next.map(|p| p.kind);
        out.hold = self.held_piece();
        out.can_hold = self.can_hold;
        out.score = self.score;
        out.level = self.level;
        out.lines = self.lines;
        out.combo = self.combo;
        out.game_over = self.is_game_over();
        out.drop_interval_ms = self.drop_interval_ms;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
