//! Shared types and constants for the Mintris engine
//!
//! This crate defines the vocabulary used by every other crate in the workspace:
//! piece kinds, rotation states, player actions, and the rule constants that drive
//! board geometry, gravity, and scoring. It has no dependencies, so renderers and
//! network adapters can depend on it without pulling in the engine.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns by default (indexed 0-9, left to right)
//! - **Height**: 20 rows by default (indexed 0-19, top to bottom)
//! - Boards may be configured between [`MIN_BOARD_DIM`] and [`MAX_BOARD_DIM`] cells per side
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Host tick resolution, also the gravity floor |
//! | `BASE_DROP_MS` | 1000 | Gravity interval at level 1 |
//! | `DROP_SPEEDUP` | 0.8 | Per-level interval factor |
//! | `SPAWN_GRACE_MS` | 250 | Window after a spawn during which a blocked drop does not lock |
//!
//! # Examples
//!
//! ```
//! use mintris_types::{GameAction, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! assert_eq!(PieceKind::from_str("t"), Some(PieceKind::T));
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(GameAction::from_str("hardDrop"), Some(GameAction::HardDrop));
//! assert_eq!((BOARD_WIDTH, BOARD_HEIGHT), (10, 20));
//! ```

/// Default board width in cells
pub const BOARD_WIDTH: u8 = 10;

/// Default board height in cells
pub const BOARD_HEIGHT: u8 = 20;

/// Smallest accepted board side (the I piece needs four columns to rotate)
pub const MIN_BOARD_DIM: u8 = 4;

/// Largest accepted board side
pub const MAX_BOARD_DIM: u8 = 40;

/// Host tick interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Gravity interval at level 1
pub const BASE_DROP_MS: u32 = 1000;

/// Each level multiplies the gravity interval by this factor
pub const DROP_SPEEDUP: f64 = 0.8;

/// Spawn protection window in milliseconds
pub const SPAWN_GRACE_MS: u32 = 250;

/// Lines needed per level
pub const LINES_PER_LEVEL: u32 = 10;

/// Lowest level
pub const MIN_LEVEL: u32 = 1;

/// Highest level a game may be started at
pub const MAX_START_LEVEL: u32 = 20;

/// Base line-clear points indexed by lines cleared (0-4)
///
/// A four-line clear (a "Tetris") is worth 1200 before multipliers.
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

/// Points per row for a player-initiated soft drop
pub const SOFT_DROP_POINTS: u32 = 1;

/// Points per row fallen during a hard drop
pub const HARD_DROP_POINTS_PER_CELL: u32 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_constants() {
        assert_eq!(SPAWN_GRACE_MS, 250);
        assert_eq!(BASE_DROP_MS, 1000);
        assert_eq!(LINE_SCORES, [0, 40, 100, 300, 1200]);
        assert_eq!(LINES_PER_LEVEL, 10);
        assert!(MIN_BOARD_DIM <= BOARD_WIDTH && BOARD_HEIGHT <= MAX_BOARD_DIM);
    }

    #[test]
    fn rotation_index_wraps() {
        assert_eq!(Rotation::from_index(4), Rotation::North);
        assert_eq!(Rotation::from_index(7), Rotation::West);
        for r in Rotation::ALL {
            assert_eq!(Rotation::from_index(r.index()), r);
        }
    }

    #[test]
    fn action_names_round_trip() {
        for action in GameAction::ALL {
            assert_eq!(GameAction::from_str(action.as_str()), Some(action));
        }
    }
}

/// The seven tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    /// Every kind, in declaration order (the order a fresh bag is filled in)
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use mintris_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("Z"), Some(PieceKind::Z));
    /// assert_eq!(PieceKind::from_str("x"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            "o" => Some(PieceKind::O),
            "s" => Some(PieceKind::S),
            "t" => Some(PieceKind::T),
            "z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::J => "j",
            PieceKind::L => "l",
            PieceKind::O => "o",
            PieceKind::S => "s",
            PieceKind::T => "t",
            PieceKind::Z => "z",
        }
    }

    /// Stable 1-based code used by snapshot grids (0 means empty)
    pub fn code(&self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::J => 2,
            PieceKind::L => 3,
            PieceKind::O => 4,
            PieceKind::S => 5,
            PieceKind::T => 6,
            PieceKind::Z => 7,
        }
    }
}

/// Rotation state, equivalent to a rotation index 0..3
///
/// - **North**: spawn orientation (index 0)
/// - **East**: 90° clockwise (index 1)
/// - **South**: 180° (index 2)
/// - **West**: 270° clockwise (index 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::North,
        Rotation::East,
        Rotation::South,
        Rotation::West,
    ];

    /// Rotation index (0..3)
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Build from any index; values wrap modulo 4
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Rotate clockwise: `(index + 1) % 4`
    ///
    /// ```
    /// use mintris_types::Rotation;
    ///
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate counter-clockwise: `(index + 3) % 4`
    ///
    /// ```
    /// use mintris_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_ccw(), Rotation::West);
    /// ```
    pub fn rotate_ccw(&self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::North => "north",
            Rotation::East => "east",
            Rotation::South => "south",
            Rotation::West => "west",
        }
    }
}

/// Player or collaborator actions that mutate the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Move piece one column left
    MoveLeft,
    /// Move piece one column right
    MoveRight,
    /// Move piece one row down, awarding soft drop points
    SoftDrop,
    /// Drop piece to its landing row and lock it
    HardDrop,
    /// Rotate clockwise with wall kicks
    Rotate,
    /// Swap with the hold slot (once per lock)
    Hold,
    /// Start a fresh game at the configured starting level
    Restart,
}

impl GameAction {
    pub const ALL: [GameAction; 7] = [
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::SoftDrop,
        GameAction::HardDrop,
        GameAction::Rotate,
        GameAction::Hold,
        GameAction::Restart,
    ];

    /// Parse action from its wire name (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use mintris_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("ROTATE"), Some(GameAction::Rotate));
    /// assert_eq!(GameAction::from_str("pause"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "softdrop" => Some(GameAction::SoftDrop),
            "harddrop" => Some(GameAction::HardDrop),
            "rotate" => Some(GameAction::Rotate),
            "hold" => Some(GameAction::Hold),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    /// camelCase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::SoftDrop => "softDrop",
            GameAction::HardDrop => "hardDrop",
            GameAction::Rotate => "rotate",
            GameAction::Hold => "hold",
            GameAction::Restart => "restart",
        }
    }
}

/// A board cell: `None` is empty, `Some(kind)` was locked by a piece of that kind
pub type Cell = Option<PieceKind>;
