//! Pieces module - tetromino shapes, rotation tables, and wall kicks
//!
//! Every `(PieceKind, Rotation)` pair maps to four mino offsets inside the kind's
//! bounding box. All four rotation states are precomputed, so rotating a piece only
//! changes its rotation index.
//!
//! Bounding boxes: I is 4×4, O is 4 wide by 3 tall, every other kind is 3×3.

use crate::types::{PieceKind, Rotation};

/// Offset of a single mino relative to the piece's top-left corner
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from the piece origin
pub type PieceShape = [MinoOffset; 4];

/// Translations tried, in order, when a clockwise rotation collides
///
/// Left 1, right 1, left 2, right 2 (for the I piece), then up 1 (floor kick).
pub const ROTATION_KICKS: [(i32, i32); 5] = [(-1, 0), (1, 0), (-2, 0), (2, 0), (0, -1)];

/// Get the shape (mino offsets) for a piece kind and rotation
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    match kind {
        PieceKind::I => get_i_shape(rotation),
        PieceKind::O => get_o_shape(rotation),
        PieceKind::T => get_t_shape(rotation),
        PieceKind::S => get_s_shape(rotation),
        PieceKind::Z => get_z_shape(rotation),
        PieceKind::J => get_j_shape(rotation),
        PieceKind::L => get_l_shape(rotation),
    }
}

/// Bounding box `(width, height)` of a piece kind
///
/// The box is the same for every rotation of a kind.
pub fn bounding_box(kind: PieceKind) -> (u8, u8) {
    match kind {
        PieceKind::I => (4, 4),
        PieceKind::O => (4, 3),
        _ => (3, 3),
    }
}

fn get_i_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        // horizontal on row 1
        Rotation::North => [(0, 1), (1, 1), (2, 1), (3, 1)],
        // vertical in column 2
        Rotation::East => [(2, 0), (2, 1), (2, 2), (2, 3)],
        // horizontal on row 2
        Rotation::South => [(0, 2), (1, 2), (2, 2), (3, 2)],
        // vertical in column 1
        Rotation::West => [(1, 0), (1, 1), (1, 2), (1, 3)],
    }
}

fn get_o_shape(_rotation: Rotation) -> PieceShape {
    [(1, 0), (2, 0), (1, 1), (2, 1)]
}

fn get_t_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(1, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (1, 1), (2, 1), (1, 2)],
        Rotation::South => [(0, 1), (1, 1), (2, 1), (1, 2)],
        Rotation::West => [(1, 0), (0, 1), (1, 1), (1, 2)],
    }
}

fn get_s_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(1, 0), (2, 0), (0, 1), (1, 1)],
        Rotation::East => [(1, 0), (1, 1), (2, 1), (2, 2)],
        Rotation::South => [(1, 1), (2, 1), (0, 2), (1, 2)],
        Rotation::West => [(0, 0), (0, 1), (1, 1), (1, 2)],
    }
}

fn get_z_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 0), (1, 0), (1, 1), (2, 1)],
        Rotation::East => [(2, 0), (1, 1), (2, 1), (1, 2)],
        Rotation::South => [(0, 1), (1, 1), (1, 2), (2, 2)],
        Rotation::West => [(1, 0), (0, 1), (1, 1), (0, 2)],
    }
}

fn get_j_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (2, 0), (1, 1), (1, 2)],
        Rotation::South => [(0, 1), (1, 1), (2, 1), (2, 2)],
        Rotation::West => [(1, 0), (1, 1), (0, 2), (1, 2)],
    }
}

fn get_l_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(2, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (1, 1), (1, 2), (2, 2)],
        Rotation::South => [(0, 1), (1, 1), (2, 1), (0, 2)],
        Rotation::West => [(0, 0), (1, 0), (1, 1), (1, 2)],
    }
}

/// A positioned tetromino
///
/// `x`/`y` locate the top-left corner of the bounding box in board coordinates.
/// `y` may be negative after a floor kick near the top of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
}

impl Tetromino {
    /// New piece in spawn rotation at the origin
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x: 0,
            y: 0,
        }
    }

    /// Bounding box width of the current rotation
    pub fn width(&self) -> i32 {
        bounding_box(self.kind).0 as i32
    }

    /// Bounding box height of the current rotation
    pub fn height(&self) -> i32 {
        bounding_box(self.kind).1 as i32
    }

    /// Mino offsets for the current rotation
    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Whether the local cell `(lx, ly)` is part of the piece; out-of-box is `false`
    pub fn occupies_cell(&self, lx: i32, ly: i32) -> bool {
        self.shape()
            .iter()
            .any(|&(mx, my)| mx as i32 == lx && my as i32 == ly)
    }

    pub fn rotate_cw(&mut self) {
        self.rotation = self.rotation.rotate_cw();
    }

    pub fn rotate_ccw(&mut self) {
        self.rotation = self.rotation.rotate_ccw();
    }

    /// Board coordinates of the four minos
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.cells_at(0, 0)
    }

    /// Board coordinates of the four minos after translating by `(dx, dy)`
    pub fn cells_at(&self, dx: i32, dy: i32) -> [(i32, i32); 4] {
        self.shape()
            .map(|(mx, my)| (self.x + dx + mx as i32, self.y + dy + my as i32))
    }

    /// Lowest occupied local row + 1
    ///
    /// A piece resting on the floor has `y == board_height - bottom_extent()`.
    pub fn bottom_extent(&self) -> i32 {
        self.shape()
            .iter()
            .map(|&(_, my)| my as i32 + 1)
            .max()
            .unwrap_or(0)
    }

    /// Place the piece at the horizontal center of a board of `board_width`, on row 0
    pub fn centered(mut self, board_width: i32) -> Self {
        self.x = (board_width - self.width()) / 2;
        self.y = 0;
        self
    }
}

/// Rotate clockwise, kicking if the plain rotation does not fit
///
/// `is_free` receives the candidate piece and reports whether it fits. Returns the
/// rotated (and possibly shifted) piece, or `None` when neither the plain rotation
/// nor any entry of [`ROTATION_KICKS`] fits; the caller then keeps the original.
pub fn try_rotate(
    piece: &Tetromino,
    mut is_free: impl FnMut(&Tetromino) -> bool,
) -> Option<Tetromino> {
    let mut rotated = *piece;
    rotated.rotate_cw();

    if is_free(&rotated) {
        return Some(rotated);
    }

    ROTATION_KICKS.iter().find_map(|&(dx, dy)| {
        let kicked = Tetromino {
            x: rotated.x + dx,
            y: rotated.y + dy,
            ..rotated
        };
        is_free(&kicked).then_some(kicked)
    })
}
