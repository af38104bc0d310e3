//! Board module - the grid of locked cells
//!
//! The board is the source of truth for locked blocks. Cells are stored in a flat
//! row-major vector. Coordinates are `(x, y)` with x growing to the right and y growing
//! downward; row 0 is the top visible row. Rows above the board (`y < 0`) exist only
//! for falling pieces and are never stored.

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH, MAX_BOARD_DIM, MIN_BOARD_DIM};

/// Row indices removed by one clear, bottom to top, numbered before the shift
pub type ClearedRows = ArrayVec<u8, { MAX_BOARD_DIM as usize }>;

/// The game board
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    width: usize,
    height: usize,
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board; each side is clamped to `MIN_BOARD_DIM..=MAX_BOARD_DIM`
    pub fn new(width: u8, height: u8) -> Self {
        let width = width.clamp(MIN_BOARD_DIM, MAX_BOARD_DIM) as usize;
        let height = height.clamp(MIN_BOARD_DIM, MAX_BOARD_DIM) as usize;
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get cell at `(x, y)`; `None` when out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at `(x, y)`; returns false when out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Whether a locked block occupies `(x, y)`; out-of-bounds cells are unoccupied
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Whether a falling mino may not enter `(x, y)`
    ///
    /// Side walls and rows at or below the floor block. Rows above the board never
    /// block; inside the board only locked cells do.
    pub fn blocks_movement(&self, x: i32, y: i32) -> bool {
        if x < 0 || x as usize >= self.width || y >= self.height as i32 {
            return true;
        }
        y >= 0 && self.is_occupied(x, y)
    }

    /// Whether every cell of row `y` is occupied; out-of-range rows are not full
    pub fn is_row_full(&self, y: i32) -> bool {
        if y < 0 || y as usize >= self.height {
            return false;
        }
        self.row(y as usize).iter().all(Option::is_some)
    }

    fn row(&self, y: usize) -> &[Cell] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    /// Remove every full row at once and drop the rows above
    ///
    /// Rows above a cleared row move down by the number of cleared rows beneath them;
    /// the vacated rows at the top become empty. Returns the cleared row indices,
    /// bottom to top.
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared = ClearedRows::new();
        let width = self.width;
        let mut write_y = self.height;

        for read_y in (0..self.height).rev() {
            if self.is_row_full(read_y as i32) {
                cleared.push(read_y as u8);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src = read_y * width;
                    self.cells.copy_within(src..src + width, write_y * width);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared
    }

    /// Write minos into the grid, skipping any outside the board
    pub fn lock_cells(&mut self, cells: &[(i32, i32)], kind: PieceKind) {
        for &(x, y) in cells {
            self.set(x, y, Some(kind));
        }
    }

    /// True when no cell is occupied
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Copy the board into a `u8` grid (0 empty, otherwise [`PieceKind::code`])
    ///
    /// The grid is resized to the board dimensions.
    pub fn write_u8_grid(&self, out: &mut Vec<Vec<u8>>) {
        out.resize_with(self.height, Vec::new);
        for (y, row) in out.iter_mut().enumerate() {
            row.clear();
            row.extend(self.row(y).iter().map(|c| c.map_or(0, |k| k.code())));
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}
