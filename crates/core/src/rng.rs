//! RNG module - 7-bag piece randomizer
//!
//! A bag holds one of each piece kind in shuffled order. Pieces are drawn from the
//! front until the bag is empty, then it is refilled and reshuffled. Any window of 7
//! draws starting at a refill boundary therefore contains every kind exactly once.
//!
//! Shuffling uses a small seedable LCG so games are reproducible from a seed.

use crate::types::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // A zero state is a fixed point of the multiplier alone
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // High bits of an LCG are far better distributed than the low bits
        (((self.next_u32() >> 16) as u64 * max as u64) >> 16) as u32
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct Bag {
    /// Current shuffle cycle
    pieces: [PieceKind; 7],
    /// Index of the next piece to draw; 7 means empty
    index: usize,
    rng: SimpleRng,
}

impl Bag {
    /// Create an empty bag; the first draw fills and shuffles it
    pub fn new(seed: u32) -> Self {
        Self {
            pieces: PieceKind::ALL,
            index: PieceKind::ALL.len(),
            rng: SimpleRng::new(seed),
        }
    }

    fn refill(&mut self) {
        self.pieces = PieceKind::ALL;
        self.rng.shuffle(&mut self.pieces);
        self.index = 0;
    }

    /// Remove and return the next piece, refilling first when empty
    pub fn draw(&mut self) -> PieceKind {
        if self.is_empty() {
            self.refill();
        }
        let piece = self.pieces[self.index];
        self.index += 1;
        piece
    }

    /// Peek at the next piece without consuming it
    ///
    /// When the bag is empty this previews the first piece of the next shuffle using a
    /// copy of the RNG, so it always agrees with the following [`Bag::draw`].
    pub fn peek(&self) -> PieceKind {
        if !self.is_empty() {
            return self.pieces[self.index];
        }
        let mut preview_rng = self.rng.clone();
        let mut next = PieceKind::ALL;
        preview_rng.shuffle(&mut next);
        next[0]
    }

    /// Pieces left in the current shuffle cycle
    pub fn remaining(&self) -> &[PieceKind] {
        &self.pieces[self.index..]
    }

    pub fn is_empty(&self) -> bool {
        self.index >= self.pieces.len()
    }

    /// Empty the bag; the RNG keeps its state
    pub fn clear(&mut self) {
        self.index = self.pieces.len();
    }

    /// Current RNG state (restarting from it continues the same sequence)
    pub fn seed(&self) -> u32 {
        self.rng.state()
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::new(1)
    }
}
