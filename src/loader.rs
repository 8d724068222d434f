//! Board loading collaborators
//!
//! A loader puts the shared board into its starting layout once per session.
//! The trainer ships an empty start and a garbage preset for burn practice.

use crate::board::{Board, CellState, NUM_COLS, NUM_ROWS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Resets the board to a starting layout at session start.
pub trait BoardLoader {
    fn reset_board(&mut self, board: &mut Board);
}

/// Plain empty board
pub struct EmptyLoader;

impl BoardLoader for EmptyLoader {
    fn reset_board(&mut self, board: &mut Board) {
        board.clear();
    }
}

/// Training preset: the bottom N rows are filled with garbage, one hole per
/// row so every row can be cleared with a well.
pub struct GarbageLoader {
    rows: usize,
    rng: StdRng,
}

impl GarbageLoader {
    pub fn new(rows: usize) -> Self {
        Self::with_seed(rows, rand::random())
    }

    pub fn with_seed(rows: usize, seed: u64) -> Self {
        Self {
            // Leave room for the piece to spawn and maneuver
            rows: rows.min(NUM_ROWS - 6),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl BoardLoader for GarbageLoader {
    fn reset_board(&mut self, board: &mut Board) {
        board.clear();
        let colors = [CellState::Color1, CellState::Color2, CellState::Color3];
        for row in (NUM_ROWS - self.rows)..NUM_ROWS {
            let hole = self.rng.gen_range(0..NUM_COLS);
            for col in 0..NUM_COLS {
                if col != hole {
                    board.set_cell(row, col, colors[self.rng.gen_range(0..colors.len())]);
                }
            }
        }
    }
}
