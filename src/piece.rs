//! Active falling piece logic

use crate::board::{Board, NUM_COLS, NUM_ROWS};
use crate::tetromino::PieceKind;

/// Column the occupancy grid spawns at (top center)
const SPAWN_X: i32 = 3;
const SPAWN_Y: i32 = 0;

/// An active falling piece.
///
/// `(x, y)` is the board position of the occupancy grid's top-left corner;
/// row 0 is the top of the board. Every committed move is validated against
/// the board first, so an active piece never overlaps a filled cell.
#[derive(Debug, Clone, Copy)]
pub struct Piece {
    pub kind: PieceKind,
    rotation: usize,
    x: i32,
    y: i32,
}

impl Piece {
    /// Create a new piece at spawn position
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: 0,
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// Board cells currently occupied by the piece
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let shape = self.kind.shape(self.rotation);
        let (x, y) = (self.x, self.y);
        shape.iter().enumerate().flat_map(move |(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &cell)| cell != 0)
                .map(move |(c, _)| ((y + r as i32) as usize, (x + c as i32) as usize))
        })
    }

    /// Whether the grid would sit fully in bounds and over empty cells at
    /// (x, y) with the given rotation
    fn fits(&self, board: &Board, x: i32, y: i32, rotation: usize) -> bool {
        let shape = self.kind.shape(rotation);
        for (r, row) in shape.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let (br, bc) = (y + r as i32, x + c as i32);
                if bc < 0 || bc >= NUM_COLS as i32 || br < 0 || br >= NUM_ROWS as i32 {
                    return false;
                }
                if board.cell(br as usize, bc as usize).is_filled() {
                    return false;
                }
            }
        }
        true
    }

    /// Try to move left, returns true if the piece moved
    pub fn move_left(&mut self, board: &Board) -> bool {
        if self.fits(board, self.x - 1, self.y, self.rotation) {
            self.x -= 1;
            true
        } else {
            false
        }
    }

    /// Try to move right, returns true if the piece moved
    pub fn move_right(&mut self, board: &Board) -> bool {
        if self.fits(board, self.x + 1, self.y, self.rotation) {
            self.x += 1;
            true
        } else {
            false
        }
    }

    /// Try to move down one row, returns true if the piece moved
    pub fn move_down(&mut self, board: &Board) -> bool {
        if self.fits(board, self.x, self.y + 1, self.rotation) {
            self.y += 1;
            true
        } else {
            false
        }
    }

    /// True iff moving down one more row would be illegal, i.e. the piece is
    /// resting on the floor or the stack
    pub fn should_lock(&self, board: &Board) -> bool {
        !self.fits(board, self.x, self.y + 1, self.rotation)
    }

    /// Try to rotate in place. The rotated grid either fits and replaces the
    /// active one, or the piece is left unchanged.
    pub fn rotate(&mut self, clockwise: bool, board: &Board) -> bool {
        let count = self.kind.rotation_count();
        let next = if clockwise {
            (self.rotation + 1) % count
        } else {
            (self.rotation + count - 1) % count
        };
        if self.fits(board, self.x, self.y, next) {
            self.rotation = next;
            true
        } else {
            false
        }
    }

    /// Commit the piece's cells into the board. Only valid while resting;
    /// callers check [`Piece::should_lock`] first.
    pub fn lock(&self, board: &mut Board) {
        let state = self.kind.cell_state();
        for (row, col) in self.cells() {
            board.set_cell(row, col, state);
        }
    }

    /// Whether any occupied cell overlaps a filled board cell.
    ///
    /// Used for the spawn-position game-over check, where the piece has not
    /// gone through the normal move legality path yet.
    pub fn overlaps(&self, board: &Board) -> bool {
        self.cells().any(|(row, col)| board.cell(row, col).is_filled())
    }

    /// Number of empty rows strictly below the piece's lowest occupied cell.
    /// Feeds the lock-height-dependent entry delay.
    pub fn height_from_bottom(&self) -> u32 {
        let lowest = self
            .cells()
            .map(|(row, _)| row)
            .max()
            .unwrap_or(NUM_ROWS - 1);
        (NUM_ROWS - 1 - lowest) as u32
    }

    /// Drop straight down to resting position (board edit / test helper)
    pub fn drop_to_bottom(&mut self, board: &Board) {
        while self.move_down(board) {}
    }
}
