//! Tetromino definitions and rotation tables
//!
//! All 7 pieces with NES-style rotations. Each rotation state is a
//! precomputed 4x4 occupancy grid; rotating is a table lookup, not a matrix
//! transform.

use crate::board::CellState;

/// A 4x4 occupancy grid. Nonzero means the cell is part of the piece.
pub type ShapeGrid = [[u8; 4]; 4];

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

const I_SHAPES: [ShapeGrid; 2] = [
    [[1, 1, 1, 1], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0]],
];

const O_SHAPES: [ShapeGrid; 1] = [[[1, 1, 0, 0], [1, 1, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]];

// Index 0 is the spawn orientation (nub down on the NES); indices advance
// clockwise.
const T_SHAPES: [ShapeGrid; 4] = [
    [[1, 1, 1, 0], [0, 1, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[0, 1, 0, 0], [1, 1, 0, 0], [0, 1, 0, 0], [0, 0, 0, 0]],
    [[0, 1, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[1, 0, 0, 0], [1, 1, 0, 0], [1, 0, 0, 0], [0, 0, 0, 0]],
];

const S_SHAPES: [ShapeGrid; 2] = [
    [[0, 1, 1, 0], [1, 1, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[1, 0, 0, 0], [1, 1, 0, 0], [0, 1, 0, 0], [0, 0, 0, 0]],
];

const Z_SHAPES: [ShapeGrid; 2] = [
    [[1, 1, 0, 0], [0, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[0, 1, 0, 0], [1, 1, 0, 0], [1, 0, 0, 0], [0, 0, 0, 0]],
];

const J_SHAPES: [ShapeGrid; 4] = [
    [[1, 1, 1, 0], [0, 0, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[0, 1, 0, 0], [0, 1, 0, 0], [1, 1, 0, 0], [0, 0, 0, 0]],
    [[1, 0, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[1, 1, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0], [0, 0, 0, 0]],
];

const L_SHAPES: [ShapeGrid; 4] = [
    [[1, 1, 1, 0], [1, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[1, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 0, 0, 0]],
    [[0, 0, 1, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
    [[1, 0, 0, 0], [1, 0, 0, 0], [1, 1, 0, 0], [0, 0, 0, 0]],
];

impl PieceKind {
    /// All kinds, in the order the classic randomizer rolls them
    pub fn all() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::O,
            PieceKind::T,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::J,
            PieceKind::L,
        ]
    }

    /// Number of distinct rotation states
    pub fn rotation_count(&self) -> usize {
        match self {
            PieceKind::O => 1,
            PieceKind::I | PieceKind::S | PieceKind::Z => 2,
            PieceKind::T | PieceKind::J | PieceKind::L => 4,
        }
    }

    /// Occupancy grid for the given rotation state
    pub fn shape(&self, rotation: usize) -> &'static ShapeGrid {
        let shapes: &'static [ShapeGrid] = match self {
            PieceKind::I => &I_SHAPES,
            PieceKind::O => &O_SHAPES,
            PieceKind::T => &T_SHAPES,
            PieceKind::S => &S_SHAPES,
            PieceKind::Z => &Z_SHAPES,
            PieceKind::J => &J_SHAPES,
            PieceKind::L => &L_SHAPES,
        };
        &shapes[rotation % shapes.len()]
    }

    /// Color class stamped into the board when this piece locks.
    ///
    /// The NES palette groups pieces into three classes per level: T/O/I take
    /// the base color, L/S the second, J/Z the third.
    pub fn cell_state(&self) -> CellState {
        match self {
            PieceKind::T | PieceKind::O | PieceKind::I => CellState::Color1,
            PieceKind::L | PieceKind::S => CellState::Color2,
            PieceKind::J | PieceKind::Z => CellState::Color3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::J => "J",
            PieceKind::L => "L",
        }
    }
}
