//! Game board representation and row clearing

/// Board dimensions (NES playfield)
pub const NUM_ROWS: usize = 20;
pub const NUM_COLS: usize = 10;

/// State of a single board cell.
///
/// The NES palette has three piece colors per level; a cell remembers its
/// color class, not which piece produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Empty,
    Color1,
    Color2,
    Color3,
}

impl CellState {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellState::Empty)
    }

    pub fn is_filled(&self) -> bool {
        !self.is_empty()
    }
}

/// The game board.
///
/// Grid stored as [row][col], row 0 is the top, rows increase downward.
#[derive(Debug, Clone)]
pub struct Board {
    cells: [[CellState; NUM_COLS]; NUM_ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[CellState::Empty; NUM_COLS]; NUM_ROWS],
        }
    }

    /// Get the cell at (row, col). Out of bounds is a programming error:
    /// callers vet positions through the piece legality checks first.
    pub fn cell(&self, row: usize, col: usize) -> CellState {
        assert!(
            row < NUM_ROWS && col < NUM_COLS,
            "cell ({row}, {col}) out of bounds"
        );
        self.cells[row][col]
    }

    /// Set the cell at (row, col). Same bounds contract as [`Board::cell`].
    pub fn set_cell(&mut self, row: usize, col: usize, state: CellState) {
        assert!(
            row < NUM_ROWS && col < NUM_COLS,
            "cell ({row}, {col}) out of bounds"
        );
        self.cells[row][col] = state;
    }

    /// True iff every cell in the row is filled
    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|cell| cell.is_filled())
    }

    /// Row indices that are currently full, top to bottom
    pub fn full_rows(&self) -> Vec<usize> {
        (0..NUM_ROWS).filter(|&r| self.is_row_full(r)).collect()
    }

    /// Remove the given rows, shifting everything above each one down by one
    /// and clearing the top row.
    ///
    /// Each queued row is processed against the board as it exists after the
    /// previous shifts, so a batch of N rows moves the stack above them down
    /// by N in total.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        for &r in rows {
            for y in (1..=r).rev() {
                self.cells[y] = self.cells[y - 1];
            }
            self.cells[0] = [CellState::Empty; NUM_COLS];
        }
    }

    /// Clear every cell
    pub fn clear(&mut self) {
        self.cells = [[CellState::Empty; NUM_COLS]; NUM_ROWS];
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, row: usize) {
        for col in 0..NUM_COLS {
            board.set_cell(row, col, CellState::Color1);
        }
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert!(board.is_empty());
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::new();
        board.set_cell(5, 5, CellState::Color2);
        assert_eq!(board.cell(5, 5), CellState::Color2);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let board = Board::new();
        board.cell(NUM_ROWS, 0);
    }

    #[test]
    fn test_full_rows_ascending() {
        let mut board = Board::new();
        fill_row(&mut board, 5);
        fill_row(&mut board, 3);
        // A row with one gap does not count
        fill_row(&mut board, 7);
        board.set_cell(7, 4, CellState::Empty);

        assert_eq!(board.full_rows(), vec![3, 5]);
    }

    #[test]
    fn test_remove_single_row() {
        let mut board = Board::new();
        fill_row(&mut board, 10);
        // Marker block above the cleared row
        board.set_cell(9, 3, CellState::Color3);

        board.remove_rows(&[10]);

        // The marker shifted down by one, and the cleared row is gone
        assert_eq!(board.cell(10, 3), CellState::Color3);
        assert!(board.cell(9, 3).is_empty());
        assert!((0..NUM_COLS).all(|c| board.cell(0, c).is_empty()));
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn test_remove_bottom_row_shifts_into_place() {
        let mut board = Board::new();
        fill_row(&mut board, NUM_ROWS - 1);
        board.set_cell(NUM_ROWS - 2, 0, CellState::Color1);

        board.remove_rows(&[NUM_ROWS - 1]);
        assert_eq!(board.cell(NUM_ROWS - 1, 0), CellState::Color1);
        assert!(board.cell(NUM_ROWS - 2, 0).is_empty());
    }

    #[test]
    fn test_simultaneous_clear_shifts_by_two() {
        // Regression guard: clearing rows 4 and 5 together must move the
        // stack above row 5 down by exactly 2, not 1.
        let mut board = Board::new();
        fill_row(&mut board, 4);
        fill_row(&mut board, 5);
        board.set_cell(2, 6, CellState::Color2);

        board.remove_rows(&[4, 5]);

        assert_eq!(board.cell(4, 6), CellState::Color2);
        assert!(board.cell(2, 6).is_empty());
        assert!(board.cell(3, 6).is_empty());
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn test_row_just_above_clear_is_copied() {
        // The row directly above a cleared row must receive the contents of
        // the row above it, all the way up to row 0.
        let mut board = Board::new();
        fill_row(&mut board, 1);
        board.set_cell(0, 0, CellState::Color3);

        board.remove_rows(&[1]);
        assert_eq!(board.cell(1, 0), CellState::Color3);
        assert!(board.cell(0, 0).is_empty());
    }
}
