//! Core game controller and phase state machine
//!
//! Owns the board, the current/next pieces, scoring and all timing state,
//! advanced one discrete tick at a time by the caller. Rendering and input
//! only ever talk to this module through commands and read accessors.

use crate::board::Board;
use crate::loader::BoardLoader;
use crate::piece::Piece;
use crate::score::ScoreTracker;
use crate::selector::PieceSelector;

/// Ticks of line-clear animation before the rows are actually removed
pub const LINE_CLEAR_DELAY: u32 = 20;
/// Extra entry delay before the first piece of a session
const FIRST_SPAWN_DELAY: u32 = 30;

/// Frames per gravity row, indexed by level (NES speed curve)
const GRAVITY: [u32; 30] = [
    48, 43, 38, 33, 28, 23, 18, 13, 8, 6, //
    5, 5, 5, 4, 4, 4, 3, 3, 3, //
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1,
];

fn gravity_threshold(level: u32) -> u32 {
    GRAVITY[(level as usize).min(GRAVITY.len() - 1)]
}

/// Entry delay (ARE) in ticks for a given lock height: 10 ticks for heights
/// 0-2, then 2 more per group of 4 rows above that.
pub(crate) fn entry_delay_for(lock_height: u32) -> u32 {
    10 + (lock_height + 2) / 4 * 2
}

/// Game phase. Exactly one is active; transitions happen only in
/// [`Game::advance_phase`] and the explicit session/pause handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    StartScreen,
    Running,
    LineClear,
    EntryDelay,
    Paused,
    GameOver,
}

/// The game controller: composition root for board, pieces, timing and score.
pub struct Game {
    board: Board,
    current: Option<Piece>,
    next: Option<Piece>,
    phase: Phase,
    score: ScoreTracker,
    /// Gravity frame accumulator (Running only)
    gravity_frames: u32,
    /// Entry delay (ARE) countdown in ticks
    entry_delay: u32,
    /// Line-clear animation countdown in ticks
    line_clear_delay: u32,
    /// Rows queued for removal; non-empty only during LineClear
    pending_clear: Vec<usize>,
    soft_dropping: bool,
    selector: Box<dyn PieceSelector>,
    loader: Box<dyn BoardLoader>,
    /// Last diagnostic line from the selector, cached for the HUD
    selector_status: String,
}

impl Game {
    pub fn new(selector: Box<dyn PieceSelector>, loader: Box<dyn BoardLoader>) -> Self {
        Self {
            board: Board::new(),
            current: None,
            next: None,
            phase: Phase::StartScreen,
            score: ScoreTracker::new(0),
            gravity_frames: 0,
            entry_delay: 0,
            line_clear_delay: 0,
            pending_clear: Vec::new(),
            soft_dropping: false,
            selector,
            loader,
            selector_status: String::new(),
        }
    }

    // --- read accessors ---------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_piece(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    /// Whether the current piece should be drawn. A freshly promoted piece
    /// stays hidden through LineClear and EntryDelay and is revealed only
    /// when play resumes.
    pub fn piece_visible(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Paused) && self.current.is_some()
    }

    pub fn next_piece(&self) -> Option<&Piece> {
        self.next.as_ref()
    }

    /// Rows queued for removal during the line-clear animation
    pub fn pending_rows(&self) -> &[usize] {
        &self.pending_clear
    }

    /// Animation frame index, counting up from 0 as the clear progresses
    pub fn line_clear_frame(&self) -> u32 {
        LINE_CLEAR_DELAY - self.line_clear_delay
    }

    pub fn entry_delay_remaining(&self) -> u32 {
        self.entry_delay
    }

    pub fn score(&self) -> u32 {
        self.score.score()
    }

    pub fn lines(&self) -> u32 {
        self.score.lines()
    }

    pub fn level(&self) -> u32 {
        self.score.level()
    }

    pub fn selector_status(&self) -> &str {
        &self.selector_status
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    // --- session commands -------------------------------------------------

    /// Reset everything and return to the start screen
    pub fn reset(&mut self) {
        self.board.clear();
        self.current = None;
        self.next = None;
        self.score = ScoreTracker::new(0);
        self.gravity_frames = 0;
        self.entry_delay = 0;
        self.line_clear_delay = 0;
        self.pending_clear.clear();
        self.soft_dropping = false;
        self.selector_status.clear();
        self.set_phase(Phase::StartScreen);
    }

    /// Start a new session. A positive `level` selects the practice speed;
    /// anything else falls back to level 0.
    pub fn start(&mut self, level: i32) {
        self.reset();
        let level = if level > 0 { level as u32 } else { 0 };
        self.score = ScoreTracker::new(level);
        self.loader.reset_board(&mut self.board);
        self.entry_delay = FIRST_SPAWN_DELAY;
        self.set_phase(Phase::Running);

        // First piece goes into the next slot, then is promoted to current
        let kind = self.selector.choose_next(None);
        self.next = Some(Piece::new(kind));
        self.promote_next();
        // Settle into the first-piece entry delay before any tick runs
        self.advance_phase();
        tracing::info!(start_level = level, "session started");
    }

    /// Pause if running (no-op elsewhere)
    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.set_phase(Phase::Paused);
        }
    }

    /// Resume if paused (no-op elsewhere)
    pub fn resume(&mut self) {
        if self.phase == Phase::Paused {
            self.set_phase(Phase::Running);
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            _ => {}
        }
    }

    // --- gameplay commands ------------------------------------------------

    pub fn move_left(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        match self.current.as_mut() {
            Some(piece) => piece.move_left(&self.board),
            None => false,
        }
    }

    pub fn move_right(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        match self.current.as_mut() {
            Some(piece) => piece.move_right(&self.board),
            None => false,
        }
    }

    pub fn rotate(&mut self, clockwise: bool) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        match self.current.as_mut() {
            Some(piece) => piece.rotate(clockwise, &self.board),
            None => false,
        }
    }

    /// Move the current piece down one row, locking it if it is resting.
    /// Returns true iff the piece actually shifted down.
    pub fn move_down(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let resting = match self.current.as_ref() {
            Some(piece) => piece.should_lock(&self.board),
            None => return false,
        };
        if resting {
            self.lock_current();
            self.advance_phase();
            false
        } else {
            match self.current.as_mut() {
                Some(piece) => piece.move_down(&self.board),
                None => false,
            }
        }
    }

    /// Report the soft-drop hold state. While active, gravity accumulation
    /// is suspended so manual descent and gravity never stack.
    pub fn set_soft_drop(&mut self, active: bool) {
        self.soft_dropping = active;
    }

    // --- tick -------------------------------------------------------------

    /// Advance the game by exactly one discrete tick.
    pub fn tick(&mut self) {
        match self.phase {
            Phase::LineClear => {
                self.line_clear_delay = self
                    .line_clear_delay
                    .checked_sub(1)
                    .unwrap_or_else(|| panic!("line-clear countdown underflow"));
                if self.line_clear_delay == 0 {
                    self.execute_line_clear();
                }
            }
            Phase::EntryDelay => {
                self.entry_delay = self
                    .entry_delay
                    .checked_sub(1)
                    .unwrap_or_else(|| panic!("entry-delay countdown underflow"));
            }
            Phase::Running => {
                if self.soft_dropping {
                    // Keep gravity quiet while the player drives descent
                    self.gravity_frames = 0;
                } else {
                    self.gravity_frames += 1;
                    if self.gravity_frames >= gravity_threshold(self.score.level()) {
                        self.move_down();
                        self.gravity_frames = 0;
                    }
                }
            }
            Phase::StartScreen | Phase::Paused | Phase::GameOver => {}
        }
        self.advance_phase();
    }

    // --- internals --------------------------------------------------------

    /// The one place timer-driven phase transitions happen, evaluated at the
    /// end of every tick (and immediately after a lock).
    fn advance_phase(&mut self) {
        match self.phase {
            Phase::LineClear if self.line_clear_delay == 0 => {
                self.set_phase(Phase::EntryDelay);
            }
            Phase::EntryDelay if self.entry_delay == 0 => {
                // Reveal the piece that was promoted at lock time
                self.set_phase(Phase::Running);
            }
            Phase::Running => {
                if self.line_clear_delay > 0 {
                    self.set_phase(Phase::LineClear);
                } else if self.entry_delay > 0 {
                    self.set_phase(Phase::EntryDelay);
                }
            }
            _ => {}
        }
    }

    fn set_phase(&mut self, next: Phase) {
        if self.phase != next {
            tracing::debug!(from = ?self.phase, to = ?next, "phase transition");
            self.phase = next;
        }
    }

    /// Lock the resting piece and run the post-lock sequence: promote the
    /// next piece (with the spawn-overlap game-over check), queue any full
    /// rows, and compute the entry delay from the lock height.
    fn lock_current(&mut self) {
        let piece = match self.current.take() {
            Some(piece) => piece,
            None => panic!("lock with no active piece"),
        };
        let lock_height = piece.height_from_bottom();
        piece.lock(&mut self.board);
        tracing::debug!(kind = piece.kind.name(), lock_height, "piece locked");

        self.promote_next();
        if self.phase == Phase::GameOver {
            return;
        }

        self.pending_clear = self.board.full_rows();
        if !self.pending_clear.is_empty() {
            self.line_clear_delay = LINE_CLEAR_DELAY;
        }
        self.entry_delay = entry_delay_for(lock_height);
        self.gravity_frames = 0;
    }

    /// Promote the next piece to current. Any overlap with the existing
    /// stack at spawn is fatal, checked before anything else can observe the
    /// new piece.
    fn promote_next(&mut self) {
        let next = match self.next.take() {
            Some(piece) => piece,
            None => panic!("no next piece to promote"),
        };
        if next.overlaps(&self.board) {
            self.current = Some(next);
            tracing::info!(score = self.score.score(), "spawn blocked, game over");
            self.set_phase(Phase::GameOver);
            return;
        }
        self.current = Some(next);

        // Status is captured before the selector deals again: its read
        // position moves when the new next piece is chosen
        self.selector_status = self.selector.status_string();
        let kind = self.selector.choose_next(Some(next.kind));
        self.next = Some(Piece::new(kind));
    }

    /// Remove the queued rows and award the batch exactly once.
    fn execute_line_clear(&mut self) {
        let rows = std::mem::take(&mut self.pending_clear);
        self.board.remove_rows(&rows);
        self.score.apply_clear(rows.len());
        tracing::info!(
            cleared = rows.len(),
            score = self.score.score(),
            lines = self.score.lines(),
            "lines cleared"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellState, NUM_COLS, NUM_ROWS};
    use crate::loader::EmptyLoader;
    use crate::tetromino::PieceKind;

    /// Deals a fixed cycle of kinds, for deterministic gameplay tests
    struct ScriptedSelector {
        kinds: Vec<PieceKind>,
        idx: usize,
    }

    impl ScriptedSelector {
        fn new(kinds: &[PieceKind]) -> Self {
            Self {
                kinds: kinds.to_vec(),
                idx: 0,
            }
        }
    }

    impl PieceSelector for ScriptedSelector {
        fn choose_next(&mut self, _previous: Option<PieceKind>) -> PieceKind {
            let kind = self.kinds[self.idx % self.kinds.len()];
            self.idx += 1;
            kind
        }

        fn status_string(&self) -> String {
            format!("scripted, {} dealt", self.idx)
        }
    }

    fn game_with(kinds: &[PieceKind]) -> Game {
        let mut game = Game::new(
            Box::new(ScriptedSelector::new(kinds)),
            Box::new(EmptyLoader),
        );
        game.start(0);
        game
    }

    /// Tick through the initial entry delay until play begins
    fn run_until_running(game: &mut Game) {
        for _ in 0..1000 {
            if game.phase() == Phase::Running && game.entry_delay_remaining() == 0 {
                return;
            }
            game.tick();
        }
        panic!("game never reached Running, stuck in {:?}", game.phase());
    }

    /// Soft-drop the current piece until it locks
    fn drop_and_lock(game: &mut Game) {
        while game.move_down() {}
    }

    #[test]
    fn test_entry_delay_formula() {
        for (height, expected) in [(0, 10), (1, 10), (2, 10), (3, 12), (6, 14), (7, 14), (8, 14)] {
            assert_eq!(entry_delay_for(height), expected, "height {height}");
        }
    }

    #[test]
    fn test_start_validates_level() {
        let mut game = game_with(&[PieceKind::I]);
        game.start(12);
        assert_eq!(game.level(), 12);
        game.start(-4);
        assert_eq!(game.level(), 0);
    }

    #[test]
    fn test_first_piece_waits_out_spawn_delay() {
        let mut game = game_with(&[PieceKind::I]);
        // One Running tick, then the 30-tick first-piece delay
        assert_eq!(game.entry_delay_remaining(), 30);
        game.tick();
        assert_eq!(game.phase(), Phase::EntryDelay);
        assert!(!game.piece_visible());
        for _ in 0..30 {
            game.tick();
        }
        assert_eq!(game.phase(), Phase::Running);
        assert!(game.piece_visible());
    }

    #[test]
    fn test_zero_clear_lock_skips_line_clear() {
        let mut game = game_with(&[PieceKind::I]);
        run_until_running(&mut game);

        drop_and_lock(&mut game);

        // Straight to EntryDelay, never LineClear, floor lock delay of 10
        assert_eq!(game.phase(), Phase::EntryDelay);
        assert!(game.pending_rows().is_empty());
        assert_eq!(game.entry_delay_remaining(), 10);
        assert!(!game.piece_visible());

        for _ in 0..10 {
            game.tick();
        }
        assert_eq!(game.phase(), Phase::Running);
        assert!(game.piece_visible());
    }

    #[test]
    fn test_line_clear_sequence() {
        let mut game = game_with(&[PieceKind::I]);
        run_until_running(&mut game);

        // Horizontal I on the floor covers cols 3-6; fill the rest of the row
        let bottom = NUM_ROWS - 1;
        for col in (0..3).chain(7..NUM_COLS) {
            game.board_mut().set_cell(bottom, col, CellState::Color2);
        }

        drop_and_lock(&mut game);
        assert_eq!(game.phase(), Phase::LineClear);
        assert_eq!(game.pending_rows(), &[bottom]);

        // For 19 ticks the rows stay on the board and nothing is scored
        for i in 0..(LINE_CLEAR_DELAY - 1) {
            game.tick();
            assert_eq!(game.phase(), Phase::LineClear, "tick {i}");
            assert!(game.board().is_row_full(bottom));
            assert_eq!(game.score(), 0);
            assert_eq!(game.line_clear_frame(), i + 1);
        }

        // Removal fires exactly when the countdown reaches 0
        game.tick();
        assert_eq!(game.phase(), Phase::EntryDelay);
        assert!(!game.board().is_row_full(bottom));
        assert!(game.pending_rows().is_empty());
        assert_eq!(game.score(), 40);
        assert_eq!(game.lines(), 1);
    }

    #[test]
    fn test_score_applied_once_per_batch() {
        let mut game = game_with(&[PieceKind::I]);
        game.start(4);
        run_until_running(&mut game);

        let bottom = NUM_ROWS - 1;
        for col in (0..3).chain(7..NUM_COLS) {
            game.board_mut().set_cell(bottom, col, CellState::Color2);
        }
        drop_and_lock(&mut game);
        for _ in 0..LINE_CLEAR_DELAY {
            game.tick();
        }
        // Single at level 4: 40 * 5, once
        assert_eq!(game.score(), 200);
        assert_eq!(game.lines(), 1);
    }

    #[test]
    fn test_spawn_overlap_is_game_over() {
        let mut game = game_with(&[PieceKind::O]);
        run_until_running(&mut game);

        // Bury the spawn area, then lock the current piece in place
        for row in 0..3 {
            for col in 3..5 {
                game.board_mut().set_cell(row, col, CellState::Color3);
            }
        }
        drop_and_lock(&mut game);
        assert_eq!(game.phase(), Phase::GameOver);

        // No further gameplay: ticks and commands are inert until restart
        let cells_before: Vec<_> = game.current_piece().unwrap().cells().collect();
        for _ in 0..120 {
            game.tick();
        }
        assert_eq!(game.phase(), Phase::GameOver);
        assert!(!game.move_left());
        assert!(!game.move_down());
        assert!(!game.rotate(true));
        assert_eq!(
            game.current_piece().unwrap().cells().collect::<Vec<_>>(),
            cells_before
        );

        // Restart returns to the start screen with fresh state
        game.reset();
        assert_eq!(game.phase(), Phase::StartScreen);
        assert!(game.board().is_empty());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut game = game_with(&[PieceKind::T]);
        run_until_running(&mut game);

        game.pause();
        assert_eq!(game.phase(), Phase::Paused);
        game.pause();
        assert_eq!(game.phase(), Phase::Paused);

        // Frozen: ticks do not advance gravity while paused
        let cells_before: Vec<_> = game.current_piece().unwrap().cells().collect();
        for _ in 0..200 {
            game.tick();
        }
        assert_eq!(
            game.current_piece().unwrap().cells().collect::<Vec<_>>(),
            cells_before
        );

        game.resume();
        assert_eq!(game.phase(), Phase::Running);
    }

    #[test]
    fn test_pause_noop_outside_running() {
        let mut game = game_with(&[PieceKind::T]);
        assert_eq!(game.entry_delay_remaining(), 30);
        game.tick();
        assert_eq!(game.phase(), Phase::EntryDelay);
        game.toggle_pause();
        assert_eq!(game.phase(), Phase::EntryDelay);

        game.reset();
        game.toggle_pause();
        assert_eq!(game.phase(), Phase::StartScreen);
    }

    #[test]
    fn test_gravity_moves_piece_at_threshold() {
        let mut game = game_with(&[PieceKind::T]);
        run_until_running(&mut game);

        let before: Vec<_> = game.current_piece().unwrap().cells().collect();
        // Level 0 gravity is 48 ticks per row
        for _ in 0..47 {
            game.tick();
        }
        assert_eq!(
            game.current_piece().unwrap().cells().collect::<Vec<_>>(),
            before
        );
        game.tick();
        let after: Vec<_> = game.current_piece().unwrap().cells().collect();
        assert!(after.iter().zip(&before).all(|(&(r, c), &(r0, c0))| r == r0 + 1 && c == c0));
    }

    #[test]
    fn test_higher_level_is_faster() {
        let mut game = game_with(&[PieceKind::T]);
        game.start(9);
        run_until_running(&mut game);

        let before: Vec<_> = game.current_piece().unwrap().cells().collect();
        // Level 9 gravity is 6 ticks per row
        for _ in 0..6 {
            game.tick();
        }
        assert_ne!(
            game.current_piece().unwrap().cells().collect::<Vec<_>>(),
            before
        );
    }

    #[test]
    fn test_soft_drop_suspends_gravity() {
        let mut game = game_with(&[PieceKind::T]);
        run_until_running(&mut game);

        game.set_soft_drop(true);
        let before: Vec<_> = game.current_piece().unwrap().cells().collect();
        for _ in 0..200 {
            game.tick();
        }
        // Gravity never fires while the accumulator is held at zero
        assert_eq!(
            game.current_piece().unwrap().cells().collect::<Vec<_>>(),
            before
        );

        // Releasing soft drop restarts accumulation from scratch
        game.set_soft_drop(false);
        for _ in 0..48 {
            game.tick();
        }
        assert_ne!(
            game.current_piece().unwrap().cells().collect::<Vec<_>>(),
            before
        );
    }

    #[test]
    fn test_movement_ignored_outside_running() {
        let mut game = game_with(&[PieceKind::T]);
        // Still in the first-piece entry delay
        game.tick();
        assert_eq!(game.phase(), Phase::EntryDelay);
        assert!(!game.move_left());
        assert!(!game.move_right());
        assert!(!game.move_down());
        assert!(!game.rotate(false));
    }

    #[test]
    fn test_taller_lock_longer_entry_delay() {
        let mut game = game_with(&[PieceKind::O]);
        run_until_running(&mut game);

        // Build a column under the spawn so the piece locks high up
        for row in 6..NUM_ROWS {
            for col in 3..5 {
                game.board_mut().set_cell(row, col, CellState::Color1);
            }
        }
        drop_and_lock(&mut game);
        // O locks on rows 4-5; lowest cell row 5 leaves height 14:
        // 10 + (14 + 2) / 4 * 2 = 18
        assert_eq!(game.phase(), Phase::EntryDelay);
        assert_eq!(game.entry_delay_remaining(), entry_delay_for(14));
    }

    #[test]
    fn test_selector_status_cached_on_promotion() {
        let mut game = game_with(&[PieceKind::I]);
        // Captured at first promotion, after the session-start deal
        assert_eq!(game.selector_status(), "scripted, 1 dealt");
    }
}
