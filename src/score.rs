//! Score and progress tracking (NES scoring table)

/// Points awarded per batch size, before the level multiplier.
/// Indexed by the number of rows cleared in one batch (1-4).
const REWARDS: [u32; 5] = [0, 40, 100, 300, 1200];

/// Line count, level and score for one session.
///
/// The level is fixed when the session starts; the trainer never advances it
/// as lines accumulate, so practice speed stays constant.
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    score: u32,
    lines: u32,
    level: u32,
}

impl ScoreTracker {
    pub fn new(level: u32) -> Self {
        Self {
            score: 0,
            lines: 0,
            level,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Apply one line-clear batch: `REWARDS[n] * (level + 1)`, once per
    /// batch, never per row. A batch larger than 4 rows is impossible for a
    /// tetromino and trips the reward table's bounds check.
    pub fn apply_clear(&mut self, rows_cleared: usize) {
        if rows_cleared == 0 {
            return;
        }
        self.score += REWARDS[rows_cleared] * (self.level + 1);
        self.lines += rows_cleared as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clear_level_zero() {
        let mut tracker = ScoreTracker::new(0);
        tracker.apply_clear(1);
        assert_eq!(tracker.score(), 40);
        assert_eq!(tracker.lines(), 1);
    }

    #[test]
    fn test_reward_scales_with_level() {
        let mut tracker = ScoreTracker::new(8);
        tracker.apply_clear(4);
        // Tetris at level 8: 1200 * 9
        assert_eq!(tracker.score(), 10_800);
        assert_eq!(tracker.lines(), 4);
    }

    #[test]
    fn test_batch_applied_once_not_per_row() {
        let mut tracker = ScoreTracker::new(0);
        tracker.apply_clear(3);
        // 300, not 3 * 40
        assert_eq!(tracker.score(), 300);
    }

    #[test]
    fn test_level_is_session_fixed() {
        let mut tracker = ScoreTracker::new(5);
        for _ in 0..30 {
            tracker.apply_clear(2);
        }
        assert_eq!(tracker.level(), 5);
        assert_eq!(tracker.lines(), 60);
    }

    #[test]
    fn test_zero_clear_is_noop() {
        let mut tracker = ScoreTracker::new(3);
        tracker.apply_clear(0);
        assert_eq!(tracker.score(), 0);
        assert_eq!(tracker.lines(), 0);
    }
}
