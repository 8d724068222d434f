//! Piece selection collaborators
//!
//! The core asks a selector for one piece per promotion and never assumes a
//! particular probability scheme. Two schemes are provided: the NES
//! randomizer (roll with one reroll against repeats) and a 7-bag queue.

use crate::tetromino::PieceKind;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of upcoming pieces.
///
/// `previous` is the piece that just became current, or `None` at session
/// start. `status_string` is diagnostic text for the HUD only.
pub trait PieceSelector {
    fn choose_next(&mut self, previous: Option<PieceKind>) -> PieceKind;
    fn status_string(&self) -> String;
}

/// NES-style randomizer: roll an 8-sided die over the 7 kinds; on the
/// "reroll" face or a repeat of the previous piece, roll once more uniformly
/// over all 7. Repeats stay possible, just less likely.
pub struct ClassicSelector {
    rng: StdRng,
    dealt: u32,
}

impl ClassicSelector {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dealt: 0,
        }
    }
}

impl Default for ClassicSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSelector for ClassicSelector {
    fn choose_next(&mut self, previous: Option<PieceKind>) -> PieceKind {
        let kinds = PieceKind::all();
        self.dealt += 1;

        let first_roll = self.rng.gen_range(0..8);
        if first_roll < 7 && Some(kinds[first_roll]) != previous {
            return kinds[first_roll];
        }
        kinds[self.rng.gen_range(0..7)]
    }

    fn status_string(&self) -> String {
        format!("classic randomizer, {} dealt", self.dealt)
    }
}

/// 7-bag randomizer: shuffle all 7 kinds, deal them out, reshuffle.
/// Prevents the droughts the classic scheme allows.
pub struct BagSelector {
    rng: StdRng,
    queue: Vec<PieceKind>,
}

impl BagSelector {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut selector = Self {
            rng: StdRng::seed_from_u64(seed),
            queue: Vec::with_capacity(14),
        };
        selector.refill();
        selector
    }

    fn refill(&mut self) {
        let mut bag = PieceKind::all().to_vec();
        bag.shuffle(&mut self.rng);
        self.queue.extend(bag);
    }
}

impl Default for BagSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSelector for BagSelector {
    fn choose_next(&mut self, _previous: Option<PieceKind>) -> PieceKind {
        if self.queue.is_empty() {
            self.refill();
        }
        self.queue.remove(0)
    }

    fn status_string(&self) -> String {
        let upcoming: Vec<&str> = self.queue.iter().take(3).map(|k| k.name()).collect();
        format!("bag: {}", upcoming.join(" "))
    }
}
