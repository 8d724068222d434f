//! Start-screen state: level selection before a session begins

/// Typed/adjusted starting-level input on the start screen.
///
/// Anything that does not parse as a positive integer falls back to level 0,
/// matching the game controller's own validation.
#[derive(Debug, Default)]
pub struct StartScreen {
    input: String,
}

impl StartScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text for rendering (may be empty)
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The level the session would start at
    pub fn level(&self) -> i32 {
        self.input.parse().unwrap_or(0)
    }

    pub fn push_digit(&mut self, c: char) {
        // Two digits cover every speed the gravity curve distinguishes
        if c.is_ascii_digit() && self.input.len() < 2 {
            self.input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Arrow-key adjustment, clamped at 0
    pub fn adjust(&mut self, delta: i32) {
        let next = (self.level() + delta).clamp(0, 99);
        self.input = next.to_string();
    }
}
