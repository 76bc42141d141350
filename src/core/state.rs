//! # Session State
//!
//! What the UI thread owns between redraws: the input line being typed and
//! the scroll offset. Everything else (responses) lives in the shared log.
//!
//! ```text
//! Session
//! ├── input_line: String      // at most `input_capacity` chars
//! ├── input_capacity: usize   // 127 unless configured
//! └── scroll_offset: i64      // lines hidden at the bottom; unclamped
//! ```
//!
//! State changes only happen through `update(session, key)` in action.rs.

/// Longest input line accepted by default.
pub const DEFAULT_INPUT_CAPACITY: usize = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub input_line: String,
    pub input_capacity: usize,
    /// Number of log lines skipped from the bottom. Negative values skip
    /// nothing; values past the end of the log leave the view empty.
    pub scroll_offset: i64,
}

impl Session {
    pub fn new(input_capacity: usize) -> Self {
        Self {
            input_line: String::with_capacity(input_capacity),
            input_capacity,
            scroll_offset: 0,
        }
    }

    pub fn input_len(&self) -> usize {
        self.input_line.chars().count()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_CAPACITY)
    }
}
