//! # Response Log
//!
//! Fixed-capacity, append-only store of completed transfers, shared between
//! the network worker (single writer) and the UI (reader).
//!
//! ```text
//! slots:     [ s0 ][ s1 ][ s2 ][    ][    ] ... capacity
//!                               ^
//!                          published = 3
//! ```
//!
//! A slot is written exactly once, then the `published` cursor is advanced
//! with `Release` ordering. Readers load the cursor with `Acquire` and only
//! ever touch slots below it, so a reader never observes a half-written slot.
//! Slots are never mutated after publish, which is why no lock is needed.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Default number of slots when nothing is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 1024;

/// The result of one transfer. `payload == None` marks a failed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSlot {
    payload: Option<Vec<u8>>,
}

impl ResponseSlot {
    pub fn succeeded(body: Vec<u8>) -> Self {
        Self {
            payload: Some(body),
        }
    }

    pub fn failed() -> Self {
        Self { payload: None }
    }

    /// Response bytes, or `None` if the transfer failed.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.payload.is_none()
    }

    /// Number of payload bytes (0 for failed transfers).
    pub fn len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// Every slot has been used. Treated as fatal by the caller.
    CapacityExceeded { capacity: usize },
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::CapacityExceeded { capacity } => {
                write!(f, "response log is full ({capacity} responses)")
            }
        }
    }
}

impl std::error::Error for LogError {}

struct Shared {
    slots: Box<[OnceLock<ResponseSlot>]>,
    published: AtomicUsize,
}

/// Create a log with `capacity` slots, returning its only writer and a reader.
pub fn response_log(capacity: usize) -> (LogWriter, LogReader) {
    let shared = Arc::new(Shared {
        slots: (0..capacity).map(|_| OnceLock::new()).collect(),
        published: AtomicUsize::new(0),
    });
    (
        LogWriter {
            shared: shared.clone(),
        },
        LogReader { shared },
    )
}

/// Write half. Deliberately not `Clone`: there is exactly one writer.
pub struct LogWriter {
    shared: Arc<Shared>,
}

impl LogWriter {
    /// Index the next published slot will land in.
    ///
    /// Fails if the log has no free slot left, so a transfer is never started
    /// for a response that could not be stored.
    pub fn reserve(&self) -> Result<usize, LogError> {
        let next = self.shared.published.load(Ordering::Relaxed);
        if next >= self.shared.slots.len() {
            return Err(LogError::CapacityExceeded {
                capacity: self.shared.slots.len(),
            });
        }
        Ok(next)
    }

    /// Write `slot` at the next index and make it visible to readers.
    ///
    /// Returns the index the slot was published at.
    pub fn publish(&mut self, slot: ResponseSlot) -> Result<usize, LogError> {
        let index = self.reserve()?;
        // Only this writer advances the cursor, so the cell at `index` is empty.
        let _ = self.shared.slots[index].set(slot);
        self.shared.published.store(index + 1, Ordering::Release);
        Ok(index)
    }

    pub fn published(&self) -> usize {
        self.shared.published.load(Ordering::Relaxed)
    }
}

/// Read half. Cheap to clone; every clone sees the same log.
#[derive(Clone)]
pub struct LogReader {
    shared: Arc<Shared>,
}

impl LogReader {
    /// Number of slots that are fully written and safe to read.
    pub fn published(&self) -> usize {
        self.shared.published.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// The slot at `index`, or `None` if it has not been published yet.
    pub fn read(&self, index: usize) -> Option<&ResponseSlot> {
        if index >= self.published() {
            return None;
        }
        self.shared.slots[index].get()
    }

    /// Published slots from most recent to oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &ResponseSlot> + '_ {
        let published = self.published();
        (0..published)
            .rev()
            .filter_map(move |index| self.shared.slots[index].get())
    }
}

impl fmt::Debug for LogReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogReader")
            .field("published", &self.published())
            .field("capacity", &self.capacity())
            .finish()
    }
}
