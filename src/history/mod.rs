//! Linear undo/redo over immutable document snapshots.

use std::time::{SystemTime, UNIX_EPOCH};

/// Entries kept before the oldest is discarded.
pub const MAX_HISTORY: usize = 50;

/// One committed state.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry<T> {
    /// Milliseconds since the Unix epoch when the entry was recorded.
    pub timestamp_ms: u64,
    pub description: String,
    pub state: T,
}

/// Bounded ring of snapshots with a cursor at the current state.
///
/// Pushing while the cursor is behind the tail discards the redo branch.
#[derive(Clone, Debug)]
pub struct History<T> {
    entries: Vec<HistoryEntry<T>>,
    cursor: usize,
    cap: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl<T: Clone> History<T> {
    /// Empty history holding at most `cap` entries (at least one).
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap.min(MAX_HISTORY)),
            cursor: 0,
            cap: cap.max(1),
        }
    }

    /// Record a committed state at the cursor.
    pub fn push(&mut self, description: impl Into<String>, state: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(HistoryEntry {
            timestamp_ms: now_ms(),
            description: description.into(),
            state,
        });
        if self.entries.len() > self.cap {
            let excess = self.entries.len() - self.cap;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back; returns the state to restore.
    pub fn undo(&mut self) -> Option<&HistoryEntry<T>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward; returns the state to restore.
    pub fn redo(&mut self) -> Option<&HistoryEntry<T>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&HistoryEntry<T>> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[HistoryEntry<T>] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
#[path = "../../tests/unit/history/history.rs"]
mod tests;
