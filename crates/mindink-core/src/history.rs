//! Linear undo/redo history of document snapshots.

use crate::tree::Document;
use std::sync::Arc;

/// Default maximum number of history entries to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Log of committed documents with a cursor and a coalescing flag.
///
/// While coalescing, commits replace the entry under the cursor instead of
/// appending, so a continuous gesture ends up as a single undo step.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Document>,
    current_index: usize,
    is_coalescing: bool,
    limit: Option<usize>,
}

impl History {
    /// Start a history with `initial` as its only entry.
    pub fn new(initial: Document) -> Self {
        Self::with_limit(initial, Some(DEFAULT_HISTORY_LIMIT))
    }

    /// Start a history with an explicit entry limit (`None` is unbounded).
    pub fn with_limit(initial: Document, limit: Option<usize>) -> Self {
        Self {
            entries: vec![initial],
            current_index: 0,
            is_coalescing: false,
            limit: limit.map(|limit| limit.max(1)),
        }
    }

    /// Rebuild a history from persisted parts.
    ///
    /// An empty log falls back to `fallback`, an out-of-range cursor is clamped.
    pub fn from_parts(
        entries: Vec<Document>,
        current_index: usize,
        limit: Option<usize>,
        fallback: Document,
    ) -> Self {
        if entries.is_empty() {
            log::warn!("Restored history is empty, starting over");
            return Self::with_limit(fallback, limit);
        }
        let last = entries.len() - 1;
        if current_index > last {
            log::warn!("History cursor {} out of range, clamping to {}", current_index, last);
        }
        Self {
            current_index: current_index.min(last),
            entries,
            is_coalescing: false,
            limit: limit.map(|limit| limit.max(1)),
        }
    }

    /// The document under the cursor.
    pub fn current(&self) -> &Document {
        &self.entries[self.current_index]
    }

    /// Commit a new document.
    pub fn apply_operation(&mut self, document: Document) {
        if self.is_coalescing {
            log::trace!("Coalesced write at entry {}", self.current_index);
            self.entries[self.current_index] = document;
            return;
        }
        self.entries.truncate(self.current_index + 1);
        self.entries.push(document);
        self.current_index = self.entries.len() - 1;
        self.enforce_limit();
        log::debug!("Committed history entry {}", self.current_index);
    }

    /// Open a gesture: the current document is duplicated into a fresh entry
    /// that subsequent commits overwrite.
    pub fn begin_coalescing(&mut self) {
        if self.is_coalescing {
            log::warn!("begin_coalescing called while already coalescing");
            return;
        }
        self.entries.truncate(self.current_index + 1);
        let current = Arc::clone(self.current());
        self.entries.push(current);
        self.current_index = self.entries.len() - 1;
        self.is_coalescing = true;
        log::debug!("Coalescing into entry {}", self.current_index);
    }

    /// Close a gesture. The entry it wrote stays in the log.
    pub fn end_coalescing(&mut self) {
        if !self.is_coalescing {
            return;
        }
        self.is_coalescing = false;
        self.enforce_limit();
        log::debug!("Coalescing ended at entry {}", self.current_index);
    }

    /// Abandon a gesture, dropping the entry it wrote.
    ///
    /// Returns false when no gesture was open.
    pub fn cancel_coalescing(&mut self) -> bool {
        if !self.is_coalescing {
            return false;
        }
        // begin_coalescing always leaves the gesture entry last with its
        // predecessor before it.
        self.entries.pop();
        self.current_index = self.entries.len().saturating_sub(1);
        self.is_coalescing = false;
        log::debug!("Coalescing cancelled, back at entry {}", self.current_index);
        true
    }

    /// Step back. Returns true if the cursor moved.
    pub fn undo(&mut self) -> bool {
        self.end_coalescing();
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        log::debug!("Undo to entry {}", self.current_index);
        true
    }

    /// Step forward. Returns true if the cursor moved.
    pub fn redo(&mut self) -> bool {
        self.end_coalescing();
        if self.current_index + 1 >= self.entries.len() {
            return false;
        }
        self.current_index += 1;
        log::debug!("Redo to entry {}", self.current_index);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.entries.len()
    }

    pub fn is_coalescing(&self) -> bool {
        self.is_coalescing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Document] {
        &self.entries
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.entries.len() <= limit {
            return;
        }
        let excess = self.entries.len() - limit;
        self.entries.drain(..excess);
        self.current_index = self.current_index.saturating_sub(excess);
        log::trace!("Dropped {} oldest history entries", excess);
    }
}
