//! Snapshot-based undo/redo.
//!
//! Each record is the full markup of the surface plus the caret at the time
//! it was taken. Undo and redo move a cursor over the records; recording
//! after an undo discards everything past the cursor.

use std::collections::VecDeque;

use crate::editing::Position;

/// Snapshots kept before the oldest is evicted.
pub const MAX_HISTORY: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub html: String,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub struct History {
    records: VecDeque<HistoryRecord>,
    at: Option<usize>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(MAX_HISTORY)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            at: None,
            limit: limit.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the current record.
    pub fn at(&self) -> Option<usize> {
        self.at
    }

    pub fn current(&self) -> Option<&HistoryRecord> {
        self.at.and_then(|at| self.records.get(at))
    }

    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    /// Push a snapshot after the current record. Returns `false` when it
    /// matches the current record's markup and caret, in which case nothing
    /// changes.
    pub fn record(&mut self, html: String, pos: Position) -> bool {
        if let Some(current) = self.current()
            && current.html == html
            && current.pos.start == pos.start
            && current.pos.end == pos.end
        {
            return false;
        }

        let next = self.at.map_or(0, |at| at + 1);
        self.records.truncate(next);
        self.records.push_back(HistoryRecord { html, pos });
        while self.records.len() > self.limit {
            self.records.pop_front();
        }
        self.at = Some(self.records.len() - 1);
        log::trace!("history record {}/{}", self.records.len(), self.limit);
        true
    }

    /// Step back one record. `None` when already at the oldest.
    pub fn undo(&mut self) -> Option<&HistoryRecord> {
        let at = self.at.filter(|at| *at > 0)? - 1;
        self.at = Some(at);
        self.records.get(at)
    }

    /// Step forward one record. `None` when already at the newest.
    pub fn redo(&mut self) -> Option<&HistoryRecord> {
        let at = self.at.map_or(0, |at| at + 1);
        if at >= self.records.len() {
            return None;
        }
        self.at = Some(at);
        self.records.get(at)
    }

    pub fn can_redo(&self) -> bool {
        self.at.map_or(0, |at| at + 1) < self.records.len()
    }
}
