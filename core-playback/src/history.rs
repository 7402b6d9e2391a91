//! Bounded playback history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One finished playback session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackHistoryEntry {
    pub url: String,
    pub title: Option<String>,
    /// Unix milliseconds.
    pub started_at: i64,
    /// Unix milliseconds.
    pub ended_at: i64,
    pub duration_ms: i64,
}

/// Ring buffer of finished sessions; the oldest entry is dropped first.
#[derive(Debug, Clone)]
pub struct PlaybackHistory {
    entries: VecDeque<PlaybackHistoryEntry>,
    capacity: usize,
}

impl PlaybackHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: PlaybackHistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries oldest first, newest last.
    pub fn entries(&self) -> Vec<PlaybackHistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&PlaybackHistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
