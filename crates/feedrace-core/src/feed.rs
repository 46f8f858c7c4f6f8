//! Bounded, newest-first feed buffers.

use std::collections::VecDeque;

use feedrace_types::{EntryId, FeedEntry};

/// Default number of entries a feed keeps.
pub const DEFAULT_FEED_LENGTH: usize = 50;

/// The most recent posts shown in one feed, newest first.
///
/// Holds at most `capacity` entries; inserting beyond that silently drops
/// the oldest ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBuffer {
    entries: VecDeque<FeedEntry>,
    capacity: usize,
}

impl FeedBuffer {
    /// Create an empty buffer holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Put `entry` at the front, then trim to capacity.
    ///
    /// Returns the number of old entries dropped.
    pub fn push(&mut self, entry: FeedEntry) -> usize {
        self.entries.push_front(entry);
        self.truncate()
    }

    /// Drop entries beyond capacity, oldest first. Returns how many went.
    pub fn truncate(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.capacity);
        self.entries.truncate(self.capacity);
        excess
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &FeedEntry> {
        self.entries.iter()
    }

    /// Entry ids, newest first.
    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// The newest entry, if any.
    pub fn latest(&self) -> Option<&FeedEntry> {
        self.entries.front()
    }

    /// Copy of the entries, newest first.
    pub fn to_vec(&self) -> Vec<FeedEntry> {
        self.entries.iter().copied().collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FeedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_LENGTH)
    }
}
