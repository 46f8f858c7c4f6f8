//! Type-safe identifier for feed entries.
//!
//! Entry ids are plain integers rather than UUIDs: the merge clock hands
//! them out in strictly increasing order, and the renderer keys its
//! enter/exit transitions on them, so the ordering is part of the contract.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier of a post shown in a feed.
///
/// The first id allocated by a playback session is `1`; every later id is
/// exactly one greater than its predecessor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct EntryId(pub u64);

impl EntryId {
    /// Sentinel preceding the first allocated id.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw integer id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the inner integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Return the id that follows this one.
    ///
    /// Saturates at `u64::MAX`; a replay never gets anywhere near it.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for EntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntryId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<EntryId> for u64 {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_strictly_greater() {
        let id = EntryId::ZERO;
        assert_eq!(id.next(), EntryId::new(1));
        assert!(id.next() > id);
    }

    #[test]
    fn next_saturates() {
        let id = EntryId::new(u64::MAX);
        assert_eq!(id.next(), id);
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&EntryId::new(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }
}
