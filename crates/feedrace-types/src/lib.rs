//! Shared type definitions for the feed race replay.
//!
//! Types defined here flow downstream to `TypeScript` via `ts-rs` so the
//! browser renderer can consume tick output without hand-written mirrors.
//!
//! # Modules
//!
//! - [`ids`] -- Integer entry identifier
//! - [`enums`] -- Post attribution, tracks, streams, playback lifecycle
//! - [`structs`] -- Feed entries and series samples

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{EndReason, PlaybackPhase, PostSource, StreamKind, Track};
pub use ids::EntryId;
pub use structs::{FeedEntry, SeriesPoint};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // The files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::EntryId::export_all();

        let _ = crate::enums::PostSource::export_all();
        let _ = crate::enums::Track::export_all();
        let _ = crate::enums::StreamKind::export_all();
        let _ = crate::enums::PlaybackPhase::export_all();
        let _ = crate::enums::EndReason::export_all();

        let _ = crate::structs::FeedEntry::export_all();
        let _ = crate::structs::SeriesPoint::export_all();
    }
}
