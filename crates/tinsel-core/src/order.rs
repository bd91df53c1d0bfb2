//! Client-side ordering of subscription snapshots.
//!
//! The store is queried without server-side ordering, so every snapshot is
//! ordered here by creation time, oldest first. An ornament whose server
//! timestamp is still pending compares equal to everything: it never moves,
//! and nothing moves across it. Timestamped ornaments are sorted within
//! each run between pending ones. The result is deterministic and stable
//! for any input, which a plain comparator sort cannot promise once
//! "equal to everything" breaks transitivity.

use crate::model::Ornament;

/// Order a snapshot in place.
pub fn order_snapshot(ornaments: &mut [Ornament]) {
    for run in ornaments.split_mut(Ornament::is_pending) {
        // `created_at` is `Some` for every member of a run.
        run.sort_by_key(|o| o.created_at);
    }
}
