//! Logical clock for whole-document versioning.
//!
//! `updatedAt` is wall-clock milliseconds, but it is only ever used as a
//! version marker: the stamp handed out for a write is forced past the
//! previous one so a single writer never produces a non-increasing sequence,
//! even when the system clock steps backwards.

use crate::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// A clock set before the epoch reads as 0.
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

/// Stamp for the next write after `previous`, given the wall clock `now`.
///
/// Always strictly greater than `previous`.
pub fn next_stamp(previous: Timestamp, now: Timestamp) -> Timestamp {
    now.max(previous.saturating_add(1))
}
