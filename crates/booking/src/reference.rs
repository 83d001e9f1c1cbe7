//! Human-readable booking reference codes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Build a reference code like `BKG-20260807-0F3A9C1D`.
///
/// The date keys the code to the booking day; the suffix comes from the
/// supplied uuid so callers control determinism in tests. Uniqueness is
/// enforced by the store at commit, not here.
pub fn booking_reference(booked_at: DateTime<Utc>, seed: Uuid) -> String {
    let suffix: String = seed
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("BKG-{}-{}", booked_at.format("%Y%m%d"), suffix)
}
