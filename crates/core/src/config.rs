//! Engine configuration.
//!
//! Constructed explicitly at startup and injected into the engine/store; there
//! is no process-global settings object.

use chrono::Duration;

/// Business-rule knobs for the reservation/booking engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Default hold lifetime, in hours, when a caller does not pass a TTL.
    pub default_hold_expiry_hours: i64,

    /// Upper bound on a hold extension, in hours.
    pub max_hold_extension_hours: i64,

    /// Default transfer fee, in basis points of the booking amount.
    pub transfer_fee_bp: u32,

    /// Project quota applied to tenants that have no explicit ceiling.
    pub default_max_projects: u32,

    /// How long a store commit may wait for the write lock before giving up
    /// with a retryable `Busy` error, in milliseconds.
    pub lock_wait_ms: u64,
}

impl EngineConfig {
    pub fn hold_ttl(&self) -> Duration {
        Duration::hours(self.default_hold_expiry_hours)
    }

    pub fn max_hold_extension(&self) -> Duration {
        Duration::hours(self.max_hold_extension_hours)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // 7 days.
            default_hold_expiry_hours: 168,
            // 14 additional days.
            max_hold_extension_hours: 336,
            // 2%.
            transfer_fee_bp: 200,
            default_max_projects: 10,
            lock_wait_ms: 2_000,
        }
    }
}
