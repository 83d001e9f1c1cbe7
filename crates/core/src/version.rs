//! Versioned-entity primitives for optimistic concurrency.

use crate::error::{DomainError, DomainResult};

/// Versioned entity marker + minimal interface.
///
/// This is intentionally small so domain modules can decide how they model
/// their state without bringing in any infrastructure concerns. The store is
/// the only place a version ever advances.
pub trait Versioned {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Monotonically increasing version of the entity's state.
    ///
    /// A freshly constructed, never-persisted entity is at version 0; the
    /// store bumps the version by one per committed write.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a versioned entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for idempotent writes, migrations, etc.).
    Any,
    /// Require the entity to be at an exact version.
    Exact(u64),
    /// Require that no row exists yet (fresh insert).
    None,
}

impl ExpectedVersion {
    pub fn matches(self, actual: Option<u64>) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => actual == Some(v),
            ExpectedVersion::None => actual.is_none(),
        }
    }

    pub fn check(self, actual: Option<u64>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}
