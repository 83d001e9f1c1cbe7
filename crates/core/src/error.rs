//! Domain error model.

use thiserror::Error;

use crate::id::AssignmentId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A requested entity (unit/booking/transfer/assignment/…) is missing.
    #[error("not found")]
    NotFound,

    /// A referenced entity exists in the wrong scope, or not at all.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An illegal status change was attempted.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A redundant mutation (e.g. cancelling an already-cancelled booking).
    #[error("already in requested state: {0}")]
    AlreadyInState(String),

    /// Investor consent is outstanding for the named assignments.
    #[error("investor consent required for {n} assignment(s)", n = .0.len())]
    ConsentRequired(Vec<AssignmentId>),

    /// A hold's expiry has passed.
    #[error("hold has expired")]
    HoldExpired,

    /// Concurrent allocation lost the race (e.g. stale version, double booking).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The tenant's active-project ceiling was reached.
    #[error("project quota exceeded (limit: {limit})")]
    QuotaExceeded { limit: u32 },

    /// Actor and resource belong to different tenants.
    #[error("tenant mismatch")]
    TenantMismatch,

    /// Actor lacks the capability for this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Lock/transaction acquisition timed out; the caller may retry.
    #[error("busy: {0}")]
    Busy(String),
}

impl DomainError {
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn already_in_state(msg: impl Into<String>) -> Self {
        Self::AlreadyInState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// True for errors a caller may retry verbatim.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}
