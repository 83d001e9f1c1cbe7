use chrono::{DateTime, Utc};
use thiserror::Error;

use std::sync::Arc;

use plotbook_booking::Booking;
use plotbook_consent::{ConsentRecord, InvestorAssignment};
use plotbook_core::{
    AssignmentId, BookingId, ConsentId, CustomerId, DomainError, ExpectedVersion, InvestorId,
    PhaseId, ProjectId, TenantId, TransferId, UnitId,
};
use plotbook_parties::{Customer, Investor};
use plotbook_registry::{Phase, Project, Tenant, Unit};
use plotbook_transfer::Transfer;

/// Store operation error.
///
/// These are **infrastructure errors** (concurrency, uniqueness, lock waits)
/// as opposed to domain errors (validation, invariants). The engine maps them
/// into [`DomainError`] at the operation boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency check failed; a concurrent writer got there first.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// A uniqueness condition (booking reference) was violated.
    #[error("duplicate reference: {0}")]
    DuplicateReference(String),

    /// The quota condition attached to a project insert failed.
    #[error("project quota exceeded (limit: {limit})")]
    QuotaExceeded { limit: u32 },

    /// Lock acquisition exceeded the configured wait; retryable.
    #[error("store busy: {0}")]
    Busy(String),

    /// The unit of work itself is malformed (e.g. duplicate keys in a batch).
    #[error("invalid commit: {0}")]
    InvalidCommit(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => DomainError::Conflict(msg),
            StoreError::DuplicateReference(msg) => DomainError::Conflict(msg),
            StoreError::QuotaExceeded { limit } => DomainError::QuotaExceeded { limit },
            StoreError::Busy(msg) => DomainError::Busy(msg),
            StoreError::InvalidCommit(msg) => DomainError::Conflict(msg),
        }
    }
}

/// A batch of writes that must commit atomically.
///
/// Every write carries the [`ExpectedVersion`] observed when the entity was
/// read; the store rejects the whole batch on any mismatch. Inserts use
/// `ExpectedVersion::None` so a racing duplicate insert loses cleanly.
#[derive(Debug, Default, Clone)]
pub struct UnitOfWork {
    pub(crate) unit_writes: Vec<(Unit, ExpectedVersion)>,
    pub(crate) booking_writes: Vec<(Booking, ExpectedVersion)>,
    pub(crate) transfer_writes: Vec<(Transfer, ExpectedVersion)>,
    pub(crate) assignment_writes: Vec<(InvestorAssignment, ExpectedVersion)>,
    pub(crate) consent_writes: Vec<(ConsentRecord, ExpectedVersion)>,
    pub(crate) booking_deletes: Vec<(BookingId, ExpectedVersion)>,
    pub(crate) transfer_deletes: Vec<(TransferId, ExpectedVersion)>,
    /// Project inserts guarded by the tenant's quota, evaluated under the
    /// same writer section as the insert.
    pub(crate) project_inserts: Vec<(Project, u32)>,
    /// Booking references that must not exist anywhere in the store.
    pub(crate) unique_references: Vec<String>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_unit(mut self, unit: Unit, expected: ExpectedVersion) -> Self {
        self.unit_writes.push((unit, expected));
        self
    }

    pub fn insert_unit(self, unit: Unit) -> Self {
        self.write_unit(unit, ExpectedVersion::None)
    }

    pub fn write_booking(mut self, booking: Booking, expected: ExpectedVersion) -> Self {
        self.booking_writes.push((booking, expected));
        self
    }

    /// Insert a fresh booking, reserving its reference code.
    pub fn insert_booking(mut self, booking: Booking) -> Self {
        self.unique_references.push(booking.reference().to_string());
        self.booking_writes.push((booking, ExpectedVersion::None));
        self
    }

    pub fn write_transfer(mut self, transfer: Transfer, expected: ExpectedVersion) -> Self {
        self.transfer_writes.push((transfer, expected));
        self
    }

    pub fn insert_transfer(self, transfer: Transfer) -> Self {
        self.write_transfer(transfer, ExpectedVersion::None)
    }

    pub fn write_assignment(
        mut self,
        assignment: InvestorAssignment,
        expected: ExpectedVersion,
    ) -> Self {
        self.assignment_writes.push((assignment, expected));
        self
    }

    pub fn write_consent(mut self, consent: ConsentRecord, expected: ExpectedVersion) -> Self {
        self.consent_writes.push((consent, expected));
        self
    }

    pub fn delete_booking(mut self, id: BookingId, expected: ExpectedVersion) -> Self {
        self.booking_deletes.push((id, expected));
        self
    }

    pub fn delete_transfer(mut self, id: TransferId, expected: ExpectedVersion) -> Self {
        self.transfer_deletes.push((id, expected));
        self
    }

    /// Insert a project iff the tenant's active-project count is below
    /// `max_projects` at commit time.
    pub fn insert_project_with_quota(mut self, project: Project, max_projects: u32) -> Self {
        self.project_inserts.push((project, max_projects));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.unit_writes.is_empty()
            && self.booking_writes.is_empty()
            && self.transfer_writes.is_empty()
            && self.assignment_writes.is_empty()
            && self.consent_writes.is_empty()
            && self.booking_deletes.is_empty()
            && self.transfer_deletes.is_empty()
            && self.project_inserts.is_empty()
    }
}

/// Tenant-spanning persistent store for the reservation engine.
///
/// ## Design principles
///
/// - **No storage assumptions**: works with the in-memory implementation
///   (tests/dev) and a relational backend (production).
/// - **Plain rows, no object graph**: entities reference each other by id
///   only; the store is keyed by id.
/// - **Optimistic locking**: every read-modify-write goes through
///   [`Repository::commit`] with the versions observed at read time.
/// - **All-or-nothing**: a failed commit leaves every entity exactly as it
///   was before the call.
///
/// ## Bounded waits
///
/// Implementations must bound lock/transaction acquisition and surface the
/// timeout as [`StoreError::Busy`] rather than blocking indefinitely.
pub trait Repository: Send + Sync {
    fn unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError>;
    fn booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;
    fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError>;
    fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    fn phase(&self, id: PhaseId) -> Result<Option<Phase>, StoreError>;
    fn tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError>;
    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
    fn investor(&self, id: InvestorId) -> Result<Option<Investor>, StoreError>;
    fn assignment(&self, id: AssignmentId) -> Result<Option<InvestorAssignment>, StoreError>;
    fn consent(&self, id: ConsentId) -> Result<Option<ConsentRecord>, StoreError>;

    /// All assignments for a unit, any status.
    fn assignments_for_unit(&self, unit_id: UnitId)
        -> Result<Vec<InvestorAssignment>, StoreError>;

    /// Consent records for the given assignments, including revoked ones.
    fn consents_for_assignments(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> Result<Vec<ConsentRecord>, StoreError>;

    /// The unit's single non-cancelled booking, if any.
    fn active_booking_for_unit(&self, unit_id: UnitId) -> Result<Option<Booking>, StoreError>;

    /// Units whose hold expiry has strictly passed `now`.
    fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<UnitId>, StoreError>;

    /// Number of the tenant's projects currently counting against its quota.
    fn active_project_count(&self, tenant_id: TenantId) -> Result<usize, StoreError>;

    /// Apply a unit of work atomically.
    fn commit(&self, uow: UnitOfWork) -> Result<(), StoreError>;
}

impl<S> Repository for Arc<S>
where
    S: Repository + ?Sized,
{
    fn unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError> {
        (**self).unit(id)
    }

    fn booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        (**self).booking(id)
    }

    fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        (**self).transfer(id)
    }

    fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        (**self).project(id)
    }

    fn phase(&self, id: PhaseId) -> Result<Option<Phase>, StoreError> {
        (**self).phase(id)
    }

    fn tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        (**self).tenant(id)
    }

    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        (**self).customer(id)
    }

    fn investor(&self, id: InvestorId) -> Result<Option<Investor>, StoreError> {
        (**self).investor(id)
    }

    fn assignment(&self, id: AssignmentId) -> Result<Option<InvestorAssignment>, StoreError> {
        (**self).assignment(id)
    }

    fn consent(&self, id: ConsentId) -> Result<Option<ConsentRecord>, StoreError> {
        (**self).consent(id)
    }

    fn assignments_for_unit(
        &self,
        unit_id: UnitId,
    ) -> Result<Vec<InvestorAssignment>, StoreError> {
        (**self).assignments_for_unit(unit_id)
    }

    fn consents_for_assignments(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> Result<Vec<ConsentRecord>, StoreError> {
        (**self).consents_for_assignments(assignment_ids)
    }

    fn active_booking_for_unit(&self, unit_id: UnitId) -> Result<Option<Booking>, StoreError> {
        (**self).active_booking_for_unit(unit_id)
    }

    fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<UnitId>, StoreError> {
        (**self).expired_holds(now)
    }

    fn active_project_count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        (**self).active_project_count(tenant_id)
    }

    fn commit(&self, uow: UnitOfWork) -> Result<(), StoreError> {
        (**self).commit(uow)
    }
}
