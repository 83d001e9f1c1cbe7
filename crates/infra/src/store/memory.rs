use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use plotbook_booking::Booking;
use plotbook_consent::{ConsentRecord, InvestorAssignment};
use plotbook_core::{
    AssignmentId, BookingId, ConsentId, CustomerId, ExpectedVersion, InvestorId, PhaseId,
    ProjectId, TenantId, TransferId, UnitId, Versioned,
};
use plotbook_parties::{Customer, Investor};
use plotbook_registry::{Phase, Project, Tenant, Unit};
use plotbook_transfer::Transfer;

use super::repository::{Repository, StoreError, UnitOfWork};

/// How long to sleep between lock-acquisition attempts.
const LOCK_SPIN: Duration = Duration::from_micros(50);

#[derive(Debug, Default)]
struct World {
    units: HashMap<UnitId, Unit>,
    bookings: HashMap<BookingId, Booking>,
    transfers: HashMap<TransferId, Transfer>,
    projects: HashMap<ProjectId, Project>,
    assignments: HashMap<AssignmentId, InvestorAssignment>,
    consents: HashMap<ConsentId, ConsentRecord>,
    tenants: HashMap<TenantId, Tenant>,
    phases: HashMap<PhaseId, Phase>,
    customers: HashMap<CustomerId, Customer>,
    investors: HashMap<InvestorId, Investor>,
    /// Uniqueness index over live booking reference codes.
    booking_refs: HashSet<String>,
}

impl World {
    fn active_project_count(&self, tenant_id: TenantId) -> usize {
        self.projects
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.counts_against_quota())
            .count()
    }
}

/// In-memory implementation of [`Repository`].
///
/// One `RwLock` over the whole world: `commit` is the single writer section,
/// which is what makes every unit of work all-or-nothing. Intended for tests
/// and dev; not optimized for large datasets.
#[derive(Debug)]
pub struct InMemoryStore {
    inner: RwLock<World>,
    lock_wait: Duration,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_lock_wait(Duration::from_millis(2_000))
    }

    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            inner: RwLock::new(World::default()),
            lock_wait,
        }
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, World>, StoreError> {
        let deadline = Instant::now() + self.lock_wait;
        loop {
            match self.inner.try_read() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => {
                    return Err(StoreError::Busy("lock poisoned".to_string()));
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::Busy(
                            "timed out waiting for read lock".to_string(),
                        ));
                    }
                    std::thread::sleep(LOCK_SPIN);
                }
            }
        }
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, World>, StoreError> {
        let deadline = Instant::now() + self.lock_wait;
        loop {
            match self.inner.try_write() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => {
                    return Err(StoreError::Busy("lock poisoned".to_string()));
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        tracing::debug!("store write lock wait exceeded {:?}", self.lock_wait);
                        return Err(StoreError::Busy(
                            "timed out waiting for write lock".to_string(),
                        ));
                    }
                    std::thread::sleep(LOCK_SPIN);
                }
            }
        }
    }

    /// Seed a tenant record (bootstrap/test fixture; tenant CRUD is external).
    pub fn seed_tenant(&self, tenant: Tenant) -> Result<(), StoreError> {
        let mut world = self.write_guard()?;
        world.tenants.insert(tenant.id, tenant);
        Ok(())
    }

    /// Seed a phase/block record.
    pub fn seed_phase(&self, phase: Phase) -> Result<(), StoreError> {
        let mut world = self.write_guard()?;
        world.phases.insert(phase.id, phase);
        Ok(())
    }

    /// Seed a customer record.
    pub fn seed_customer(&self, customer: Customer) -> Result<(), StoreError> {
        let mut world = self.write_guard()?;
        world.customers.insert(customer.id, customer);
        Ok(())
    }

    /// Seed an investor record.
    pub fn seed_investor(&self, investor: Investor) -> Result<(), StoreError> {
        let mut world = self.write_guard()?;
        world.investors.insert(investor.id, investor);
        Ok(())
    }
}

fn next_version(
    current: Option<u64>,
    expected: ExpectedVersion,
    what: &str,
) -> Result<u64, StoreError> {
    if expected.matches(current) {
        Ok(current.unwrap_or(0) + 1)
    } else {
        Err(StoreError::Conflict(format!(
            "{what}: expected {expected:?}, found {current:?}"
        )))
    }
}

fn reject_batch_duplicates<I, T>(ids: I, what: &str) -> Result<(), StoreError>
where
    I: IntoIterator<Item = T>,
    T: Eq + std::hash::Hash,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::InvalidCommit(format!(
                "batch writes the same {what} twice"
            )));
        }
    }
    Ok(())
}

impl Repository for InMemoryStore {
    fn unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError> {
        Ok(self.read_guard()?.units.get(&id).cloned())
    }

    fn booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.read_guard()?.bookings.get(&id).cloned())
    }

    fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        Ok(self.read_guard()?.transfers.get(&id).cloned())
    }

    fn project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.read_guard()?.projects.get(&id).cloned())
    }

    fn phase(&self, id: PhaseId) -> Result<Option<Phase>, StoreError> {
        Ok(self.read_guard()?.phases.get(&id).cloned())
    }

    fn tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        Ok(self.read_guard()?.tenants.get(&id).cloned())
    }

    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.read_guard()?.customers.get(&id).cloned())
    }

    fn investor(&self, id: InvestorId) -> Result<Option<Investor>, StoreError> {
        Ok(self.read_guard()?.investors.get(&id).cloned())
    }

    fn assignment(&self, id: AssignmentId) -> Result<Option<InvestorAssignment>, StoreError> {
        Ok(self.read_guard()?.assignments.get(&id).cloned())
    }

    fn consent(&self, id: ConsentId) -> Result<Option<ConsentRecord>, StoreError> {
        Ok(self.read_guard()?.consents.get(&id).cloned())
    }

    fn assignments_for_unit(
        &self,
        unit_id: UnitId,
    ) -> Result<Vec<InvestorAssignment>, StoreError> {
        let world = self.read_guard()?;
        Ok(world
            .assignments
            .values()
            .filter(|a| a.unit_id == unit_id)
            .cloned()
            .collect())
    }

    fn consents_for_assignments(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> Result<Vec<ConsentRecord>, StoreError> {
        let world = self.read_guard()?;
        Ok(world
            .consents
            .values()
            .filter(|c| assignment_ids.contains(&c.assignment_id))
            .cloned()
            .collect())
    }

    fn active_booking_for_unit(&self, unit_id: UnitId) -> Result<Option<Booking>, StoreError> {
        let world = self.read_guard()?;
        Ok(world
            .bookings
            .values()
            .find(|b| b.unit_id() == unit_id && b.is_active())
            .cloned())
    }

    fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<UnitId>, StoreError> {
        let world = self.read_guard()?;
        Ok(world
            .units
            .values()
            .filter(|u| u.hold_expired(now))
            .map(|u| u.unit_id())
            .collect())
    }

    fn active_project_count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        Ok(self.read_guard()?.active_project_count(tenant_id))
    }

    fn commit(&self, uow: UnitOfWork) -> Result<(), StoreError> {
        if uow.is_empty() {
            return Ok(());
        }

        let mut world = self.write_guard()?;

        // Validate first, mutate only once everything has passed: a rejected
        // unit of work must leave the world untouched.
        reject_batch_duplicates(uow.unit_writes.iter().map(|(u, _)| u.unit_id()), "unit")?;
        reject_batch_duplicates(
            uow.booking_writes
                .iter()
                .map(|(b, _)| b.booking_id())
                .chain(uow.booking_deletes.iter().map(|(id, _)| *id)),
            "booking",
        )?;
        reject_batch_duplicates(
            uow.transfer_writes
                .iter()
                .map(|(t, _)| t.transfer_id())
                .chain(uow.transfer_deletes.iter().map(|(id, _)| *id)),
            "transfer",
        )?;
        reject_batch_duplicates(uow.assignment_writes.iter().map(|(a, _)| a.id), "assignment")?;
        reject_batch_duplicates(uow.consent_writes.iter().map(|(c, _)| c.id), "consent")?;
        reject_batch_duplicates(uow.project_inserts.iter().map(|(p, _)| p.id), "project")?;

        for (unit, expected) in &uow.unit_writes {
            let current = world.units.get(&unit.unit_id()).map(|u| u.version());
            next_version(current, *expected, "unit")?;
        }
        for (booking, expected) in &uow.booking_writes {
            let current = world.bookings.get(&booking.booking_id()).map(|b| b.version());
            next_version(current, *expected, "booking")?;
        }
        for (transfer, expected) in &uow.transfer_writes {
            let current = world
                .transfers
                .get(&transfer.transfer_id())
                .map(|t| t.version());
            next_version(current, *expected, "transfer")?;
        }
        for (assignment, expected) in &uow.assignment_writes {
            let current = world.assignments.get(&assignment.id).map(|a| a.version);
            next_version(current, *expected, "assignment")?;
        }
        for (consent, expected) in &uow.consent_writes {
            let current = world.consents.get(&consent.id).map(|c| c.version);
            next_version(current, *expected, "consent")?;
        }
        for (id, expected) in &uow.booking_deletes {
            let current = world.bookings.get(id).map(|b| b.version());
            if current.is_none() {
                return Err(StoreError::Conflict(format!(
                    "booking delete: row {id} does not exist"
                )));
            }
            next_version(current, *expected, "booking delete")?;
        }
        for (id, expected) in &uow.transfer_deletes {
            let current = world.transfers.get(id).map(|t| t.version());
            if current.is_none() {
                return Err(StoreError::Conflict(format!(
                    "transfer delete: row {id} does not exist"
                )));
            }
            next_version(current, *expected, "transfer delete")?;
        }

        reject_batch_duplicates(uow.unique_references.iter(), "booking reference")?;
        for reference in &uow.unique_references {
            if world.booking_refs.contains(reference) {
                tracing::debug!(reference = %reference, "booking reference collision");
                return Err(StoreError::DuplicateReference(reference.clone()));
            }
        }

        // Quota conditions are checked under this same writer section, so two
        // racing project inserts can never both observe a stale count.
        let mut staged_per_tenant: HashMap<TenantId, usize> = HashMap::new();
        for (project, max_projects) in &uow.project_inserts {
            if world.projects.contains_key(&project.id) {
                return Err(StoreError::Conflict(format!(
                    "project {} already exists",
                    project.id
                )));
            }
            let staged = staged_per_tenant.entry(project.tenant_id).or_insert(0);
            let active = world.active_project_count(project.tenant_id) + *staged;
            if active >= *max_projects as usize {
                return Err(StoreError::QuotaExceeded {
                    limit: *max_projects,
                });
            }
            *staged += 1;
        }

        // Apply. Versions advance by one per committed entity.
        for (mut unit, _) in uow.unit_writes {
            let current = world.units.get(&unit.unit_id()).map(|u| u.version());
            unit.set_version(current.unwrap_or(0) + 1);
            world.units.insert(unit.unit_id(), unit);
        }
        for (mut booking, _) in uow.booking_writes {
            let current = world.bookings.get(&booking.booking_id()).map(|b| b.version());
            booking.set_version(current.unwrap_or(0) + 1);
            world.booking_refs.insert(booking.reference().to_string());
            world.bookings.insert(booking.booking_id(), booking);
        }
        for (mut transfer, _) in uow.transfer_writes {
            let current = world
                .transfers
                .get(&transfer.transfer_id())
                .map(|t| t.version());
            transfer.set_version(current.unwrap_or(0) + 1);
            world.transfers.insert(transfer.transfer_id(), transfer);
        }
        for (mut assignment, _) in uow.assignment_writes {
            let current = world.assignments.get(&assignment.id).map(|a| a.version);
            assignment.version = current.unwrap_or(0) + 1;
            world.assignments.insert(assignment.id, assignment);
        }
        for (mut consent, _) in uow.consent_writes {
            let current = world.consents.get(&consent.id).map(|c| c.version);
            consent.version = current.unwrap_or(0) + 1;
            world.consents.insert(consent.id, consent);
        }
        for (id, _) in uow.booking_deletes {
            if let Some(removed) = world.bookings.remove(&id) {
                world.booking_refs.remove(removed.reference());
            }
        }
        for (id, _) in uow.transfer_deletes {
            world.transfers.remove(&id);
        }
        for (mut project, _) in uow.project_inserts {
            project.version = 1;
            world.projects.insert(project.id, project);
        }

        Ok(())
    }
}
