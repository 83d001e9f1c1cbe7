//! The reservation & booking lifecycle engine.
//!
//! Every operation here follows the same pipeline: capability check → load the
//! entities with their current versions → pure domain decisions → one atomic
//! [`UnitOfWork`] commit. A commit rejected by the store surfaces as
//! `Conflict`/`Busy` and leaves every entity exactly as it was.
//!
//! The engine never authenticates: callers hand it an already-resolved
//! [`ActorContext`].

mod bookings;
mod consents;
mod holds;
mod projects;
mod transfers;
mod units;

pub use bookings::BookingRequest;
pub use transfers::TransferRequest;

use plotbook_auth::ActorContext;
use plotbook_booking::Booking;
use plotbook_consent::gate;
use plotbook_core::{
    BookingId, DomainError, DomainResult, EngineConfig, TenantId, TransferId, UnitId,
};
use plotbook_infra::{Repository, UnitOfWork};
use plotbook_registry::Unit;
use plotbook_transfer::Transfer;

/// The engine facade: an injected repository plus business-rule configuration.
///
/// Construct one at startup and share it; all state lives in the repository.
#[derive(Debug)]
pub struct Engine<R> {
    repo: R,
    config: EngineConfig,
}

impl<R> Engine<R> {
    pub fn new(repo: R, config: EngineConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<R: Repository> Engine<R> {
    pub(crate) fn repo(&self) -> &R {
        &self.repo
    }

    pub(crate) fn commit(&self, uow: UnitOfWork) -> DomainResult<()> {
        self.repo.commit(uow).map_err(DomainError::from)
    }

    pub(crate) fn load_unit(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.repo
            .unit(unit_id)
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)
    }

    pub(crate) fn load_booking(&self, booking_id: BookingId) -> DomainResult<Booking> {
        self.repo
            .booking(booking_id)
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)
    }

    pub(crate) fn load_transfer(&self, transfer_id: TransferId) -> DomainResult<Transfer> {
        self.repo
            .transfer(transfer_id)
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)
    }

    /// The tenant owning a unit, resolved through its project.
    pub(crate) fn unit_tenant(&self, unit: &Unit) -> DomainResult<TenantId> {
        let project = self
            .repo
            .project(unit.project_id())
            .map_err(DomainError::from)?
            .ok_or_else(|| {
                DomainError::invalid_reference(format!(
                    "project {} for unit {} does not exist",
                    unit.project_id(),
                    unit.unit_id()
                ))
            })?;
        Ok(project.tenant_id)
    }

    /// Tenant-scope check for a unit-anchored operation.
    pub(crate) fn ensure_unit_tenant(
        &self,
        actor: &ActorContext,
        unit: &Unit,
    ) -> DomainResult<TenantId> {
        let tenant_id = self.unit_tenant(unit)?;
        plotbook_auth::ensure_tenant(actor, tenant_id)?;
        Ok(tenant_id)
    }

    /// Evaluate the consent gate for a unit.
    pub(crate) fn check_consent(&self, unit: &Unit) -> DomainResult<()> {
        if !unit.investor_locked() {
            return Ok(());
        }
        let assignments = self
            .repo
            .assignments_for_unit(unit.unit_id())
            .map_err(DomainError::from)?;
        let assignment_ids: Vec<_> = assignments.iter().map(|a| a.id).collect();
        let consents = self
            .repo
            .consents_for_assignments(&assignment_ids)
            .map_err(DomainError::from)?;

        gate::evaluate(unit.investor_locked(), &assignments, &consents).into_result()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use plotbook_auth::{ActorContext, Role};
    use plotbook_core::{
        CustomerId, EngineConfig, InvestorId, PhaseId, ProjectId, TenantId, UnitId, UserId,
    };
    use plotbook_infra::InMemoryStore;
    use plotbook_parties::{Customer, Investor};
    use plotbook_registry::{Phase, Tenant, UnitDraft, UnitType};

    use crate::Engine;

    /// One tenant with a project, a phase, two customers and an investor.
    pub(crate) struct Fixture {
        pub store: Arc<InMemoryStore>,
        pub engine: Engine<Arc<InMemoryStore>>,
        pub tenant_id: TenantId,
        pub project_id: ProjectId,
        pub phase_id: PhaseId,
        pub customer_a: CustomerId,
        pub customer_b: CustomerId,
        pub investor_id: InvestorId,
        pub platform: ActorContext,
        pub admin: ActorContext,
        pub agent: ActorContext,
    }

    impl Fixture {
        pub fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let engine = Engine::new(Arc::clone(&store), EngineConfig::default());

            let tenant_id = TenantId::new();
            store
                .seed_tenant(Tenant::new(tenant_id, "Acme Estates", 10))
                .unwrap();

            let admin = ActorContext::new(UserId::new(), Role::Admin, Some(tenant_id));
            let agent = ActorContext::new(UserId::new(), Role::SalesAgent, Some(tenant_id));
            let platform = ActorContext::new(UserId::new(), Role::MasterAdmin, None);

            let project = engine
                .create_project(tenant_id, "Acme Gardens", &admin)
                .unwrap();
            let phase_id = PhaseId::new();
            store
                .seed_phase(Phase {
                    id: phase_id,
                    project_id: project.id,
                    name: "Phase 1".to_string(),
                })
                .unwrap();

            let customer_a = CustomerId::new();
            let customer_b = CustomerId::new();
            store
                .seed_customer(Customer::new(customer_a, tenant_id, "Nadia Iqbal"))
                .unwrap();
            store
                .seed_customer(Customer::new(customer_b, tenant_id, "Omar Farooq"))
                .unwrap();

            let investor_id = InvestorId::new();
            store
                .seed_investor(Investor::new(investor_id, tenant_id, "Crescent Capital"))
                .unwrap();

            Self {
                store,
                engine,
                tenant_id,
                project_id: project.id,
                phase_id,
                customer_a,
                customer_b,
                investor_id,
                platform,
                admin,
                agent,
            }
        }

        pub fn unit_draft(&self) -> UnitDraft {
            UnitDraft {
                unit_id: UnitId::new(),
                project_id: self.project_id,
                phase_id: Some(self.phase_id),
                unit_no: "A-101".to_string(),
                unit_type: UnitType::Plot,
                category: None,
                size_sqft: Some(1_800),
                price: 1_000_000,
                investor_locked: false,
                investor_id: None,
                remarks: None,
            }
        }

        pub fn admin_for_other_tenant(&self) -> ActorContext {
            ActorContext::new(UserId::new(), Role::Admin, Some(TenantId::new()))
        }

        pub fn investor_actor(&self) -> ActorContext {
            ActorContext::new(UserId::new(), Role::Investor, Some(self.tenant_id))
                .with_investor(self.investor_id)
        }
    }
}
