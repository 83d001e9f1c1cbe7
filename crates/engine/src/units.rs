//! Unit registry operations.

use plotbook_auth::{authorize, ActorContext, Capability};
use plotbook_core::{DomainError, DomainResult, ExpectedVersion, UnitId, Versioned};
use plotbook_infra::{Repository, UnitOfWork};
use plotbook_registry::{Unit, UnitDraft, UnitFieldUpdate};

use crate::Engine;

impl<R: Repository> Engine<R> {
    /// Create a unit against an existing project.
    pub fn create_unit(&self, draft: UnitDraft, actor: &ActorContext) -> DomainResult<Unit> {
        authorize(actor, Capability::CreateUnit)?;

        if draft.unit_no.trim().is_empty() {
            return Err(DomainError::validation("unit_no cannot be empty"));
        }
        if draft.price == 0 {
            return Err(DomainError::validation("price must be positive"));
        }

        let project = self
            .repo()
            .project(draft.project_id)
            .map_err(DomainError::from)?
            .ok_or_else(|| {
                DomainError::invalid_reference(format!("project {} not found", draft.project_id))
            })?;
        plotbook_auth::ensure_tenant(actor, project.tenant_id)?;

        if let Some(phase_id) = draft.phase_id {
            let phase = self
                .repo()
                .phase(phase_id)
                .map_err(DomainError::from)?
                .ok_or_else(|| {
                    DomainError::invalid_reference(format!("phase {phase_id} not found"))
                })?;
            if phase.project_id != draft.project_id {
                return Err(DomainError::invalid_reference(format!(
                    "phase {phase_id} does not belong to project {}",
                    draft.project_id
                )));
            }
        }

        if let Some(investor_id) = draft.investor_id {
            let investor = self
                .repo()
                .investor(investor_id)
                .map_err(DomainError::from)?
                .ok_or_else(|| {
                    DomainError::invalid_reference(format!("investor {investor_id} not found"))
                })?;
            if investor.tenant_id != project.tenant_id {
                return Err(DomainError::invalid_reference(format!(
                    "investor {investor_id} does not belong to tenant {}",
                    project.tenant_id
                )));
            }
        }

        let unit_id = draft.unit_id;
        let unit = Unit::create(draft, actor.user_id);
        self.commit(UnitOfWork::new().insert_unit(unit))?;

        tracing::info!(unit_id = %unit_id, project_id = %project.id, "unit created");
        self.load_unit(unit_id)
    }

    /// Fetch a unit by id.
    pub fn get_unit(&self, unit_id: UnitId) -> DomainResult<Unit> {
        self.load_unit(unit_id)
    }

    /// Update non-status unit attributes.
    ///
    /// Allocation state never moves through here; [`UnitFieldUpdate`] has no
    /// status member.
    pub fn update_unit_fields(
        &self,
        unit_id: UnitId,
        update: UnitFieldUpdate,
        actor: &ActorContext,
    ) -> DomainResult<Unit> {
        authorize(actor, Capability::UpdateUnit)?;

        let mut unit = self.load_unit(unit_id)?;
        self.ensure_unit_tenant(actor, &unit)?;

        if let Some(investor_id) = update.investor_id {
            let tenant_id = self.unit_tenant(&unit)?;
            let investor = self
                .repo()
                .investor(investor_id)
                .map_err(DomainError::from)?
                .ok_or_else(|| {
                    DomainError::invalid_reference(format!("investor {investor_id} not found"))
                })?;
            if investor.tenant_id != tenant_id {
                return Err(DomainError::invalid_reference(format!(
                    "investor {investor_id} does not belong to tenant {tenant_id}"
                )));
            }
        }

        let expected = ExpectedVersion::Exact(unit.version());
        unit.apply_update(update)?;
        self.commit(UnitOfWork::new().write_unit(unit, expected))?;

        self.load_unit(unit_id)
    }

    /// Soft-retire a unit (Available/Booked → Inactive).
    pub fn deactivate_unit(&self, unit_id: UnitId, actor: &ActorContext) -> DomainResult<Unit> {
        authorize(actor, Capability::DeactivateUnit)?;

        let mut unit = self.load_unit(unit_id)?;
        self.ensure_unit_tenant(actor, &unit)?;

        let expected = ExpectedVersion::Exact(unit.version());
        unit.deactivate()?;
        self.commit(UnitOfWork::new().write_unit(unit, expected))?;

        tracing::info!(unit_id = %unit_id, "unit deactivated");
        self.load_unit(unit_id)
    }

    /// Bring a retired unit back to Available. Platform scope only.
    pub fn reactivate_unit(&self, unit_id: UnitId, actor: &ActorContext) -> DomainResult<Unit> {
        authorize(actor, Capability::ReactivateUnit)?;

        let mut unit = self.load_unit(unit_id)?;
        let expected = ExpectedVersion::Exact(unit.version());
        unit.reactivate()?;
        self.commit(UnitOfWork::new().write_unit(unit, expected))?;

        tracing::info!(unit_id = %unit_id, "unit reactivated");
        self.load_unit(unit_id)
    }
}
