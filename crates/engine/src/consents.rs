//! Investor assignments and consent administration.

use chrono::{DateTime, Utc};

use plotbook_auth::{authorize, ActorContext, Capability, Role};
use plotbook_consent::{ConsentRecord, InvestorAssignment};
use plotbook_core::{
    AssignmentId, ConsentId, DomainError, DomainResult, ExpectedVersion, InvestorId, UnitId,
};
use plotbook_infra::{Repository, UnitOfWork};

use crate::Engine;

impl<R: Repository> Engine<R> {
    /// Assign an investor stake to a unit.
    pub fn assign_investor(
        &self,
        unit_id: UnitId,
        investor_id: InvestorId,
        share_bp: u16,
        consent_required: bool,
        actor: &ActorContext,
    ) -> DomainResult<InvestorAssignment> {
        authorize(actor, Capability::AssignInvestor)?;

        if share_bp == 0 || share_bp > 10_000 {
            return Err(DomainError::validation(
                "share must be between 1 and 10000 basis points",
            ));
        }

        let unit = self.load_unit(unit_id)?;
        let tenant_id = self.ensure_unit_tenant(actor, &unit)?;

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

        let existing = self
            .repo()
            .assignments_for_unit(unit_id)
            .map_err(DomainError::from)?;
        if existing
            .iter()
            .any(|a| a.investor_id == investor_id && a.is_active())
        {
            return Err(DomainError::conflict(
                "investor is already assigned to this unit",
            ));
        }

        let assignment = InvestorAssignment::new(
            AssignmentId::new(),
            investor_id,
            unit_id,
            share_bp,
            consent_required,
            actor.user_id,
        );
        let assignment_id = assignment.id;
        self.commit(
            UnitOfWork::new().write_assignment(assignment, ExpectedVersion::None),
        )?;

        tracing::info!(unit_id = %unit_id, investor_id = %investor_id, "investor assigned");
        self.load_assignment(assignment_id)
    }

    /// Record an investor's consent for one assignment.
    ///
    /// Only the assignment's own investor (or platform scope) may grant.
    pub fn grant_consent(
        &self,
        assignment_id: AssignmentId,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<ConsentRecord> {
        authorize(actor, Capability::GrantConsent)?;

        let assignment = self.load_assignment(assignment_id)?;
        self.ensure_assignment_actor(actor, &assignment)?;

        if !assignment.is_active() {
            return Err(DomainError::validation("assignment is inactive"));
        }

        let consents = self
            .repo()
            .consents_for_assignments(&[assignment_id])
            .map_err(DomainError::from)?;
        if consents.iter().any(|c| c.is_in_force()) {
            return Err(DomainError::already_in_state("consent is already granted"));
        }

        let record = ConsentRecord::grant(ConsentId::new(), assignment_id, actor.user_id, now);
        let consent_id = record.id;
        self.commit(UnitOfWork::new().write_consent(record, ExpectedVersion::None))?;

        tracing::info!(assignment_id = %assignment_id, "consent granted");
        self.load_consent(consent_id)
    }

    /// Revoke the in-force consent for one assignment.
    pub fn revoke_consent(
        &self,
        assignment_id: AssignmentId,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<ConsentRecord> {
        authorize(actor, Capability::RevokeConsent)?;

        let assignment = self.load_assignment(assignment_id)?;
        self.ensure_assignment_actor(actor, &assignment)?;

        let consents = self
            .repo()
            .consents_for_assignments(&[assignment_id])
            .map_err(DomainError::from)?;
        let Some(active) = consents.into_iter().find(|c| c.is_in_force()) else {
            return Err(DomainError::already_in_state("no consent is in force"));
        };

        let expected = ExpectedVersion::Exact(active.version);
        let mut revoked = active;
        revoked.revoked_at = Some(now);
        let consent_id = revoked.id;
        self.commit(UnitOfWork::new().write_consent(revoked, expected))?;

        tracing::info!(assignment_id = %assignment_id, "consent revoked");
        self.load_consent(consent_id)
    }

    fn load_assignment(&self, assignment_id: AssignmentId) -> DomainResult<InvestorAssignment> {
        self.repo()
            .assignment(assignment_id)
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)
    }

    fn load_consent(&self, consent_id: ConsentId) -> DomainResult<ConsentRecord> {
        self.repo()
            .consent(consent_id)
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)
    }

    fn ensure_assignment_actor(
        &self,
        actor: &ActorContext,
        assignment: &InvestorAssignment,
    ) -> DomainResult<()> {
        if actor.role == Role::Investor && actor.investor_id != Some(assignment.investor_id) {
            return Err(DomainError::forbidden(
                "consent can only be granted by the assignment's investor",
            ));
        }
        let unit = self.load_unit(assignment.unit_id)?;
        self.ensure_unit_tenant(actor, &unit)?;
        Ok(())
    }
}
