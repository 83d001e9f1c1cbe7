//! Project creation under the tenant quota guard.

use plotbook_auth::{authorize, ActorContext, Capability};
use plotbook_core::{DomainError, DomainResult, ProjectId, TenantId};
use plotbook_infra::{Repository, UnitOfWork};
use plotbook_registry::{check_project_quota, Project, Tenant};

use crate::Engine;

impl<R: Repository> Engine<R> {
    /// Advisory quota probe.
    ///
    /// A passing probe does not reserve anything: [`Engine::create_project`]
    /// re-evaluates the quota atomically with the insert.
    pub fn reserve_project_slot(&self, tenant_id: TenantId) -> DomainResult<()> {
        let tenant = self.load_tenant(tenant_id)?;
        let active = self
            .repo()
            .active_project_count(tenant_id)
            .map_err(DomainError::from)?;
        check_project_quota(active, self.project_limit(&tenant))
    }

    /// Create a project, holding one of the tenant's quota slots.
    ///
    /// The quota count and the insert commit as a single atomic unit; two
    /// concurrent creations can never both observe a stale under-quota count.
    pub fn create_project(
        &self,
        tenant_id: TenantId,
        name: &str,
        actor: &ActorContext,
    ) -> DomainResult<Project> {
        authorize(actor, Capability::CreateProject)?;
        plotbook_auth::ensure_tenant(actor, tenant_id)?;

        if name.trim().is_empty() {
            return Err(DomainError::validation("project name cannot be empty"));
        }

        let tenant = self.load_tenant(tenant_id)?;
        let limit = self.project_limit(&tenant);

        let project_id = ProjectId::new();
        let project = Project::new(project_id, tenant_id, name, actor.user_id);
        self.commit(UnitOfWork::new().insert_project_with_quota(project, limit))?;

        tracing::info!(project_id = %project_id, tenant_id = %tenant_id, "project created");
        self.repo()
            .project(project_id)
            .map_err(DomainError::from)?
            .ok_or(DomainError::NotFound)
    }

    fn load_tenant(&self, tenant_id: TenantId) -> DomainResult<Tenant> {
        self.repo()
            .tenant(tenant_id)
            .map_err(DomainError::from)?
            .ok_or_else(|| DomainError::invalid_reference(format!("tenant {tenant_id} not found")))
    }

    /// A tenant with no explicit ceiling (0) falls back to the configured
    /// default.
    fn project_limit(&self, tenant: &Tenant) -> u32 {
        if tenant.max_projects > 0 {
            tenant.max_projects
        } else {
            self.config().default_max_projects
        }
    }
}
