//! Per-tenant project quota rule.
//!
//! The rule itself is pure; the store evaluates it under the same writer
//! section as the project insert so two concurrent creations can never both
//! observe a stale under-quota count.

use plotbook_core::{DomainError, DomainResult};

/// Check the active-project count against the tenant's ceiling.
pub fn check_project_quota(active_projects: usize, max_projects: u32) -> DomainResult<()> {
    if active_projects >= max_projects as usize {
        Err(DomainError::QuotaExceeded {
            limit: max_projects,
        })
    } else {
        Ok(())
    }
}
