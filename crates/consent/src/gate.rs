//! The consent gate.

use serde::{Deserialize, Serialize};

use plotbook_core::{AssignmentId, DomainError, DomainResult};

use crate::assignment::{ConsentRecord, InvestorAssignment};

/// Outcome of a consent check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentDecision {
    Allow,
    /// The unsatisfied assignments blocking the state change.
    Required(Vec<AssignmentId>),
}

impl ConsentDecision {
    pub fn into_result(self) -> DomainResult<()> {
        match self {
            ConsentDecision::Allow => Ok(()),
            ConsentDecision::Required(ids) => Err(DomainError::ConsentRequired(ids)),
        }
    }
}

/// Evaluate the gate for one unit.
///
/// An unlocked unit always passes. A locked unit passes only when every active
/// assignment with `consent_required` has at least one unrevoked consent
/// record; otherwise the unsatisfied assignment ids are reported.
pub fn evaluate(
    investor_locked: bool,
    assignments: &[InvestorAssignment],
    consents: &[ConsentRecord],
) -> ConsentDecision {
    if !investor_locked {
        return ConsentDecision::Allow;
    }

    let unsatisfied: Vec<AssignmentId> = assignments
        .iter()
        .filter(|a| a.is_active() && a.consent_required)
        .filter(|a| {
            !consents
                .iter()
                .any(|c| c.assignment_id == a.id && c.is_in_force())
        })
        .map(|a| a.id)
        .collect();

    if unsatisfied.is_empty() {
        ConsentDecision::Allow
    } else {
        ConsentDecision::Required(unsatisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::AssignmentStatus;
    use chrono::Utc;
    use plotbook_core::{ConsentId, InvestorId, UnitId, UserId};
    use proptest::prelude::*;

    fn assignment(consent_required: bool) -> InvestorAssignment {
        InvestorAssignment::new(
            AssignmentId::new(),
            InvestorId::new(),
            UnitId::new(),
            5_000,
            consent_required,
            UserId::new(),
        )
    }

    fn consent_for(assignment: &InvestorAssignment) -> ConsentRecord {
        ConsentRecord::grant(
            ConsentId::new(),
            assignment.id,
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn unlocked_unit_always_passes() {
        let a = assignment(true);
        assert_eq!(evaluate(false, &[a], &[]), ConsentDecision::Allow);
    }

    #[test]
    fn locked_unit_without_consent_names_the_assignment() {
        let a = assignment(true);
        let id = a.id;
        assert_eq!(
            evaluate(true, &[a], &[]),
            ConsentDecision::Required(vec![id])
        );
    }

    #[test]
    fn locked_unit_with_consent_passes() {
        let a = assignment(true);
        let c = consent_for(&a);
        assert_eq!(evaluate(true, &[a], &[c]), ConsentDecision::Allow);
    }

    #[test]
    fn revoked_consent_blocks_again() {
        let a = assignment(true);
        let mut c = consent_for(&a);
        c.revoked_at = Some(Utc::now());
        let id = a.id;
        assert_eq!(
            evaluate(true, &[a], &[c]),
            ConsentDecision::Required(vec![id])
        );
    }

    #[test]
    fn inactive_or_optional_assignments_are_ignored() {
        let mut inactive = assignment(true);
        inactive.status = AssignmentStatus::Inactive;
        let optional = assignment(false);
        assert_eq!(
            evaluate(true, &[inactive, optional], &[]),
            ConsentDecision::Allow
        );
    }

    #[test]
    fn partial_consent_reports_only_missing_assignments() {
        let granted = assignment(true);
        let missing = assignment(true);
        let c = consent_for(&granted);
        let missing_id = missing.id;
        assert_eq!(
            evaluate(true, &[granted, missing], &[c]),
            ConsentDecision::Required(vec![missing_id])
        );
    }

    proptest! {
        #[test]
        fn gate_allows_iff_every_required_assignment_is_granted(
            required in proptest::collection::vec(any::<bool>(), 0..6),
            granted in proptest::collection::vec(any::<bool>(), 0..6),
        ) {
            let assignments: Vec<InvestorAssignment> =
                required.iter().map(|r| assignment(*r)).collect();

            let consents: Vec<ConsentRecord> = assignments
                .iter()
                .zip(granted.iter().chain(std::iter::repeat(&false)))
                .filter(|(_, g)| **g)
                .map(|(a, _)| consent_for(a))
                .collect();

            let expect_allow = assignments
                .iter()
                .zip(granted.iter().chain(std::iter::repeat(&false)))
                .all(|(a, g)| !a.consent_required || *g);

            let decision = evaluate(true, &assignments, &consents);
            prop_assert_eq!(decision == ConsentDecision::Allow, expect_allow);
        }
    }
}
