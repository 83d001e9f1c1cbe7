use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plotbook_core::{
    DomainError, DomainResult, InvestorId, PhaseId, ProjectId, UnitId, UserId, Versioned,
};

/// Unit allocation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    OnHold,
    Booked,
    Sold,
    Inactive,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Available => "available",
            UnitStatus::OnHold => "on_hold",
            UnitStatus::Booked => "booked",
            UnitStatus::Sold => "sold",
            UnitStatus::Inactive => "inactive",
        }
    }

    /// The directed transition table.
    ///
    /// Sold is terminal. Inactive is reachable from Available/Booked through
    /// explicit deactivation; the reverse edge exists only for the
    /// platform-level reactivation operation.
    pub fn can_transition_to(self, next: UnitStatus) -> bool {
        use UnitStatus::*;
        match self {
            Available => matches!(next, OnHold | Booked | Inactive),
            OnHold => matches!(next, Available | Booked),
            Booked => matches!(next, Available | Sold | Inactive),
            Sold => false,
            Inactive => matches!(next, Available),
        }
    }
}

impl core::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical kind of a sellable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Plot,
    File,
    Flat,
    Villa,
    Commercial,
}

/// Zoning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Residential,
    Commercial,
    Agricultural,
}

/// Creation payload for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDraft {
    pub unit_id: UnitId,
    pub project_id: ProjectId,
    pub phase_id: Option<PhaseId>,
    pub unit_no: String,
    pub unit_type: UnitType,
    pub category: Option<Category>,
    pub size_sqft: Option<u32>,
    /// Price in smallest currency unit.
    pub price: u64,
    pub investor_locked: bool,
    pub investor_id: Option<InvestorId>,
    pub remarks: Option<String>,
}

/// Non-status field update for a unit.
///
/// Status is deliberately unrepresentable here: allocation state only ever
/// moves through the reservation/booking/transfer operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFieldUpdate {
    pub unit_no: Option<String>,
    pub unit_type: Option<UnitType>,
    pub category: Option<Category>,
    pub size_sqft: Option<u32>,
    pub price: Option<u64>,
    pub investor_locked: Option<bool>,
    pub investor_id: Option<InvestorId>,
    pub remarks: Option<String>,
}

impl UnitFieldUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A sellable unit (plot, flat, villa, …).
///
/// Invariant: `hold_expires_at` is set iff status is OnHold, and `held_by` is
/// set iff status is OnHold or Booked. The guarded mutators below maintain
/// this; nothing else may change `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    project_id: ProjectId,
    phase_id: Option<PhaseId>,
    unit_no: String,
    unit_type: UnitType,
    category: Option<Category>,
    size_sqft: Option<u32>,
    price: u64,
    status: UnitStatus,
    hold_expires_at: Option<DateTime<Utc>>,
    held_by: Option<UserId>,
    investor_locked: bool,
    investor_id: Option<InvestorId>,
    remarks: Option<String>,
    created_by: UserId,
    version: u64,
}

impl Unit {
    /// Create a fresh, available unit from a draft.
    pub fn create(draft: UnitDraft, created_by: UserId) -> Self {
        Self {
            id: draft.unit_id,
            project_id: draft.project_id,
            phase_id: draft.phase_id,
            unit_no: draft.unit_no,
            unit_type: draft.unit_type,
            category: draft.category,
            size_sqft: draft.size_sqft,
            price: draft.price,
            status: UnitStatus::Available,
            hold_expires_at: None,
            held_by: None,
            investor_locked: draft.investor_locked,
            investor_id: draft.investor_id,
            remarks: draft.remarks,
            created_by,
            version: 0,
        }
    }

    pub fn unit_id(&self) -> UnitId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn phase_id(&self) -> Option<PhaseId> {
        self.phase_id
    }

    pub fn unit_no(&self) -> &str {
        &self.unit_no
    }

    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn hold_expires_at(&self) -> Option<DateTime<Utc>> {
        self.hold_expires_at
    }

    pub fn held_by(&self) -> Option<UserId> {
        self.held_by
    }

    pub fn investor_locked(&self) -> bool {
        self.investor_locked
    }

    pub fn investor_id(&self) -> Option<InvestorId> {
        self.investor_id
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// True when an active hold has passed its expiry.
    pub fn hold_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == UnitStatus::OnHold
            && self.hold_expires_at.map(|exp| now > exp).unwrap_or(false)
    }

    fn guard(&self, next: UnitStatus) -> DomainResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(format!(
                "cannot transition unit from {} to {}",
                self.status, next
            )))
        }
    }

    /// Available → OnHold.
    pub fn place_hold(&mut self, holder: UserId, expires_at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != UnitStatus::Available {
            return Err(DomainError::invalid_transition(format!(
                "only available units can be held (current status: {})",
                self.status
            )));
        }
        self.guard(UnitStatus::OnHold)?;
        self.status = UnitStatus::OnHold;
        self.held_by = Some(holder);
        self.hold_expires_at = Some(expires_at);
        Ok(())
    }

    /// OnHold/Booked → Available, clearing holder and expiry.
    pub fn make_available(&mut self) -> DomainResult<()> {
        self.guard(UnitStatus::Available)?;
        self.status = UnitStatus::Available;
        self.held_by = None;
        self.hold_expires_at = None;
        Ok(())
    }

    /// Available/OnHold → Booked.
    pub fn book(&mut self, holder: UserId) -> DomainResult<()> {
        self.guard(UnitStatus::Booked)?;
        self.status = UnitStatus::Booked;
        self.held_by = Some(holder);
        self.hold_expires_at = None;
        Ok(())
    }

    /// Booked → Sold (terminal).
    pub fn mark_sold(&mut self) -> DomainResult<()> {
        self.guard(UnitStatus::Sold)?;
        self.status = UnitStatus::Sold;
        self.held_by = None;
        self.hold_expires_at = None;
        Ok(())
    }

    /// Available/Booked → Inactive (soft retirement).
    pub fn deactivate(&mut self) -> DomainResult<()> {
        self.guard(UnitStatus::Inactive)?;
        self.status = UnitStatus::Inactive;
        self.held_by = None;
        self.hold_expires_at = None;
        Ok(())
    }

    /// Inactive → Available (platform-level reactivation).
    pub fn reactivate(&mut self) -> DomainResult<()> {
        if self.status != UnitStatus::Inactive {
            return Err(DomainError::invalid_transition(format!(
                "only inactive units can be reactivated (current status: {})",
                self.status
            )));
        }
        self.status = UnitStatus::Available;
        Ok(())
    }

    /// Apply a non-status field update.
    pub fn apply_update(&mut self, update: UnitFieldUpdate) -> DomainResult<()> {
        if update.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        if let Some(unit_no) = update.unit_no {
            if unit_no.trim().is_empty() {
                return Err(DomainError::validation("unit_no cannot be empty"));
            }
            self.unit_no = unit_no;
        }
        if let Some(unit_type) = update.unit_type {
            self.unit_type = unit_type;
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(size_sqft) = update.size_sqft {
            self.size_sqft = Some(size_sqft);
        }
        if let Some(price) = update.price {
            if price == 0 {
                return Err(DomainError::validation("price must be positive"));
            }
            self.price = price;
        }
        if let Some(locked) = update.investor_locked {
            self.investor_locked = locked;
        }
        if let Some(investor_id) = update.investor_id {
            self.investor_id = Some(investor_id);
        }
        if let Some(remarks) = update.remarks {
            self.remarks = Some(remarks);
        }
        Ok(())
    }

    #[doc(hidden)]
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Versioned for Unit {
    type Id = UnitId;

    fn id(&self) -> UnitId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn test_unit() -> Unit {
        Unit::create(
            UnitDraft {
                unit_id: UnitId::new(),
                project_id: ProjectId::new(),
                phase_id: None,
                unit_no: "A-101".to_string(),
                unit_type: UnitType::Plot,
                category: Some(Category::Residential),
                size_sqft: Some(1_800),
                price: 1_000_000,
                investor_locked: false,
                investor_id: None,
                remarks: None,
            },
            UserId::new(),
        )
    }

    #[test]
    fn fresh_unit_is_available_with_no_hold_state() {
        let unit = test_unit();
        assert_eq!(unit.status(), UnitStatus::Available);
        assert_eq!(unit.held_by(), None);
        assert_eq!(unit.hold_expires_at(), None);
        assert_eq!(unit.version(), 0);
    }

    #[test]
    fn place_hold_sets_holder_and_expiry() {
        let mut unit = test_unit();
        let holder = UserId::new();
        let expires = Utc::now() + Duration::hours(168);

        unit.place_hold(holder, expires).unwrap();
        assert_eq!(unit.status(), UnitStatus::OnHold);
        assert_eq!(unit.held_by(), Some(holder));
        assert_eq!(unit.hold_expires_at(), Some(expires));
    }

    #[test]
    fn place_hold_rejected_unless_available() {
        let mut unit = test_unit();
        unit.book(UserId::new()).unwrap();

        let before = unit.clone();
        let err = unit.place_hold(UserId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(unit, before);
    }

    #[test]
    fn booked_to_sold_is_terminal() {
        let mut unit = test_unit();
        unit.book(UserId::new()).unwrap();
        unit.mark_sold().unwrap();
        assert_eq!(unit.held_by(), None);

        assert!(unit.make_available().is_err());
        assert!(unit.book(UserId::new()).is_err());
        assert!(unit.deactivate().is_err());
    }

    #[test]
    fn hold_expiry_comparison_is_strict() {
        let mut unit = test_unit();
        let expires = Utc::now();
        unit.place_hold(UserId::new(), expires).unwrap();

        assert!(!unit.hold_expired(expires));
        assert!(unit.hold_expired(expires + Duration::seconds(1)));
    }

    #[test]
    fn reactivate_only_from_inactive() {
        let mut unit = test_unit();
        assert!(unit.reactivate().is_err());

        unit.deactivate().unwrap();
        unit.reactivate().unwrap();
        assert_eq!(unit.status(), UnitStatus::Available);
    }

    #[test]
    fn status_vocabulary_matches_the_wire_format() {
        assert_eq!(
            serde_json::to_value(UnitStatus::OnHold).unwrap(),
            serde_json::json!("on_hold")
        );
        assert_eq!(
            serde_json::to_value(UnitStatus::Available).unwrap(),
            serde_json::json!("available")
        );
        assert_eq!(
            serde_json::to_value(UnitType::Plot).unwrap(),
            serde_json::json!("plot")
        );
        assert_eq!(
            serde_json::from_value::<UnitStatus>(serde_json::json!("sold")).unwrap(),
            UnitStatus::Sold
        );
    }

    #[test]
    fn update_rejects_empty_field_set() {
        let mut unit = test_unit();
        let err = unit.apply_update(UnitFieldUpdate::default()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_never_touches_status() {
        let mut unit = test_unit();
        unit.place_hold(UserId::new(), Utc::now() + Duration::hours(1))
            .unwrap();

        unit.apply_update(UnitFieldUpdate {
            price: Some(1_250_000),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(unit.status(), UnitStatus::OnHold);
        assert_eq!(unit.price(), 1_250_000);
    }

    fn any_status() -> impl Strategy<Value = UnitStatus> {
        prop_oneof![
            Just(UnitStatus::Available),
            Just(UnitStatus::OnHold),
            Just(UnitStatus::Booked),
            Just(UnitStatus::Sold),
            Just(UnitStatus::Inactive),
        ]
    }

    proptest! {
        #[test]
        fn no_self_transitions(status in any_status()) {
            prop_assert!(!status.can_transition_to(status));
        }

        #[test]
        fn sold_is_terminal(next in any_status()) {
            prop_assert!(!UnitStatus::Sold.can_transition_to(next));
        }

        #[test]
        fn inactive_only_reopens_to_available(next in any_status()) {
            let allowed = UnitStatus::Inactive.can_transition_to(next);
            prop_assert_eq!(allowed, next == UnitStatus::Available);
        }

        #[test]
        fn mutators_maintain_hold_invariant(
            holder_seed in any::<u128>(),
            step in 0usize..5,
        ) {
            let mut unit = test_unit();
            let holder = UserId::from_uuid(uuid::Uuid::from_u128(holder_seed));
            let expires = Utc::now() + Duration::hours(1);

            // Drive the unit through an arbitrary prefix of its lifecycle.
            let _ = match step {
                0 => unit.place_hold(holder, expires).map(|_| ()),
                1 => unit.book(holder),
                2 => unit.place_hold(holder, expires).and_then(|_| unit.book(holder)),
                3 => unit.book(holder).and_then(|_| unit.mark_sold()),
                _ => unit.deactivate(),
            };

            match unit.status() {
                UnitStatus::OnHold => {
                    prop_assert!(unit.held_by().is_some());
                    prop_assert!(unit.hold_expires_at().is_some());
                }
                UnitStatus::Booked => {
                    prop_assert!(unit.held_by().is_some());
                    prop_assert!(unit.hold_expires_at().is_none());
                }
                UnitStatus::Available | UnitStatus::Sold | UnitStatus::Inactive => {
                    prop_assert!(unit.held_by().is_none());
                    prop_assert!(unit.hold_expires_at().is_none());
                }
            }
        }
    }
}
