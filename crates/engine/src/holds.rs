//! Hold placement, release and the expiry sweep.

use chrono::{DateTime, Duration, Utc};

use plotbook_auth::{authorize, ActorContext, Capability};
use plotbook_core::{DomainError, DomainResult, ExpectedVersion, UnitId, Versioned};
use plotbook_infra::{Repository, UnitOfWork};
use plotbook_registry::{Unit, UnitStatus};

use crate::Engine;

impl<R: Repository> Engine<R> {
    /// Place a time-bounded hold on an available unit.
    ///
    /// `ttl` defaults to the configured hold lifetime. Two racing holds on the
    /// same unit resolve to exactly one winner; the loser sees `Conflict`.
    pub fn place_hold(
        &self,
        unit_id: UnitId,
        actor: &ActorContext,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> DomainResult<Unit> {
        authorize(actor, Capability::PlaceHold)?;

        let ttl = ttl.unwrap_or_else(|| self.config().hold_ttl());
        if ttl <= Duration::zero() {
            return Err(DomainError::validation("hold ttl must be positive"));
        }
        if ttl > self.config().hold_ttl() + self.config().max_hold_extension() {
            return Err(DomainError::validation(format!(
                "hold ttl exceeds the maximum of {} hours",
                self.config().default_hold_expiry_hours + self.config().max_hold_extension_hours
            )));
        }

        let mut unit = self.load_unit(unit_id)?;
        self.ensure_unit_tenant(actor, &unit)?;

        // Status rules outrank the consent gate: a non-available locked unit
        // reports InvalidTransition, not ConsentRequired.
        if unit.status() != UnitStatus::Available {
            return Err(DomainError::invalid_transition(format!(
                "only available units can be held (current status: {})",
                unit.status()
            )));
        }
        self.check_consent(&unit)?;

        let expected = ExpectedVersion::Exact(unit.version());
        unit.place_hold(actor.user_id, now + ttl)?;
        self.commit(UnitOfWork::new().write_unit(unit, expected))?;

        tracing::info!(unit_id = %unit_id, holder = %actor.user_id, "hold placed");
        self.load_unit(unit_id)
    }

    /// Explicitly release an active hold.
    ///
    /// Only the holder or an elevated actor may release; the same rule as
    /// converting a hold into a booking.
    pub fn release_hold(&self, unit_id: UnitId, actor: &ActorContext) -> DomainResult<Unit> {
        authorize(actor, Capability::ReleaseHold)?;

        let mut unit = self.load_unit(unit_id)?;
        self.ensure_unit_tenant(actor, &unit)?;

        if unit.status() != UnitStatus::OnHold {
            return Err(DomainError::invalid_transition(format!(
                "unit has no active hold (current status: {})",
                unit.status()
            )));
        }

        if unit.held_by() != Some(actor.user_id) && !actor.is_elevated() {
            return Err(DomainError::forbidden(
                "only the holder or an elevated actor can release a hold",
            ));
        }

        let expected = ExpectedVersion::Exact(unit.version());
        unit.make_available()?;
        self.commit(UnitOfWork::new().write_unit(unit, expected))?;

        tracing::info!(unit_id = %unit_id, "hold released");
        self.load_unit(unit_id)
    }

    /// Sweep every hold whose expiry has strictly passed, reverting the units
    /// to Available.
    ///
    /// Each unit is reverted in its own atomic commit; a unit that a
    /// concurrent conversion has already moved simply drops out of the sweep.
    /// Repeating the call is a no-op for already-swept units.
    pub fn expire_holds(
        &self,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<UnitId>> {
        authorize(actor, Capability::SweepHolds)?;

        let candidates = self.repo().expired_holds(now).map_err(DomainError::from)?;
        let mut swept = Vec::with_capacity(candidates.len());

        for unit_id in candidates {
            let Some(mut unit) = self.repo().unit(unit_id).map_err(DomainError::from)? else {
                continue;
            };
            if !unit.hold_expired(now) {
                // Someone converted or released it between the scan and here.
                continue;
            }

            let expected = ExpectedVersion::Exact(unit.version());
            if unit.make_available().is_err() {
                continue;
            }
            match self.commit(UnitOfWork::new().write_unit(unit, expected)) {
                Ok(()) => {
                    tracing::info!(unit_id = %unit_id, "expired hold swept");
                    swept.push(unit_id);
                }
                Err(DomainError::Conflict(_)) => {
                    // Lost the unit's lock race to an in-flight conversion.
                    tracing::debug!(unit_id = %unit_id, "sweep lost race, skipping");
                }
                Err(other) => return Err(other),
            }
        }

        Ok(swept)
    }
}
