//! End-to-end lifecycle and concurrency tests against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use plotbook_auth::{ActorContext, Role};
use plotbook_booking::{BookingStatus, BookingType};
use plotbook_core::{
    CustomerId, DomainError, EngineConfig, ProjectId, TenantId, UnitId, UserId,
};
use plotbook_engine::{BookingRequest, Engine, TransferRequest};
use plotbook_infra::{InMemoryStore, Repository};
use plotbook_parties::Customer;
use plotbook_registry::{Tenant, UnitDraft, UnitStatus, UnitType};
use plotbook_transfer::TransferStatus;

struct World {
    store: Arc<InMemoryStore>,
    engine: Engine<Arc<InMemoryStore>>,
    tenant_id: TenantId,
    project_id: ProjectId,
    customer_a: CustomerId,
    customer_b: CustomerId,
    admin: ActorContext,
    agent: ActorContext,
}

fn world() -> World {
    plotbook_observability::init();

    let config = EngineConfig::default();
    let store = Arc::new(InMemoryStore::with_lock_wait(
        std::time::Duration::from_millis(config.lock_wait_ms),
    ));
    let engine = Engine::new(Arc::clone(&store), config);

    let tenant_id = TenantId::new();
    store
        .seed_tenant(Tenant::new(tenant_id, "Acme Estates", 10))
        .unwrap();

    let admin = ActorContext::new(UserId::new(), Role::Admin, Some(tenant_id));
    let agent = ActorContext::new(UserId::new(), Role::SalesAgent, Some(tenant_id));

    let project = engine
        .create_project(tenant_id, "Acme Gardens", &admin)
        .unwrap();

    let customer_a = CustomerId::new();
    let customer_b = CustomerId::new();
    store
        .seed_customer(Customer::new(customer_a, tenant_id, "Nadia Iqbal"))
        .unwrap();
    store
        .seed_customer(Customer::new(customer_b, tenant_id, "Omar Farooq"))
        .unwrap();

    World {
        store,
        engine,
        tenant_id,
        project_id: project.id,
        customer_a,
        customer_b,
        admin,
        agent,
    }
}

fn draft(w: &World, price: u64) -> UnitDraft {
    UnitDraft {
        unit_id: UnitId::new(),
        project_id: w.project_id,
        phase_id: None,
        unit_no: "A-101".to_string(),
        unit_type: UnitType::Plot,
        category: None,
        size_sqft: None,
        price,
        investor_locked: false,
        investor_id: None,
        remarks: None,
    }
}

#[test]
fn hold_to_booking_to_transfer_to_sold() {
    let w = world();
    let now = Utc::now();

    // U1 starts Available at 1,000,000.
    let u1 = w.engine.create_unit(draft(&w, 1_000_000), &w.admin).unwrap();
    assert_eq!(u1.status(), UnitStatus::Available);

    // Hold by agent A: expiry lands a week out.
    let held = w.engine.place_hold(u1.unit_id(), &w.agent, None, now).unwrap();
    assert_eq!(held.status(), UnitStatus::OnHold);
    assert_eq!(held.hold_expires_at(), Some(now + Duration::hours(168)));

    // The holder converts at 950,000.
    let b1 = w
        .engine
        .create_booking(
            BookingRequest {
                unit_id: u1.unit_id(),
                customer_id: w.customer_a,
                amount: 950_000,
                booking_type: BookingType::Sale,
                remarks: None,
            },
            &w.agent,
            now,
        )
        .unwrap();
    assert_eq!(b1.status(), BookingStatus::Confirmed);
    assert_eq!(
        w.engine.get_unit(u1.unit_id()).unwrap().status(),
        UnitStatus::Booked
    );

    // Transfer C1 → C2: default fee is 2% of the booking amount.
    let t1 = w
        .engine
        .create_transfer(
            TransferRequest {
                unit_id: u1.unit_id(),
                booking_id: b1.booking_id(),
                from_customer: w.customer_a,
                to_customer: w.customer_b,
                fee: None,
                remarks: None,
            },
            &w.admin,
        )
        .unwrap();
    assert_eq!(t1.status(), TransferStatus::Pending);
    assert_eq!(t1.fee(), 19_000);

    // Approval moves the commercial relationship.
    let approved = w.engine.approve_transfer(t1.transfer_id(), &w.admin).unwrap();
    assert_eq!(approved.status(), TransferStatus::Approved);
    assert_eq!(
        w.store
            .booking(b1.booking_id())
            .unwrap()
            .unwrap()
            .customer_id(),
        w.customer_b
    );

    // Completion advances the unit to its terminal state.
    let completed = w
        .engine
        .complete_transfer(t1.transfer_id(), &w.admin, now)
        .unwrap();
    assert_eq!(completed.status(), TransferStatus::Completed);
    assert_eq!(
        w.engine.get_unit(u1.unit_id()).unwrap().status(),
        UnitStatus::Sold
    );

    // Sold is terminal: no further holds, bookings or deactivation.
    assert!(w
        .engine
        .place_hold(u1.unit_id(), &w.agent, None, now)
        .is_err());
    assert!(w.engine.deactivate_unit(u1.unit_id(), &w.admin).is_err());
}

#[test]
fn concurrent_holds_have_exactly_one_winner() {
    for _ in 0..20 {
        let w = world();
        let unit = w.engine.create_unit(draft(&w, 500_000), &w.admin).unwrap();
        let unit_id = unit.unit_id();

        let engine = Arc::new(Engine::new(Arc::clone(&w.store), EngineConfig::default()));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                let actor =
                    ActorContext::new(UserId::new(), Role::SalesAgent, Some(w.tenant_id));
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.place_hold(unit_id, &actor, None, Utc::now())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results.iter().filter(|r| r.is_ok()).count(),
            1,
            "exactly one hold must win"
        );

        // The loser saw the race either at commit time (Conflict) or at read
        // time (the winner's hold was already visible).
        let loser_err = results
            .into_iter()
            .find(|r| r.is_err())
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            loser_err,
            DomainError::Conflict(_) | DomainError::InvalidTransition(_)
        ));

        // Exactly one holder on the unit either way.
        let after = w.store.unit(unit_id).unwrap().unwrap();
        assert_eq!(after.status(), UnitStatus::OnHold);
        assert!(after.held_by().is_some());
    }
}

#[test]
fn concurrent_bookings_never_double_allocate() {
    for _ in 0..20 {
        let w = world();
        let unit = w.engine.create_unit(draft(&w, 500_000), &w.admin).unwrap();
        let unit_id = unit.unit_id();

        let engine = Arc::new(Engine::new(Arc::clone(&w.store), EngineConfig::default()));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let handles: Vec<_> = [w.customer_a, w.customer_b]
            .into_iter()
            .map(|customer_id| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                let actor =
                    ActorContext::new(UserId::new(), Role::SalesAgent, Some(w.tenant_id));
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.create_booking(
                        BookingRequest {
                            unit_id,
                            customer_id,
                            amount: 400_000,
                            booking_type: BookingType::Booking,
                            remarks: None,
                        },
                        &actor,
                        Utc::now(),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

        // Invariant: at most one non-cancelled booking per unit.
        let active = w.store.active_booking_for_unit(unit_id).unwrap();
        assert!(active.is_some());
        assert_eq!(
            w.store.unit(unit_id).unwrap().unwrap().status(),
            UnitStatus::Booked
        );
    }
}

#[test]
fn sweep_racing_a_conversion_leaves_a_consistent_unit() {
    for _ in 0..20 {
        let w = world();
        let unit = w.engine.create_unit(draft(&w, 500_000), &w.admin).unwrap();
        let unit_id = unit.unit_id();
        let now = Utc::now();

        w.engine
            .place_hold(unit_id, &w.agent, Some(Duration::hours(1)), now)
            .unwrap();
        let later = now + Duration::hours(2);

        let engine = Arc::new(Engine::new(Arc::clone(&w.store), EngineConfig::default()));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let sweep = {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let admin = w.admin.clone();
            std::thread::spawn(move || {
                barrier.wait();
                engine.expire_holds(&admin, later)
            })
        };
        let convert = {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let agent = w.agent.clone();
            let customer_id = w.customer_a;
            std::thread::spawn(move || {
                barrier.wait();
                engine.create_booking(
                    BookingRequest {
                        unit_id,
                        customer_id,
                        amount: 400_000,
                        booking_type: BookingType::Booking,
                        remarks: None,
                    },
                    &agent,
                    later,
                )
            })
        };

        let sweep_result = sweep.join().unwrap().unwrap();
        let convert_result = convert.join().unwrap();

        // Whichever side won the unit's lock, no transition is ever half
        // applied: either the conversion lost against the expired hold and
        // the unit sits clean at Available, or the sweep reverted first and
        // the conversion then booked the freshly available unit.
        let after = w.store.unit(unit_id).unwrap().unwrap();
        match convert_result {
            Ok(booking) => {
                assert_eq!(sweep_result, vec![unit_id]);
                assert_eq!(after.status(), UnitStatus::Booked);
                assert_eq!(
                    w.store
                        .active_booking_for_unit(unit_id)
                        .unwrap()
                        .map(|b| b.booking_id()),
                    Some(booking.booking_id())
                );
            }
            Err(err) => {
                assert!(matches!(
                    err,
                    DomainError::HoldExpired | DomainError::Conflict(_)
                ));
                assert_eq!(after.status(), UnitStatus::Available);
                assert_eq!(after.held_by(), None);
                assert_eq!(after.hold_expires_at(), None);
                assert!(w.store.active_booking_for_unit(unit_id).unwrap().is_none());
            }
        }
    }
}

#[test]
fn concurrent_project_creation_respects_the_quota() {
    let w = world();
    let tenant_id = TenantId::new();
    w.store
        .seed_tenant(Tenant::new(tenant_id, "Small Builder", 3))
        .unwrap();
    let admin = ActorContext::new(UserId::new(), Role::Admin, Some(tenant_id));

    w.engine.create_project(tenant_id, "one", &admin).unwrap();
    w.engine.create_project(tenant_id, "two", &admin).unwrap();

    // One slot left, two racing creations.
    let engine = Arc::new(Engine::new(Arc::clone(&w.store), EngineConfig::default()));
    let barrier = Arc::new(std::sync::Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let admin = admin.clone();
            std::thread::spawn(move || {
                barrier.wait();
                engine.create_project(tenant_id, &format!("racer-{i}"), &admin)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(DomainError::QuotaExceeded { limit: 3 })
    )));

    // The ceiling holds afterwards too.
    assert_eq!(
        w.engine
            .create_project(tenant_id, "post", &admin)
            .unwrap_err(),
        DomainError::QuotaExceeded { limit: 3 }
    );
}

#[test]
fn cancelled_booking_frees_the_unit_for_a_new_cycle() {
    let w = world();
    let unit = w.engine.create_unit(draft(&w, 750_000), &w.admin).unwrap();
    let now = Utc::now();

    let first = w
        .engine
        .create_booking(
            BookingRequest {
                unit_id: unit.unit_id(),
                customer_id: w.customer_a,
                amount: 700_000,
                booking_type: BookingType::Sale,
                remarks: None,
            },
            &w.agent,
            now,
        )
        .unwrap();

    let freed = w
        .engine
        .cancel_booking(first.booking_id(), "financing fell through", &w.admin, now)
        .unwrap();
    assert_eq!(freed.status(), UnitStatus::Available);

    // A fresh hold-and-book cycle works on the same unit.
    w.engine.place_hold(unit.unit_id(), &w.agent, None, now).unwrap();
    let second = w
        .engine
        .create_booking(
            BookingRequest {
                unit_id: unit.unit_id(),
                customer_id: w.customer_b,
                amount: 720_000,
                booking_type: BookingType::Sale,
                remarks: None,
            },
            &w.agent,
            now,
        )
        .unwrap();
    assert_ne!(second.reference(), first.reference());
    assert_eq!(
        w.engine.get_unit(unit.unit_id()).unwrap().status(),
        UnitStatus::Booked
    );
}
