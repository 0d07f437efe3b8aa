//! Integration tests for the booking state machine and availability
//! engine over in-memory SurrealDB.

use chrono::{NaiveDate, Weekday};
use slotwise_core::TimeOfDay;
use slotwise_core::error::{DenyReason, SlotwiseError};
use slotwise_core::models::booking::BookingStatus;
use slotwise_core::models::booking_request::{CustomerContact, RequestStatus};
use slotwise_core::models::calendar::{DayHours, OperatingHours};
use slotwise_core::models::principal::{Capability, CapabilitySet, Principal};
use slotwise_core::models::provider::WorkingHours;
use slotwise_core::models::service::{DurationType, Service, ServiceSpec};
use slotwise_core::models::slot::Conflict;
use slotwise_core::models::tenant::Tenant;
use slotwise_core::repository::{BookingRequestRepository, Pagination, Repositories};
use slotwise_core::time::TimeRange;
use slotwise_db::SurrealRepositories;
use slotwise_scheduling::{
    BookingService, CalendarPolicy, ChannelNotifier, ConfirmBooking, DirectBooking, Directory,
    SchedulingConfig, ServiceCatalog, SubmitRequest,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Repos = SurrealRepositories<Db>;

struct Env {
    repos: Repos,
    owner: Principal,
    tenant: Tenant,
    provider: Uuid,
    haircut: Service,
    coloring: Service,
    notifier: ChannelNotifier,
    bookings: BookingService<Repos, ChannelNotifier>,
}

fn t(h: u32, m: u32) -> TimeOfDay {
    TimeOfDay::hm(h, m).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
}

/// 2024-02-13 is a Tuesday.
fn tuesday() -> NaiveDate {
    date(13)
}

fn customer() -> CustomerContact {
    CustomerContact {
        name: "Jo".into(),
        email: Some("jo@example.com".into()),
        phone: None,
    }
}

/// Tenant Mon–Fri 09:00–18:00 with one provider Tue–Fri 10:00–17:00,
/// a fixed 45-minute haircut and a flexible coloring service.
async fn setup() -> Env {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    slotwise_db::run_migrations(&db).await.unwrap();
    let repos = SurrealRepositories::new(db);

    let directory = Directory::new(repos.clone());
    let (owner, _) = directory
        .ensure_platform_owner("Owner", "owner@example.com")
        .await
        .unwrap();

    let hours = OperatingHours::uniform(
        &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        DayHours::open(t(9, 0), t(18, 0)).unwrap(),
    );
    let tenant = directory
        .create_tenant(&owner, "Corner Barber", hours)
        .await
        .unwrap();

    let provider = directory
        .add_provider(
            &owner,
            tenant.id,
            "Sam",
            WorkingHours {
                days: vec![Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
                hours: TimeRange::new(t(10, 0), t(17, 0)).unwrap(),
            },
        )
        .await
        .unwrap();

    let catalog = ServiceCatalog::new(repos.clone(), SchedulingConfig::default());
    let haircut = catalog
        .define_service(
            &owner,
            tenant.id,
            ServiceSpec {
                name: "Haircut".into(),
                description: "Wash and cut".into(),
                duration_type: DurationType::Fixed,
                fixed_duration_minutes: Some(45),
            },
        )
        .await
        .unwrap();
    let coloring = catalog
        .define_service(
            &owner,
            tenant.id,
            ServiceSpec {
                name: "Coloring".into(),
                description: "Duration depends on hair".into(),
                duration_type: DurationType::Flexible,
                fixed_duration_minutes: None,
            },
        )
        .await
        .unwrap();

    let notifier = ChannelNotifier::new(16);
    let bookings = BookingService::new(
        repos.clone(),
        notifier.clone(),
        SchedulingConfig::default(),
    );

    Env {
        repos,
        owner,
        tenant,
        provider: provider.id,
        haircut,
        coloring,
        notifier,
        bookings,
    }
}

impl Env {
    async fn submit(&self, service: &Service) -> Uuid {
        self.bookings
            .submit(SubmitRequest {
                tenant_id: self.tenant.id,
                service_id: service.id,
                desired_date: tuesday(),
                preferred_window: Some("afternoon".into()),
                customer: customer(),
                notes: None,
            })
            .await
            .unwrap()
            .id
    }

    fn confirm_at(&self, start: TimeOfDay, duration: Option<u32>) -> ConfirmBooking {
        ConfirmBooking {
            provider_id: self.provider,
            date: tuesday(),
            start_time: start,
            duration_minutes: duration,
        }
    }

    fn direct_at(&self, start: TimeOfDay) -> DirectBooking {
        DirectBooking {
            tenant_id: self.tenant.id,
            service_id: self.haircut.id,
            provider_id: self.provider,
            date: tuesday(),
            start_time: start,
            customer: customer(),
        }
    }

    async fn active_bookings(&self) -> usize {
        self.bookings
            .list_bookings(&self.owner, self.tenant.id, tuesday(), tuesday())
            .await
            .unwrap()
            .iter()
            .filter(|b| b.is_active())
            .count()
    }

    async fn operator(&self, email: &str, capabilities: CapabilitySet) -> Principal {
        Directory::new(self.repos.clone())
            .create_operator(&self.owner, "Operator", email, capabilities)
            .await
            .unwrap()
    }
}

// -----------------------------------------------------------------------
// Availability
// -----------------------------------------------------------------------

#[tokio::test]
async fn back_to_back_is_free_but_overlap_is_not() {
    let env = setup().await;
    env.bookings.book_direct(env.direct_at(t(14, 0))).await.unwrap();

    let engine = env.bookings.availability();
    let overlap = engine
        .find_conflict(env.tenant.id, env.provider, tuesday(), t(14, 30), 30)
        .await
        .unwrap();
    assert_eq!(overlap, Some(Conflict::BookingOverlap));

    let after = engine
        .find_conflict(env.tenant.id, env.provider, tuesday(), t(14, 45), 30)
        .await
        .unwrap();
    assert_eq!(after, None);
}

#[tokio::test]
async fn holiday_closes_the_day() {
    let env = setup().await;
    CalendarPolicy::new(env.repos.clone())
        .add_exception(&env.owner, env.tenant.id, date(14), None, "Holiday")
        .await
        .unwrap();

    let conflict = env
        .bookings
        .availability()
        .find_conflict(env.tenant.id, env.provider, date(14), t(11, 0), 30)
        .await
        .unwrap();
    assert_eq!(conflict, Some(Conflict::ClosedDay));
}

#[tokio::test]
async fn open_slots_never_conflict() {
    let env = setup().await;
    env.bookings.book_direct(env.direct_at(t(11, 0))).await.unwrap();
    CalendarPolicy::new(env.repos.clone())
        .add_exception(
            &env.owner,
            env.tenant.id,
            tuesday(),
            Some(TimeRange::new(t(13, 0), t(14, 0)).unwrap()),
            "Team lunch",
        )
        .await
        .unwrap();

    let engine = env.bookings.availability();
    let slots: Vec<_> = engine
        .list_open_slots(env.tenant.id, env.provider, tuesday(), 30, None)
        .await
        .unwrap()
        .collect();
    assert!(!slots.is_empty());
    assert!(!slots.contains(&t(11, 15)));
    assert!(!slots.contains(&t(13, 0)));

    for start in slots {
        let conflict = engine
            .find_conflict(env.tenant.id, env.provider, tuesday(), start, 30)
            .await
            .unwrap();
        assert_eq!(conflict, None, "open slot {start} conflicts");
    }
}

#[tokio::test]
async fn zero_duration_and_granularity_are_rejected() {
    let env = setup().await;
    let engine = env.bookings.availability();

    let err = engine
        .find_conflict(env.tenant.id, env.provider, tuesday(), t(10, 0), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SlotwiseError::Validation { .. }));

    let err = engine
        .list_open_slots(env.tenant.id, env.provider, tuesday(), 30, Some(0))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotwiseError::Validation { .. }));
}

#[tokio::test]
async fn oversized_granularity_lists_the_first_slot_only() {
    let env = setup().await;
    let starts: Vec<_> = env
        .bookings
        .availability()
        .list_open_slots(env.tenant.id, env.provider, tuesday(), 30, Some(u32::MAX))
        .await
        .unwrap()
        .collect();
    assert_eq!(starts, vec![t(10, 0)]);
}

// -----------------------------------------------------------------------
// Submit & direct booking
// -----------------------------------------------------------------------

#[tokio::test]
async fn submit_rejects_unknown_and_inactive_targets() {
    let env = setup().await;

    let unknown_tenant = env
        .bookings
        .submit(SubmitRequest {
            tenant_id: Uuid::new_v4(),
            service_id: env.haircut.id,
            desired_date: tuesday(),
            preferred_window: None,
            customer: customer(),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(unknown_tenant, SlotwiseError::NotFound { .. }));

    ServiceCatalog::new(env.repos.clone(), SchedulingConfig::default())
        .deactivate(&env.owner, env.tenant.id, env.haircut.id)
        .await
        .unwrap();
    let inactive = env
        .bookings
        .submit(SubmitRequest {
            tenant_id: env.tenant.id,
            service_id: env.haircut.id,
            desired_date: tuesday(),
            preferred_window: None,
            customer: customer(),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(inactive, SlotwiseError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn submit_to_inactive_tenant_is_not_found() {
    let env = setup().await;
    Directory::new(env.repos.clone())
        .update_tenant(&env.owner, env.tenant.id, None, Some(false))
        .await
        .unwrap();

    let err = env
        .bookings
        .submit(SubmitRequest {
            tenant_id: env.tenant.id,
            service_id: env.haircut.id,
            desired_date: tuesday(),
            preferred_window: None,
            customer: customer(),
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SlotwiseError::NotFound { .. }));
}

#[tokio::test]
async fn direct_booking_of_flexible_service_is_refused() {
    let env = setup().await;
    let mut input = env.direct_at(t(10, 0));
    input.service_id = env.coloring.id;

    let err = env.bookings.book_direct(input).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::InvalidServiceSpec { .. }));
}

#[tokio::test]
async fn direct_booking_into_a_taken_slot_is_unavailable() {
    let env = setup().await;
    env.bookings.book_direct(env.direct_at(t(10, 0))).await.unwrap();

    let err = env
        .bookings
        .book_direct(env.direct_at(t(10, 30)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SlotwiseError::SlotUnavailable {
            conflict: Conflict::BookingOverlap
        }
    ));
    assert_eq!(env.active_bookings().await, 1);
}

// -----------------------------------------------------------------------
// Confirm / reject / cancel
// -----------------------------------------------------------------------

#[tokio::test]
async fn flexible_confirm_without_duration_is_a_spec_error() {
    let env = setup().await;
    let request_id = env.submit(&env.coloring).await;

    let err = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(10, 0), None))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotwiseError::InvalidServiceSpec { .. }));

    let request = env.repos.requests().get_by_id(request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(env.active_bookings().await, 0);
}

#[tokio::test]
async fn confirming_twice_yields_one_booking() {
    let env = setup().await;
    let mut events = env.notifier.subscribe();
    let request_id = env.submit(&env.coloring).await;

    let booking = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(10, 0), Some(90)))
        .await
        .unwrap();
    assert_eq!(booking.end_time, t(11, 30));
    assert_eq!(booking.request_id, Some(request_id));
    assert_eq!(events.try_recv().unwrap().kind(), "booking.confirmed");

    let err = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(14, 0), Some(60)))
        .await
        .unwrap_err();
    assert!(matches!(err, SlotwiseError::AlreadyFinalized { .. }));
    assert_eq!(env.active_bookings().await, 1);

    let request = env.repos.requests().get_by_id(request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Confirmed);
    assert_eq!(request.booking_id, Some(booking.id));
}

#[tokio::test]
async fn fixed_confirm_checks_duration() {
    let env = setup().await;
    let request_id = env.submit(&env.haircut).await;

    let err = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(10, 0), Some(60)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SlotwiseError::DurationMismatch {
            expected: 45,
            actual: 60
        }
    ));

    let booking = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(10, 0), None))
        .await
        .unwrap();
    assert_eq!(booking.duration_minutes, 45);
}

#[tokio::test]
async fn conflicting_confirm_leaves_request_pending() {
    let env = setup().await;
    env.bookings.book_direct(env.direct_at(t(14, 0))).await.unwrap();
    let request_id = env.submit(&env.coloring).await;

    let err = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(14, 30), Some(30)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SlotwiseError::SlotUnavailable {
            conflict: Conflict::BookingOverlap
        }
    ));
    let request = env.repos.requests().get_by_id(request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
}

#[tokio::test]
async fn concurrent_confirms_for_one_slot_book_once() {
    let env = setup().await;
    let first = env.submit(&env.coloring).await;
    let second = env.submit(&env.coloring).await;

    let (a, b) = tokio::join!(
        env.bookings
            .confirm(&env.owner, first, env.confirm_at(t(15, 0), Some(60))),
        env.bookings
            .confirm(&env.owner, second, env.confirm_at(t(15, 30), Some(60))),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = a.err().or(b.err()).unwrap();
    assert!(matches!(
        loser,
        SlotwiseError::SlotUnavailable {
            conflict: Conflict::BookingOverlap
        }
    ));
    assert_eq!(env.active_bookings().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn separate_services_share_one_store_guard() {
    let env = setup().await;
    // A second service over the same store holds its own in-process locks.
    let other = BookingService::new(
        env.repos.clone(),
        ChannelNotifier::new(4),
        SchedulingConfig::default(),
    );

    let rounds = [
        (t(10, 0), t(10, 30)),
        (t(11, 30), t(12, 0)),
        (t(13, 0), t(13, 30)),
        (t(14, 30), t(15, 0)),
    ];
    for (left, right) in rounds {
        let first = env.submit(&env.coloring).await;
        let second = env.submit(&env.coloring).await;

        let (a, b) = tokio::join!(
            env.bookings
                .confirm(&env.owner, first, env.confirm_at(left, Some(60))),
            other.confirm(&env.owner, second, env.confirm_at(right, Some(60))),
        );

        assert_eq!(
            [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "overlapping confirms at {left} and {right}"
        );
        let loser = a.err().or(b.err()).unwrap();
        assert!(matches!(
            loser,
            SlotwiseError::SlotUnavailable {
                conflict: Conflict::BookingOverlap
            }
        ));
    }
    assert_eq!(env.active_bookings().await, rounds.len());
}

#[tokio::test]
async fn reject_is_terminal() {
    let env = setup().await;
    let mut events = env.notifier.subscribe();
    let request_id = env.submit(&env.coloring).await;

    let rejected = env
        .bookings
        .reject(&env.owner, request_id, "Fully booked")
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(events.try_recv().unwrap().kind(), "booking.rejected");

    let again = env
        .bookings
        .reject(&env.owner, request_id, "Still booked")
        .await
        .unwrap_err();
    assert!(matches!(again, SlotwiseError::AlreadyFinalized { .. }));

    let confirm = env
        .bookings
        .confirm(&env.owner, request_id, env.confirm_at(t(10, 0), Some(30)))
        .await
        .unwrap_err();
    assert!(matches!(confirm, SlotwiseError::AlreadyFinalized { .. }));
}

#[tokio::test]
async fn cancel_frees_the_slot_once() {
    let env = setup().await;
    let mut events = env.notifier.subscribe();
    let booking = env.bookings.book_direct(env.direct_at(t(16, 0))).await.unwrap();
    assert_eq!(events.try_recv().unwrap().kind(), "booking.confirmed");

    let cancelled = env.bookings.cancel(&env.owner, booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(events.try_recv().unwrap().kind(), "booking.cancelled");

    let twice = env.bookings.cancel(&env.owner, booking.id).await.unwrap_err();
    assert!(matches!(twice, SlotwiseError::AlreadyFinalized { .. }));

    env.bookings.book_direct(env.direct_at(t(16, 0))).await.unwrap();
}

// -----------------------------------------------------------------------
// Authorization
// -----------------------------------------------------------------------

#[tokio::test]
async fn unowned_and_missing_requests_look_the_same() {
    let env = setup().await;
    let operator = env
        .operator("desk@example.com", CapabilitySet::all())
        .await;
    let request_id = env.submit(&env.coloring).await;

    let foreign = env
        .bookings
        .confirm(&operator, request_id, env.confirm_at(t(10, 0), Some(30)))
        .await
        .unwrap_err();
    let missing = env
        .bookings
        .confirm(&operator, Uuid::new_v4(), env.confirm_at(t(10, 0), Some(30)))
        .await
        .unwrap_err();

    for err in [foreign, missing] {
        assert!(matches!(
            err,
            SlotwiseError::Denied {
                reason: DenyReason::NotOwner
            }
        ));
    }
}

#[tokio::test]
async fn operator_needs_manage_schedule_on_own_tenant() {
    let env = setup().await;
    let directory = Directory::new(env.repos.clone());

    let viewer = env
        .operator(
            "viewer@example.com",
            CapabilitySet::none().with(Capability::AddTenants),
        )
        .await;
    let own = directory
        .create_tenant(
            &viewer,
            "Viewer's Salon",
            OperatingHours::uniform(&[Weekday::Tue], DayHours::open(t(9, 0), t(18, 0)).unwrap()),
        )
        .await
        .unwrap();
    let provider = directory
        .add_provider(
            &env.owner,
            own.id,
            "Alex",
            WorkingHours {
                days: vec![Weekday::Tue],
                hours: TimeRange::new(t(9, 0), t(18, 0)).unwrap(),
            },
        )
        .await
        .unwrap();
    let service = ServiceCatalog::new(env.repos.clone(), SchedulingConfig::default())
        .define_service(
            &env.owner,
            own.id,
            ServiceSpec {
                name: "Trim".into(),
                description: String::new(),
                duration_type: DurationType::Fixed,
                fixed_duration_minutes: Some(20),
            },
        )
        .await
        .unwrap();
    let request = env
        .bookings
        .submit(SubmitRequest {
            tenant_id: own.id,
            service_id: service.id,
            desired_date: tuesday(),
            preferred_window: None,
            customer: customer(),
            notes: None,
        })
        .await
        .unwrap();
    let choice = ConfirmBooking {
        provider_id: provider.id,
        date: tuesday(),
        start_time: t(9, 0),
        duration_minutes: None,
    };

    let err = env
        .bookings
        .confirm(&viewer, request.id, choice.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SlotwiseError::Denied {
            reason: DenyReason::MissingCapability
        }
    ));

    let scheduler = directory
        .update_capabilities(
            &env.owner,
            viewer.id,
            CapabilitySet::none().with(Capability::ManageSchedule),
        )
        .await
        .unwrap();
    let booking = env
        .bookings
        .confirm(&scheduler, request.id, choice)
        .await
        .unwrap();
    assert_eq!(booking.tenant_id, own.id);
}

#[tokio::test]
async fn deactivated_operator_is_denied() {
    let env = setup().await;
    let operator = env
        .operator("gone@example.com", CapabilitySet::all())
        .await;
    let deactivated = Directory::new(env.repos.clone())
        .deactivate_operator(&env.owner, operator.id)
        .await
        .unwrap();

    let err = env
        .bookings
        .list_requests(&deactivated, env.tenant.id, None, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SlotwiseError::Denied {
            reason: DenyReason::InactivePrincipal
        }
    ));
}

// -----------------------------------------------------------------------
// Queue & analytics
// -----------------------------------------------------------------------

#[tokio::test]
async fn summary_counts_queue_and_bookings() {
    let env = setup().await;
    let confirmed = env.submit(&env.coloring).await;
    let rejected = env.submit(&env.coloring).await;
    env.submit(&env.coloring).await;

    env.bookings
        .confirm(&env.owner, confirmed, env.confirm_at(t(10, 0), Some(60)))
        .await
        .unwrap();
    env.bookings
        .reject(&env.owner, rejected, "No staff")
        .await
        .unwrap();
    let direct = env.bookings.book_direct(env.direct_at(t(15, 0))).await.unwrap();
    env.bookings.cancel(&env.owner, direct.id).await.unwrap();

    let pending = env
        .bookings
        .list_requests(
            &env.owner,
            env.tenant.id,
            Some(RequestStatus::Pending),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 1);

    let summary = env
        .bookings
        .summary(&env.owner, env.tenant.id, tuesday(), tuesday())
        .await
        .unwrap();
    assert_eq!(summary.pending_requests, 1);
    assert_eq!(summary.confirmed_requests, 1);
    assert_eq!(summary.rejected_requests, 1);
    assert_eq!(summary.active_bookings, 1);
    assert_eq!(summary.cancelled_bookings, 1);
}
