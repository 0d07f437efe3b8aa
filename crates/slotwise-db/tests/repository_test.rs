//! Integration tests for principal, tenant, catalog and calendar
//! repositories using in-memory SurrealDB.

use chrono::{NaiveDate, Weekday};
use slotwise_core::SlotwiseError;
use slotwise_core::TimeOfDay;
use slotwise_core::models::calendar::{DayHours, ExceptionBlock, OperatingHours, PutScheduleException};
use slotwise_core::models::principal::{Capability, CapabilitySet, CreatePrincipal, Role, UpdatePrincipal};
use slotwise_core::models::provider::{CreateProvider, UpdateProvider, WorkingHours};
use slotwise_core::models::service::{CreateService, DurationType};
use slotwise_core::models::tenant::{CreateTenant, UpdateTenant};
use slotwise_core::repository::{
    Pagination, PrincipalRepository, ProviderRepository, ScheduleExceptionRepository,
    ServiceRepository, TenantRepository,
};
use slotwise_core::time::TimeRange;
use slotwise_db::repository::{
    SurrealPrincipalRepository, SurrealProviderRepository, SurrealScheduleExceptionRepository,
    SurrealServiceRepository, SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    slotwise_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn migrations_run_once() {
    let db = setup().await;
    assert_eq!(slotwise_db::run_migrations(&db).await.unwrap(), 2);

    let mut result = db.query("SELECT VALUE version FROM _migration").await.unwrap();
    let mut versions: Vec<i64> = result.take(0).unwrap();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2]);
}

fn t(h: u32, m: u32) -> TimeOfDay {
    TimeOfDay::hm(h, m).unwrap()
}

fn weekdays_nine_to_six() -> OperatingHours {
    OperatingHours::uniform(
        &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        DayHours::open(t(9, 0), t(18, 0)).unwrap(),
    )
}

fn owner_input(email: &str) -> CreatePrincipal {
    CreatePrincipal {
        role: Role::PlatformOwner,
        owner_id: None,
        display_name: "Owner".into(),
        email: email.into(),
        capabilities: CapabilitySet::all(),
    }
}

// -----------------------------------------------------------------------
// Principals
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_principal() {
    let db = setup().await;
    let repo = SurrealPrincipalRepository::new(db);

    let owner = repo.create(owner_input("owner@example.com")).await.unwrap();
    assert_eq!(owner.role, Role::PlatformOwner);
    assert!(owner.is_active);
    assert!(owner.capabilities.grants(Capability::DeleteTenants));

    let fetched = repo.get_by_id(owner.id).await.unwrap();
    assert_eq!(fetched.email, "owner@example.com");
    assert_eq!(fetched.capabilities, owner.capabilities);

    let found = repo.get_platform_owner().await.unwrap().unwrap();
    assert_eq!(found.id, owner.id);
}

#[tokio::test]
async fn duplicate_principal_email_is_rejected() {
    let db = setup().await;
    let repo = SurrealPrincipalRepository::new(db);

    repo.create(owner_input("dup@example.com")).await.unwrap();
    let err = repo.create(owner_input("dup@example.com")).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::AlreadyExists { .. }));
}

#[tokio::test]
async fn operators_are_listed_by_owner_and_updatable() {
    let db = setup().await;
    let repo = SurrealPrincipalRepository::new(db);

    let owner = repo.create(owner_input("boss@example.com")).await.unwrap();
    let operator = repo
        .create(CreatePrincipal {
            role: Role::ScopedOperator,
            owner_id: Some(owner.id),
            display_name: "Front desk".into(),
            email: "desk@example.com".into(),
            capabilities: CapabilitySet::none().with(Capability::ManageSchedule),
        })
        .await
        .unwrap();
    assert_eq!(operator.owner_id, Some(owner.id));

    let page = repo.list_by_owner(owner.id, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, operator.id);

    let updated = repo
        .update(
            operator.id,
            UpdatePrincipal {
                capabilities: Some(CapabilitySet::none().with(Capability::AddTenants)),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert!(updated.capabilities.grants(Capability::AddTenants));
    assert!(!updated.capabilities.grants(Capability::ManageSchedule));
    assert_eq!(updated.display_name, "Front desk");
}

#[tokio::test]
async fn missing_principal_is_not_found() {
    let db = setup().await;
    let repo = SurrealPrincipalRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::NotFound { .. }));
    assert!(repo.get_platform_owner().await.unwrap().is_none());
}

// -----------------------------------------------------------------------
// Tenants
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_crud_round_trip() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);
    let owner = Uuid::new_v4();

    let tenant = repo
        .create(CreateTenant {
            owner_principal_id: owner,
            name: "Corner Barber".into(),
            operating_hours: weekdays_nine_to_six(),
        })
        .await
        .unwrap();
    assert!(tenant.is_active);
    assert_eq!(tenant.operating_hours, weekdays_nine_to_six());
    assert!(!tenant.operating_hours.get(Weekday::Sun).is_open);

    let renamed = repo
        .update(
            tenant.id,
            UpdateTenant {
                name: Some("Corner Barber & Co".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Corner Barber & Co");
    assert_eq!(renamed.operating_hours, tenant.operating_hours);

    repo.delete(tenant.id).await.unwrap();
    let err = repo.get_by_id(tenant.id).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::NotFound { .. }));
}

#[tokio::test]
async fn tenants_are_listed_per_owner() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for (owner, name) in [(alice, "A1"), (alice, "A2"), (bob, "B1")] {
        repo.create(CreateTenant {
            owner_principal_id: owner,
            name: name.into(),
            operating_hours: OperatingHours::closed(),
        })
        .await
        .unwrap();
    }

    let all = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(all.total, 3);

    let mine = repo.list_by_owner(alice, Pagination::default()).await.unwrap();
    assert_eq!(mine.total, 2);
    assert!(mine.items.iter().all(|t| t.owner_principal_id == alice));

    let first_page = repo
        .list_by_owner(alice, Pagination { offset: 0, limit: 1 })
        .await
        .unwrap();
    assert_eq!(first_page.items.len(), 1);
    assert_eq!(first_page.total, 2);
}

// -----------------------------------------------------------------------
// Services & providers
// -----------------------------------------------------------------------

#[tokio::test]
async fn services_are_tenant_scoped() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db);
    let tenant = Uuid::new_v4();
    let other_tenant = Uuid::new_v4();

    let haircut = repo
        .create(CreateService {
            tenant_id: tenant,
            name: "Haircut".into(),
            description: "Wash and cut".into(),
            duration_type: DurationType::Fixed,
            fixed_duration_minutes: Some(30),
        })
        .await
        .unwrap();
    assert_eq!(haircut.fixed_duration_minutes, Some(30));

    let err = repo.get_by_id(other_tenant, haircut.id).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::NotFound { .. }));

    let coloring = repo
        .create(CreateService {
            tenant_id: tenant,
            name: "Coloring".into(),
            description: String::new(),
            duration_type: DurationType::Flexible,
            fixed_duration_minutes: None,
        })
        .await
        .unwrap();
    assert!(coloring.requires_manual_confirmation());

    let deactivated = repo.set_active(tenant, coloring.id, false).await.unwrap();
    assert!(!deactivated.is_active);

    assert_eq!(repo.list(tenant, false).await.unwrap().len(), 2);
    let active = repo.list(tenant, true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, haircut.id);
}

#[tokio::test]
async fn provider_hours_can_be_updated() {
    let db = setup().await;
    let repo = SurrealProviderRepository::new(db);
    let tenant = Uuid::new_v4();

    let provider = repo
        .create(CreateProvider {
            tenant_id: tenant,
            name: "Sam".into(),
            working_hours: WorkingHours {
                days: vec![Weekday::Tue, Weekday::Wed],
                hours: TimeRange::new(t(10, 0), t(17, 0)).unwrap(),
            },
        })
        .await
        .unwrap();
    assert!(provider.working_hours.window_on(Weekday::Mon).is_none());

    let updated = repo
        .update(
            tenant,
            provider.id,
            UpdateProvider {
                working_hours: Some(WorkingHours {
                    days: vec![Weekday::Mon],
                    hours: TimeRange::new(t(8, 0), t(12, 0)).unwrap(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        updated.working_hours.window_on(Weekday::Mon).unwrap().start,
        t(8, 0)
    );
    assert_eq!(updated.name, "Sam");
    assert_eq!(repo.list(tenant).await.unwrap().len(), 1);
}

// -----------------------------------------------------------------------
// Schedule exceptions
// -----------------------------------------------------------------------

#[tokio::test]
async fn newer_exception_replaces_older_for_same_date() {
    let db = setup().await;
    let repo = SurrealScheduleExceptionRepository::new(db);
    let tenant = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();

    repo.put(PutScheduleException {
        tenant_id: tenant,
        date,
        block: ExceptionBlock::Partial {
            range: TimeRange::new(t(12, 0), t(13, 0)).unwrap(),
        },
        reason: "Staff meeting".into(),
    })
    .await
    .unwrap();

    let replaced = repo
        .put(PutScheduleException {
            tenant_id: tenant,
            date,
            block: ExceptionBlock::FullDay,
            reason: "Holiday".into(),
        })
        .await
        .unwrap();
    assert_eq!(replaced.block, ExceptionBlock::FullDay);

    let stored = repo.get_for_date(tenant, date).await.unwrap().unwrap();
    assert_eq!(stored.reason, "Holiday");
    assert!(stored.blocks(t(9, 0)));

    let listed = repo.list_between(tenant, date, date).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn exceptions_are_listed_by_range_and_removable() {
    let db = setup().await;
    let repo = SurrealScheduleExceptionRepository::new(db);
    let tenant = Uuid::new_v4();
    let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();

    for day in [1, 5, 20] {
        repo.put(PutScheduleException {
            tenant_id: tenant,
            date: d(day),
            block: ExceptionBlock::FullDay,
            reason: "Closed".into(),
        })
        .await
        .unwrap();
    }

    let early = repo.list_between(tenant, d(1), d(10)).await.unwrap();
    assert_eq!(early.iter().map(|e| e.date).collect::<Vec<_>>(), vec![d(1), d(5)]);

    repo.remove(tenant, d(5)).await.unwrap();
    assert!(repo.get_for_date(tenant, d(5)).await.unwrap().is_none());
    assert!(repo.get_for_date(Uuid::new_v4(), d(1)).await.unwrap().is_none());
}
