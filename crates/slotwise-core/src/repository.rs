//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `tenant_id` parameter so that a lookup can never cross
//! tenant boundaries. Ownership is resolved by id on every call; nothing
//! here holds back-pointers between entities.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::SlotwiseResult;
use crate::models::{
    booking::{Booking, CommitBooking, CommitOutcome},
    booking_request::{BookingRequest, CreateBookingRequest, RequestStatus},
    calendar::{PutScheduleException, ScheduleException},
    principal::{CreatePrincipal, Principal, UpdatePrincipal},
    provider::{CreateProvider, Provider, UpdateProvider},
    service::{CreateService, Service},
    tenant::{CreateTenant, Tenant, UpdateTenant},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Principals & Tenants (global scope)
// ---------------------------------------------------------------------------

pub trait PrincipalRepository: Send + Sync {
    fn create(&self, input: CreatePrincipal)
    -> impl Future<Output = SlotwiseResult<Principal>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SlotwiseResult<Principal>> + Send;
    /// The single platform owner, if one has been created.
    fn get_platform_owner(&self) -> impl Future<Output = SlotwiseResult<Option<Principal>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePrincipal,
    ) -> impl Future<Output = SlotwiseResult<Principal>> + Send;
    /// Operators managed by `owner_id`.
    fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = SlotwiseResult<PaginatedResult<Principal>>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = SlotwiseResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SlotwiseResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = SlotwiseResult<Tenant>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = SlotwiseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = SlotwiseResult<PaginatedResult<Tenant>>> + Send;
    /// Tenants created by `owner_principal_id`.
    fn list_by_owner(
        &self,
        owner_principal_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = SlotwiseResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped catalog & staff
// ---------------------------------------------------------------------------

pub trait ServiceRepository: Send + Sync {
    fn create(&self, input: CreateService) -> impl Future<Output = SlotwiseResult<Service>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = SlotwiseResult<Service>> + Send;
    fn set_active(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> impl Future<Output = SlotwiseResult<Service>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> impl Future<Output = SlotwiseResult<Vec<Service>>> + Send;
}

pub trait ProviderRepository: Send + Sync {
    fn create(&self, input: CreateProvider)
    -> impl Future<Output = SlotwiseResult<Provider>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = SlotwiseResult<Provider>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateProvider,
    ) -> impl Future<Output = SlotwiseResult<Provider>> + Send;
    fn list(&self, tenant_id: Uuid) -> impl Future<Output = SlotwiseResult<Vec<Provider>>> + Send;
}

// ---------------------------------------------------------------------------
// Calendar (tenant-scoped, keyed by date)
// ---------------------------------------------------------------------------

pub trait ScheduleExceptionRepository: Send + Sync {
    /// Insert or replace the exception for `(tenant_id, date)`.
    fn put(
        &self,
        input: PutScheduleException,
    ) -> impl Future<Output = SlotwiseResult<ScheduleException>> + Send;
    fn get_for_date(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = SlotwiseResult<Option<ScheduleException>>> + Send;
    /// Exceptions with `from <= date <= to`, ordered by date.
    fn list_between(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = SlotwiseResult<Vec<ScheduleException>>> + Send;
    fn remove(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = SlotwiseResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Requests & bookings (tenant-scoped)
// ---------------------------------------------------------------------------

pub trait BookingRequestRepository: Send + Sync {
    fn create(
        &self,
        input: CreateBookingRequest,
    ) -> impl Future<Output = SlotwiseResult<BookingRequest>> + Send;
    /// Requests arrive by id alone; the tenant is read from the record.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SlotwiseResult<BookingRequest>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        status: Option<RequestStatus>,
        pagination: Pagination,
    ) -> impl Future<Output = SlotwiseResult<PaginatedResult<BookingRequest>>> + Send;
    /// Move a pending request to `Rejected`. Returns `None` when the
    /// request was no longer pending.
    fn reject(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        reason: String,
    ) -> impl Future<Output = SlotwiseResult<Option<BookingRequest>>> + Send;
}

pub trait BookingRepository: Send + Sync {
    /// Atomically re-check the provider's interval (and the linked
    /// request, if any), then write the booking and confirm the request.
    fn commit(
        &self,
        input: CommitBooking,
    ) -> impl Future<Output = SlotwiseResult<CommitOutcome>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SlotwiseResult<Booking>> + Send;
    /// Active bookings of a provider on one date, ordered by start time.
    fn list_active_for_provider(
        &self,
        tenant_id: Uuid,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = SlotwiseResult<Vec<Booking>>> + Send;
    /// All bookings of a tenant with `from <= date <= to`.
    fn list_between(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = SlotwiseResult<Vec<Booking>>> + Send;
    /// Mark an active booking cancelled. Returns `None` when it was
    /// already cancelled.
    fn cancel(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = SlotwiseResult<Option<Booking>>> + Send;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Every repository the scheduling core needs, passed explicitly into
/// each service.
pub trait Repositories: Send + Sync {
    type Principals: PrincipalRepository;
    type Tenants: TenantRepository;
    type Services: ServiceRepository;
    type Providers: ProviderRepository;
    type Exceptions: ScheduleExceptionRepository;
    type Requests: BookingRequestRepository;
    type Bookings: BookingRepository;

    fn principals(&self) -> &Self::Principals;
    fn tenants(&self) -> &Self::Tenants;
    fn services(&self) -> &Self::Services;
    fn providers(&self) -> &Self::Providers;
    fn exceptions(&self) -> &Self::Exceptions;
    fn requests(&self) -> &Self::Requests;
    fn bookings(&self) -> &Self::Bookings;
}
