//! Booking request state machine.
//!
//! ```text
//! Pending ──confirm──▶ Confirmed   (creates an Active booking)
//!    └─────reject────▶ Rejected
//! Active booking ──cancel──▶ Cancelled
//! ```
//!
//! Confirmations and direct bookings hold the [`SlotLocks`] key for their
//! provider day while they check availability and commit, and the store
//! re-checks the same conditions inside its own transaction.

use chrono::NaiveDate;
use slotwise_core::TimeOfDay;
use slotwise_core::error::{SlotwiseError, SlotwiseResult};
use slotwise_core::models::booking::{
    Booking, BookingStatus, CommitBooking, CommitOutcome, CommitRejection,
};
use slotwise_core::models::booking_request::{
    BookingRequest, CreateBookingRequest, CustomerContact, RequestStatus,
};
use slotwise_core::models::notification::NotificationEvent;
use slotwise_core::models::principal::Principal;
use slotwise_core::models::service::{DurationType, Service};
use slotwise_core::models::slot::Conflict;
use slotwise_core::models::tenant::Tenant;
use slotwise_core::repository::{
    BookingRepository, BookingRequestRepository, PaginatedResult, Pagination, Repositories,
    ServiceRepository, TenantRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityEngine;
use crate::catalog::check_duration;
use crate::config::SchedulingConfig;
use crate::error::SchedulingError;
use crate::locks::{SlotKey, SlotLocks};
use crate::notify::NotificationPort;
use crate::permission::{Action, authorize_tenant, mask_not_found, require_active};

/// A customer's request, as submitted.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub desired_date: NaiveDate,
    pub preferred_window: Option<String>,
    pub customer: CustomerContact,
    pub notes: Option<String>,
}

/// Immediate booking of a fixed-duration service.
#[derive(Debug, Clone)]
pub struct DirectBooking {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub customer: CustomerContact,
}

/// The operator's choice when confirming a request.
#[derive(Debug, Clone)]
pub struct ConfirmBooking {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    /// Required for flexible services. For fixed services it may be
    /// omitted, and must match the fixed duration when given.
    pub duration_minutes: Option<u32>,
}

/// Request queue counts plus booking counts for a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSummary {
    pub pending_requests: u64,
    pub confirmed_requests: u64,
    pub rejected_requests: u64,
    pub active_bookings: u64,
    pub cancelled_bookings: u64,
}

/// Decide the booking duration for `service`.
pub fn resolve_duration(
    service: &Service,
    requested: Option<u32>,
    config: &SchedulingConfig,
) -> SlotwiseResult<u32> {
    match service.duration_type {
        DurationType::Flexible => match requested {
            None | Some(0) => Err(SchedulingError::MissingDuration.into()),
            Some(minutes) => {
                check_duration(minutes, config)?;
                Ok(minutes)
            }
        },
        DurationType::Fixed => {
            let fixed = service
                .fixed_duration_minutes
                .ok_or(SchedulingError::MissingFixedDuration)?;
            match requested {
                Some(actual) if actual != fixed => Err(SlotwiseError::DurationMismatch {
                    expected: fixed,
                    actual,
                }),
                _ => Ok(fixed),
            }
        }
    }
}

fn already_finalized(id: Uuid, status: impl ToString) -> SlotwiseError {
    SlotwiseError::AlreadyFinalized {
        id,
        status: status.to_string(),
    }
}

/// The interval a commit is about to claim.
struct Claim {
    request_id: Option<Uuid>,
    tenant_id: Uuid,
    service_id: Uuid,
    provider_id: Uuid,
    date: NaiveDate,
    start_time: TimeOfDay,
    duration_minutes: u32,
    customer: CustomerContact,
}

pub struct BookingService<R: Repositories, N: NotificationPort> {
    repos: R,
    notifier: N,
    config: SchedulingConfig,
    availability: AvailabilityEngine<R>,
    locks: SlotLocks,
}

impl<R: Repositories + Clone, N: NotificationPort> BookingService<R, N> {
    pub fn new(repos: R, notifier: N, config: SchedulingConfig) -> Self {
        Self {
            availability: AvailabilityEngine::new(repos.clone(), config.clone()),
            repos,
            notifier,
            config,
            locks: SlotLocks::new(),
        }
    }

    pub fn availability(&self) -> &AvailabilityEngine<R> {
        &self.availability
    }

    /// Record a customer's intent. No availability check happens here.
    pub async fn submit(&self, input: SubmitRequest) -> SlotwiseResult<BookingRequest> {
        if input.customer.name.trim().is_empty() {
            return Err(SlotwiseError::validation("customer name must not be blank"));
        }
        self.active_tenant(input.tenant_id).await?;
        self.bookable_service(input.tenant_id, input.service_id)
            .await?;

        let request = self
            .repos
            .requests()
            .create(CreateBookingRequest {
                tenant_id: input.tenant_id,
                service_id: input.service_id,
                desired_date: input.desired_date,
                preferred_window: input.preferred_window,
                customer: input.customer,
                notes: input.notes,
            })
            .await?;

        info!(
            tenant_id = %request.tenant_id,
            request_id = %request.id,
            service_id = %request.service_id,
            "Booking request submitted"
        );
        Ok(request)
    }

    /// Book a fixed-duration service immediately.
    pub async fn book_direct(&self, input: DirectBooking) -> SlotwiseResult<Booking> {
        self.active_tenant(input.tenant_id).await?;
        let service = self
            .bookable_service(input.tenant_id, input.service_id)
            .await?;
        if service.requires_manual_confirmation() {
            return Err(SlotwiseError::InvalidServiceSpec {
                message: "flexible services must be requested and confirmed".into(),
            });
        }
        let duration_minutes = resolve_duration(&service, None, &self.config)?;

        let booking = self
            .claim(Claim {
                request_id: None,
                tenant_id: input.tenant_id,
                service_id: service.id,
                provider_id: input.provider_id,
                date: input.date,
                start_time: input.start_time,
                duration_minutes,
                customer: input.customer,
            })
            .await?;

        info!(
            tenant_id = %booking.tenant_id,
            booking_id = %booking.id,
            provider_id = %booking.provider_id,
            "Direct booking created"
        );
        self.dispatch(NotificationEvent::BookingConfirmed {
            tenant_id: booking.tenant_id,
            customer: booking.customer.clone(),
            booking: booking.clone(),
        })
        .await;
        Ok(booking)
    }

    /// Turn a pending request into a booking at an operator-chosen slot.
    pub async fn confirm(
        &self,
        principal: &Principal,
        request_id: Uuid,
        input: ConfirmBooking,
    ) -> SlotwiseResult<Booking> {
        let request = self.authorized_request(principal, request_id).await?;
        if request.status.is_terminal() {
            return Err(already_finalized(request.id, request.status));
        }

        let service = self
            .repos
            .services()
            .get_by_id(request.tenant_id, request.service_id)
            .await?;
        let duration_minutes = resolve_duration(&service, input.duration_minutes, &self.config)?;

        let booking = self
            .claim(Claim {
                request_id: Some(request.id),
                tenant_id: request.tenant_id,
                service_id: request.service_id,
                provider_id: input.provider_id,
                date: input.date,
                start_time: input.start_time,
                duration_minutes,
                customer: request.customer.clone(),
            })
            .await?;

        info!(
            tenant_id = %booking.tenant_id,
            request_id = %request.id,
            booking_id = %booking.id,
            provider_id = %booking.provider_id,
            principal_id = %principal.id,
            "Booking request confirmed"
        );
        self.dispatch(NotificationEvent::BookingConfirmed {
            tenant_id: booking.tenant_id,
            customer: booking.customer.clone(),
            booking: booking.clone(),
        })
        .await;
        Ok(booking)
    }

    pub async fn reject(
        &self,
        principal: &Principal,
        request_id: Uuid,
        reason: impl Into<String>,
    ) -> SlotwiseResult<BookingRequest> {
        let request = self.authorized_request(principal, request_id).await?;
        if request.status.is_terminal() {
            return Err(already_finalized(request.id, request.status));
        }

        let reason = reason.into();
        let Some(rejected) = self
            .repos
            .requests()
            .reject(request.tenant_id, request.id, reason.clone())
            .await?
        else {
            let current = self.repos.requests().get_by_id(request.id).await?;
            warn!(request_id = %request.id, status = %current.status, "Lost race rejecting request");
            return Err(already_finalized(current.id, current.status));
        };

        info!(
            tenant_id = %rejected.tenant_id,
            request_id = %rejected.id,
            principal_id = %principal.id,
            "Booking request rejected"
        );
        self.dispatch(NotificationEvent::BookingRejected {
            tenant_id: rejected.tenant_id,
            customer: rejected.customer.clone(),
            request: rejected.clone(),
            reason,
        })
        .await;
        Ok(rejected)
    }

    /// Cancel an active booking. The record is kept for history.
    pub async fn cancel(&self, principal: &Principal, booking_id: Uuid) -> SlotwiseResult<Booking> {
        require_active(principal)?;
        let booking = self
            .repos
            .bookings()
            .get_by_id(booking_id)
            .await
            .map_err(|e| mask_not_found(principal, e))?;
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageSchedule,
            booking.tenant_id,
        )
        .await?;
        if !booking.is_active() {
            return Err(already_finalized(booking.id, booking.status));
        }

        let Some(cancelled) = self
            .repos
            .bookings()
            .cancel(booking.tenant_id, booking.id)
            .await?
        else {
            warn!(booking_id = %booking.id, "Lost race cancelling booking");
            return Err(already_finalized(booking.id, BookingStatus::Cancelled));
        };

        info!(
            tenant_id = %cancelled.tenant_id,
            booking_id = %cancelled.id,
            principal_id = %principal.id,
            "Booking cancelled"
        );
        self.dispatch(NotificationEvent::BookingCancelled {
            tenant_id: cancelled.tenant_id,
            customer: cancelled.customer.clone(),
            booking: cancelled.clone(),
        })
        .await;
        Ok(cancelled)
    }

    /// The operator inbox, optionally filtered by status.
    pub async fn list_requests(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        status: Option<RequestStatus>,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<BookingRequest>> {
        authorize_tenant(self.repos.tenants(), principal, Action::ViewTenant, tenant_id).await?;
        self.repos
            .requests()
            .list(tenant_id, status, pagination)
            .await
    }

    pub async fn list_bookings(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SlotwiseResult<Vec<Booking>> {
        authorize_tenant(self.repos.tenants(), principal, Action::ViewTenant, tenant_id).await?;
        self.repos.bookings().list_between(tenant_id, from, to).await
    }

    /// Request counts cover the whole queue; booking counts cover
    /// `from..=to`.
    pub async fn summary(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SlotwiseResult<BookingSummary> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ViewAnalytics,
            tenant_id,
        )
        .await?;

        let mut summary = BookingSummary::default();
        for status in [
            RequestStatus::Pending,
            RequestStatus::Confirmed,
            RequestStatus::Rejected,
        ] {
            let page = self
                .repos
                .requests()
                .list(tenant_id, Some(status), Pagination { offset: 0, limit: 1 })
                .await?;
            match status {
                RequestStatus::Pending => summary.pending_requests = page.total,
                RequestStatus::Confirmed => summary.confirmed_requests = page.total,
                RequestStatus::Rejected => summary.rejected_requests = page.total,
            }
        }

        for booking in self.repos.bookings().list_between(tenant_id, from, to).await? {
            if booking.is_active() {
                summary.active_bookings += 1;
            } else {
                summary.cancelled_bookings += 1;
            }
        }
        Ok(summary)
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    async fn active_tenant(&self, tenant_id: Uuid) -> SlotwiseResult<Tenant> {
        let tenant = self.repos.tenants().get_by_id(tenant_id).await?;
        if !tenant.is_active {
            return Err(SlotwiseError::not_found("tenant", tenant_id));
        }
        Ok(tenant)
    }

    async fn bookable_service(&self, tenant_id: Uuid, service_id: Uuid) -> SlotwiseResult<Service> {
        let service = self
            .repos
            .services()
            .get_by_id(tenant_id, service_id)
            .await?;
        if !service.is_active {
            return Err(SlotwiseError::ServiceUnavailable { service_id });
        }
        Ok(service)
    }

    /// Load a request and check that `principal` may manage its schedule.
    async fn authorized_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> SlotwiseResult<BookingRequest> {
        require_active(principal)?;
        let request = self
            .repos
            .requests()
            .get_by_id(request_id)
            .await
            .map_err(|e| mask_not_found(principal, e))?;
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageSchedule,
            request.tenant_id,
        )
        .await?;
        Ok(request)
    }

    /// Check availability and commit under the provider-day lock.
    async fn claim(&self, claim: Claim) -> SlotwiseResult<Booking> {
        let _guard = self
            .locks
            .acquire(SlotKey {
                tenant_id: claim.tenant_id,
                provider_id: claim.provider_id,
                date: claim.date,
            })
            .await;

        if let Some(conflict) = self
            .availability
            .find_conflict(
                claim.tenant_id,
                claim.provider_id,
                claim.date,
                claim.start_time,
                claim.duration_minutes,
            )
            .await?
        {
            warn!(
                tenant_id = %claim.tenant_id,
                provider_id = %claim.provider_id,
                date = %claim.date,
                start = %claim.start_time,
                %conflict,
                "Slot unavailable"
            );
            return Err(SlotwiseError::SlotUnavailable { conflict });
        }

        let end_time = claim
            .start_time
            .checked_add(claim.duration_minutes)
            .ok_or(SlotwiseError::SlotUnavailable {
                conflict: Conflict::ClosedDay,
            })?;

        let outcome = self
            .repos
            .bookings()
            .commit(CommitBooking {
                request_id: claim.request_id,
                tenant_id: claim.tenant_id,
                service_id: claim.service_id,
                provider_id: claim.provider_id,
                date: claim.date,
                start_time: claim.start_time,
                end_time,
                duration_minutes: claim.duration_minutes,
                customer: claim.customer,
            })
            .await?;

        match outcome {
            CommitOutcome::Committed(booking) => Ok(booking),
            CommitOutcome::Rejected(CommitRejection::Overlap) => {
                warn!(
                    tenant_id = %claim.tenant_id,
                    provider_id = %claim.provider_id,
                    date = %claim.date,
                    "Lost race committing booking"
                );
                Err(SlotwiseError::SlotUnavailable {
                    conflict: Conflict::BookingOverlap,
                })
            }
            CommitOutcome::Rejected(CommitRejection::RequestFinalized) => {
                let Some(request_id) = claim.request_id else {
                    return Err(SlotwiseError::Internal(
                        "store reported a finalized request for a direct booking".into(),
                    ));
                };
                let current = self.repos.requests().get_by_id(request_id).await?;
                warn!(request_id = %request_id, status = %current.status, "Lost race confirming request");
                Err(already_finalized(request_id, current.status))
            }
        }
    }

    async fn dispatch(&self, event: NotificationEvent) {
        let kind = event.kind();
        let tenant_id = event.tenant_id();
        if let Err(err) = self.notifier.send(event).await {
            warn!(kind, tenant_id = %tenant_id, error = %err, "Notification failed");
        }
    }
}
