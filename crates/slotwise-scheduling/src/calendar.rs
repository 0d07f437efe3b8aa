//! Calendar policy: weekly operating hours plus date-scoped exceptions.

use chrono::NaiveDate;
use slotwise_core::TimeOfDay;
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::calendar::{
    DayHours, ExceptionBlock, OperatingHours, PutScheduleException, ScheduleException,
};
use slotwise_core::models::principal::Principal;
use slotwise_core::models::tenant::{Tenant, UpdateTenant};
use slotwise_core::repository::{Repositories, ScheduleExceptionRepository, TenantRepository};
use slotwise_core::time::TimeRange;
use tracing::info;
use uuid::Uuid;

use crate::permission::{Action, authorize_tenant};

/// The effective opening rules of a tenant on one date.
#[derive(Debug, Clone)]
pub struct DayCalendar {
    pub hours: DayHours,
    pub exception: Option<ScheduleException>,
}

impl DayCalendar {
    pub fn new(hours: DayHours, exception: Option<ScheduleException>) -> Self {
        Self { hours, exception }
    }

    pub fn for_date(
        operating_hours: &OperatingHours,
        date: NaiveDate,
        exception: Option<ScheduleException>,
    ) -> Self {
        Self::new(operating_hours.for_date(date), exception)
    }

    /// Whether the business is open at minute `t`.
    pub fn is_open(&self, t: TimeOfDay) -> bool {
        if self.exception.as_ref().is_some_and(|e| e.blocks(t)) {
            return false;
        }
        self.hours.window().is_some_and(|w| w.contains(t))
    }

    /// True when the business is closed for any part of `interval`:
    /// closed weekday, full-day exception, outside base hours, or an
    /// interval that runs past midnight (`None`).
    pub fn is_closed_for(&self, interval: Option<&TimeRange>) -> bool {
        if matches!(
            self.exception.as_ref().map(|e| e.block),
            Some(ExceptionBlock::FullDay)
        ) {
            return true;
        }
        match (self.hours.window(), interval) {
            (Some(window), Some(interval)) => !window.covers(interval),
            _ => true,
        }
    }

    /// True when a partial-day exception intersects `interval`.
    pub fn is_blocked_by_exception(&self, interval: &TimeRange) -> bool {
        match self.exception.as_ref().map(|e| e.block) {
            Some(ExceptionBlock::Partial { range }) => range.overlaps(interval),
            _ => false,
        }
    }
}

pub struct CalendarPolicy<R: Repositories> {
    repos: R,
}

impl<R: Repositories> CalendarPolicy<R> {
    pub fn new(repos: R) -> Self {
        Self { repos }
    }

    /// Resolve the calendar of an existing tenant for `date`.
    pub async fn day(&self, tenant: &Tenant, date: NaiveDate) -> SlotwiseResult<DayCalendar> {
        let exception = self.repos.exceptions().get_for_date(tenant.id, date).await?;
        Ok(DayCalendar::for_date(&tenant.operating_hours, date, exception))
    }

    pub async fn is_open(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
        time: TimeOfDay,
    ) -> SlotwiseResult<bool> {
        let tenant = self.repos.tenants().get_by_id(tenant_id).await?;
        Ok(self.day(&tenant, date).await?.is_open(time))
    }

    /// Block `range` on `date`, or the whole day when `range` is `None`.
    /// Replaces any earlier exception for the same date.
    pub async fn add_exception(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        date: NaiveDate,
        range: Option<TimeRange>,
        reason: impl Into<String>,
    ) -> SlotwiseResult<ScheduleException> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageSchedule,
            tenant_id,
        )
        .await?;

        let block = match range {
            Some(range) => ExceptionBlock::Partial { range },
            None => ExceptionBlock::FullDay,
        };
        let exception = self
            .repos
            .exceptions()
            .put(PutScheduleException {
                tenant_id,
                date,
                block,
                reason: reason.into(),
            })
            .await?;

        info!(tenant_id = %tenant_id, %date, ?block, "Schedule exception set");
        Ok(exception)
    }

    pub async fn remove_exception(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> SlotwiseResult<()> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageSchedule,
            tenant_id,
        )
        .await?;

        self.repos.exceptions().remove(tenant_id, date).await?;
        info!(tenant_id = %tenant_id, %date, "Schedule exception removed");
        Ok(())
    }

    pub async fn list_exceptions(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SlotwiseResult<Vec<ScheduleException>> {
        authorize_tenant(self.repos.tenants(), principal, Action::ViewTenant, tenant_id).await?;
        self.repos.exceptions().list_between(tenant_id, from, to).await
    }

    pub async fn set_operating_hours(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        hours: OperatingHours,
    ) -> SlotwiseResult<Tenant> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageSchedule,
            tenant_id,
        )
        .await?;

        let tenant = self
            .repos
            .tenants()
            .update(
                tenant_id,
                UpdateTenant {
                    operating_hours: Some(hours),
                    ..Default::default()
                },
            )
            .await?;
        info!(tenant_id = %tenant_id, "Operating hours updated");
        Ok(tenant)
    }
}
