//! Availability engine.
//!
//! Loads everything that constrains one provider on one date into a
//! [`DaySnapshot`], then evaluates candidate intervals against it without
//! further I/O. Conflicts are reported in a fixed priority order:
//! closed day, provider hours, partial exception, existing booking.

use chrono::{Datelike, NaiveDate};
use slotwise_core::TimeOfDay;
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::slot::Conflict;
use slotwise_core::repository::{
    BookingRepository, ProviderRepository, Repositories, ScheduleExceptionRepository,
    TenantRepository,
};
use slotwise_core::time::TimeRange;
use tracing::debug;
use uuid::Uuid;

use crate::calendar::DayCalendar;
use crate::catalog::check_duration;
use crate::config::SchedulingConfig;
use crate::error::SchedulingError;

/// Free/busy state of one provider on one date.
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    pub calendar: DayCalendar,
    /// `None` when the provider is inactive or does not work that weekday.
    pub provider_window: Option<TimeRange>,
    /// Intervals of the provider's active bookings.
    pub bookings: Vec<TimeRange>,
}

impl DaySnapshot {
    /// First conflict for `[start, start + duration)`, or `None` if the
    /// interval is bookable. `duration_minutes` must be non-zero.
    pub fn evaluate(&self, start: TimeOfDay, duration_minutes: u32) -> Option<Conflict> {
        let interval = start
            .checked_add(duration_minutes)
            .and_then(|end| TimeRange::new(start, end).ok());

        if self.calendar.is_closed_for(interval.as_ref()) {
            return Some(Conflict::ClosedDay);
        }
        let Some(interval) = interval else {
            return Some(Conflict::ClosedDay);
        };
        if !self.provider_window.is_some_and(|w| w.covers(&interval)) {
            return Some(Conflict::OutsideProviderHours);
        }
        if self.calendar.is_blocked_by_exception(&interval) {
            return Some(Conflict::ScheduleException);
        }
        if self.bookings.iter().any(|b| b.overlaps(&interval)) {
            return Some(Conflict::BookingOverlap);
        }
        None
    }

    /// Conflict-free start times, stepping from the start of the
    /// provider's working window. A zero step yields nothing.
    pub fn open_slots(self, duration_minutes: u32, granularity_minutes: u32) -> OpenSlots {
        let next = self
            .provider_window
            .filter(|_| granularity_minutes > 0)
            .map(|w| w.start.minutes());
        OpenSlots {
            snapshot: self,
            duration_minutes,
            granularity_minutes,
            next,
        }
    }
}

/// Lazy sequence of bookable start times. Cloning restarts from the
/// current position; a fresh sequence always yields the same starts.
#[derive(Debug, Clone)]
pub struct OpenSlots {
    snapshot: DaySnapshot,
    duration_minutes: u32,
    granularity_minutes: u32,
    next: Option<u32>,
}

impl Iterator for OpenSlots {
    type Item = TimeOfDay;

    fn next(&mut self) -> Option<TimeOfDay> {
        let window = self.snapshot.provider_window?;
        loop {
            let start = self.next?;
            let fits = start
                .checked_add(self.duration_minutes)
                .is_some_and(|end| end <= window.end.minutes());
            if !fits {
                self.next = None;
                return None;
            }
            self.next = start.checked_add(self.granularity_minutes);

            let candidate = TimeOfDay::from_minutes(start).ok()?;
            if self.snapshot.evaluate(candidate, self.duration_minutes).is_none() {
                return Some(candidate);
            }
        }
    }
}

pub struct AvailabilityEngine<R: Repositories> {
    repos: R,
    config: SchedulingConfig,
}

impl<R: Repositories> AvailabilityEngine<R> {
    pub fn new(repos: R, config: SchedulingConfig) -> Self {
        Self { repos, config }
    }

    /// Load the free/busy state of `provider_id` on `date`.
    pub async fn snapshot(
        &self,
        tenant_id: Uuid,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> SlotwiseResult<DaySnapshot> {
        let tenant = self.repos.tenants().get_by_id(tenant_id).await?;
        let provider = self
            .repos
            .providers()
            .get_by_id(tenant_id, provider_id)
            .await?;
        let exception = self.repos.exceptions().get_for_date(tenant_id, date).await?;
        let bookings = self
            .repos
            .bookings()
            .list_active_for_provider(tenant_id, provider_id, date)
            .await?;

        let provider_window = if provider.is_active {
            provider.working_hours.window_on(date.weekday())
        } else {
            None
        };

        Ok(DaySnapshot {
            calendar: DayCalendar::for_date(&tenant.operating_hours, date, exception),
            provider_window,
            bookings: bookings.iter().map(|b| b.interval()).collect(),
        })
    }

    pub async fn find_conflict(
        &self,
        tenant_id: Uuid,
        provider_id: Uuid,
        date: NaiveDate,
        start_time: TimeOfDay,
        duration_minutes: u32,
    ) -> SlotwiseResult<Option<Conflict>> {
        check_duration(duration_minutes, &self.config)?;

        let snapshot = self.snapshot(tenant_id, provider_id, date).await?;
        let conflict = snapshot.evaluate(start_time, duration_minutes);
        debug!(
            tenant_id = %tenant_id,
            provider_id = %provider_id,
            %date,
            start = %start_time,
            duration_minutes,
            ?conflict,
            "Slot evaluated"
        );
        Ok(conflict)
    }

    /// Open start times for `duration_minutes`. Uses the configured
    /// granularity when `granularity_minutes` is `None`.
    pub async fn list_open_slots(
        &self,
        tenant_id: Uuid,
        provider_id: Uuid,
        date: NaiveDate,
        duration_minutes: u32,
        granularity_minutes: Option<u32>,
    ) -> SlotwiseResult<OpenSlots> {
        check_duration(duration_minutes, &self.config)?;
        let granularity = granularity_minutes.unwrap_or(self.config.slot_granularity_minutes);
        if granularity == 0 {
            return Err(SchedulingError::ZeroGranularity.into());
        }

        let snapshot = self.snapshot(tenant_id, provider_id, date).await?;
        Ok(snapshot.open_slots(duration_minutes, granularity))
    }
}
