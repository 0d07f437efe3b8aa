//! SurrealDB implementation of [`BookingRepository`].
//!
//! Bookings are never deleted. Cancelling flips `status` to `Cancelled`,
//! which removes the booking from every overlap check.

use chrono::{DateTime, NaiveDate, Utc};
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::booking::{
    Booking, BookingStatus, CommitBooking, CommitOutcome, CommitRejection,
};
use slotwise_core::models::booking_request::CustomerContact;
use slotwise_core::repository::BookingRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{StatusRow, from_json, parse_date, parse_enum, parse_minutes, parse_uuid, to_json};
use crate::error::DbError;

/// Overlap re-check, request guard and both writes in one transaction.
/// Nothing is written unless the interval is free and the linked
/// request (when there is one) is still pending. The `booking_day` bump
/// comes first so that two commits for one provider day always write the
/// same key and cannot both succeed.
const COMMIT_BOOKING: &str = "\
BEGIN TRANSACTION;
UPSERT type::record('booking_day', $day_key) SET \
    seq += 1, updated_at = time::now();
LET $clash = (SELECT VALUE meta::id(id) FROM booking \
    WHERE tenant_id = $tenant_id AND provider_id = $provider_id \
    AND date = $date AND status = 'Active' \
    AND start_minute < $end_minute AND end_minute > $start_minute);
LET $pending = (SELECT VALUE status FROM type::record('booking_request', $request_key) \
    WHERE status = 'Pending');
IF array::len($clash) = 0 AND ($has_request = false OR array::len($pending) = 1) {
    CREATE type::record('booking', $id) SET \
        request_id = $request_id, tenant_id = $tenant_id, \
        service_id = $service_id, provider_id = $provider_id, \
        date = $date, start_minute = $start_minute, \
        end_minute = $end_minute, duration_minutes = $duration_minutes, \
        customer = $customer, status = 'Active';
    IF $has_request {
        UPDATE type::record('booking_request', $request_key) SET \
            status = 'Confirmed', booking_id = $id, \
            updated_at = time::now();
    };
};
COMMIT TRANSACTION;
";

#[derive(Debug, SurrealValue)]
struct BookingRow {
    record_id: String,
    request_id: Option<String>,
    tenant_id: String,
    service_id: String,
    provider_id: String,
    date: String,
    start_minute: u32,
    end_minute: u32,
    duration_minutes: u32,
    customer: serde_json::Value,
    status: String,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn try_into_booking(self) -> Result<Booking, DbError> {
        let request_id = self
            .request_id
            .as_deref()
            .map(|raw| parse_uuid("request UUID", raw))
            .transpose()?;
        Ok(Booking {
            id: parse_uuid("UUID", &self.record_id)?,
            request_id,
            tenant_id: parse_uuid("tenant UUID", &self.tenant_id)?,
            service_id: parse_uuid("service UUID", &self.service_id)?,
            provider_id: parse_uuid("provider UUID", &self.provider_id)?,
            date: parse_date(&self.date)?,
            start_time: parse_minutes(self.start_minute)?,
            end_time: parse_minutes(self.end_minute)?,
            duration_minutes: self.duration_minutes,
            customer: from_json::<CustomerContact>("customer", self.customer)?,
            status: parse_enum::<BookingStatus>(&self.status)?,
            cancelled_at: self.cancelled_at,
            created_at: self.created_at,
        })
    }
}

/// A commit aborted by a concurrent commit on the same day is re-run this
/// many times in total; the re-run then sees the winner's booking.
const COMMIT_ATTEMPTS: u32 = 3;

fn day_key(input: &CommitBooking) -> String {
    format!("{}:{}:{}", input.tenant_id, input.provider_id, input.date)
}

fn collect_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, DbError> {
    rows.into_iter().map(|row| row.try_into_booking()).collect()
}

/// SurrealDB implementation of the Booking repository.
#[derive(Clone)]
pub struct SurrealBookingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('booking', $id)",
            )
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<BookingRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_booking())
            .transpose()
    }

    async fn run_commit(
        &self,
        id: Uuid,
        input: &CommitBooking,
        customer: serde_json::Value,
    ) -> Result<(), DbError> {
        let request_id = input.request_id.map(|r| r.to_string());
        self.db
            .query(COMMIT_BOOKING)
            .bind(("id", id.to_string()))
            .bind(("day_key", day_key(input)))
            .bind(("has_request", request_id.is_some()))
            .bind((
                "request_key",
                request_id.clone().unwrap_or_else(|| Uuid::nil().to_string()),
            ))
            .bind(("request_id", request_id))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("service_id", input.service_id.to_string()))
            .bind(("provider_id", input.provider_id.to_string()))
            .bind(("date", input.date.to_string()))
            .bind(("start_minute", input.start_time.minutes()))
            .bind(("end_minute", input.end_time.minutes()))
            .bind(("duration_minutes", input.duration_minutes))
            .bind(("customer", customer))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    /// After a commit wrote nothing, work out which guard refused it.
    async fn rejection_reason(&self, request_id: Option<Uuid>) -> Result<CommitRejection, DbError> {
        let Some(request_id) = request_id else {
            return Ok(CommitRejection::Overlap);
        };

        let mut result = self
            .db
            .query(
                "SELECT status FROM type::record('booking_request', $id) \
                 WHERE status = 'Pending'",
            )
            .bind(("id", request_id.to_string()))
            .await?;

        let pending: Vec<StatusRow> = result.take(0)?;
        if pending.is_empty() {
            Ok(CommitRejection::RequestFinalized)
        } else {
            Ok(CommitRejection::Overlap)
        }
    }
}

impl<C: Connection> BookingRepository for SurrealBookingRepository<C> {
    async fn commit(&self, input: CommitBooking) -> SlotwiseResult<CommitOutcome> {
        let id = Uuid::new_v4();
        let customer = to_json("customer", &input.customer)?;

        let mut attempt = 1;
        while let Err(err) = self.run_commit(id, &input, customer.clone()).await {
            // The aborted attempt may still have landed before the error
            // surfaced.
            if self.find(id).await?.is_some() {
                break;
            }
            if attempt >= COMMIT_ATTEMPTS {
                return Err(err.into());
            }
            warn!(
                provider_id = %input.provider_id,
                date = %input.date,
                attempt,
                error = %err,
                "Booking commit aborted, retrying"
            );
            attempt += 1;
        }

        match self.find(id).await? {
            Some(booking) => Ok(CommitOutcome::Committed(booking)),
            None => {
                let reason = self.rejection_reason(input.request_id).await?;
                debug!(
                    provider_id = %input.provider_id,
                    date = %input.date,
                    ?reason,
                    "Booking commit refused"
                );
                Ok(CommitOutcome::Rejected(reason))
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> SlotwiseResult<Booking> {
        self.find(id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "booking".into(),
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn list_active_for_provider(
        &self,
        tenant_id: Uuid,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> SlotwiseResult<Vec<Booking>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE tenant_id = $tenant_id AND provider_id = $provider_id \
                 AND date = $date AND status = 'Active' \
                 ORDER BY start_minute ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("provider_id", provider_id.to_string()))
            .bind(("date", date.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect_bookings(rows)?)
    }

    async fn list_between(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SlotwiseResult<Vec<Booking>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE tenant_id = $tenant_id \
                 AND date >= $from AND date <= $to \
                 ORDER BY date ASC, start_minute ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("from", from.to_string()))
            .bind(("to", to.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect_bookings(rows)?)
    }

    async fn cancel(&self, tenant_id: Uuid, id: Uuid) -> SlotwiseResult<Option<Booking>> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('booking', $id) SET \
                 status = 'Cancelled', cancelled_at = time::now() \
                 WHERE tenant_id = $tenant_id AND status = 'Active'",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let updated: Vec<StatusRow> = result.take(0).map_err(DbError::from)?;
        if updated.is_empty() {
            return Ok(None);
        }

        self.get_by_id(id).await.map(Some)
    }
}
