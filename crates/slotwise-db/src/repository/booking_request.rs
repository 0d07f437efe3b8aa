//! SurrealDB implementation of [`BookingRequestRepository`].

use chrono::{DateTime, Utc};
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::booking_request::{
    BookingRequest, CreateBookingRequest, CustomerContact, RequestStatus,
};
use slotwise_core::repository::{BookingRequestRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, StatusRow, from_json, parse_date, parse_enum, parse_uuid, to_json};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RequestRow {
    record_id: String,
    tenant_id: String,
    service_id: String,
    desired_date: String,
    preferred_window: Option<String>,
    customer: serde_json::Value,
    notes: Option<String>,
    status: String,
    booking_id: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn try_into_request(self) -> Result<BookingRequest, DbError> {
        let booking_id = self
            .booking_id
            .as_deref()
            .map(|raw| parse_uuid("booking UUID", raw))
            .transpose()?;
        Ok(BookingRequest {
            id: parse_uuid("UUID", &self.record_id)?,
            tenant_id: parse_uuid("tenant UUID", &self.tenant_id)?,
            service_id: parse_uuid("service UUID", &self.service_id)?,
            desired_date: parse_date(&self.desired_date)?,
            preferred_window: self.preferred_window,
            customer: from_json::<CustomerContact>("customer", self.customer)?,
            notes: self.notes,
            status: parse_enum::<RequestStatus>(&self.status)?,
            booking_id,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the BookingRequest repository.
#[derive(Clone)]
pub struct SurrealBookingRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BookingRequestRepository for SurrealBookingRequestRepository<C> {
    async fn create(&self, input: CreateBookingRequest) -> SlotwiseResult<BookingRequest> {
        let id = Uuid::new_v4();
        let customer = to_json("customer", &input.customer)?;

        self.db
            .query(
                "CREATE type::record('booking_request', $id) SET \
                 tenant_id = $tenant_id, service_id = $service_id, \
                 desired_date = $desired_date, \
                 preferred_window = $preferred_window, \
                 customer = $customer, notes = $notes, \
                 status = 'Pending'",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("service_id", input.service_id.to_string()))
            .bind(("desired_date", input.desired_date.to_string()))
            .bind(("preferred_window", input.preferred_window))
            .bind(("customer", customer))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> SlotwiseResult<BookingRequest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('booking_request', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking_request".into(),
            id: id_str,
        })?;

        Ok(row.try_into_request()?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        status: Option<RequestStatus>,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<BookingRequest>> {
        let filter = if status.is_some() {
            "WHERE tenant_id = $tenant_id AND status = $status"
        } else {
            "WHERE tenant_id = $tenant_id"
        };
        let status = status.map(|s| s.as_str());
        let tenant_id_str = tenant_id.to_string();

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM booking_request {filter} GROUP ALL"
            ))
            .bind(("tenant_id", tenant_id_str.clone()))
            .bind(("status", status))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM booking_request {filter} \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("tenant_id", tenant_id_str))
            .bind(("status", status))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_request())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn reject(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        reason: String,
    ) -> SlotwiseResult<Option<BookingRequest>> {
        // The status guard in WHERE makes the transition a compare-and-set.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('booking_request', $id) SET \
                 status = 'Rejected', rejection_reason = $reason, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND status = 'Pending'",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("reason", reason))
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
