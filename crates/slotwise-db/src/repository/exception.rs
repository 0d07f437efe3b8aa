//! SurrealDB implementation of [`ScheduleExceptionRepository`].
//!
//! Exceptions are keyed by `{tenant_id}_{date}` so that writing a second
//! exception for the same date replaces the first.

use chrono::{DateTime, NaiveDate, Utc};
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::calendar::{ExceptionBlock, PutScheduleException, ScheduleException};
use slotwise_core::repository::ScheduleExceptionRepository;
use slotwise_core::time::TimeRange;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_date, parse_minutes, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ExceptionRow {
    tenant_id: String,
    date: String,
    start_minute: Option<u32>,
    end_minute: Option<u32>,
    reason: String,
    created_at: DateTime<Utc>,
}

impl ExceptionRow {
    fn try_into_exception(self) -> Result<ScheduleException, DbError> {
        let block = match (self.start_minute, self.end_minute) {
            (None, None) => ExceptionBlock::FullDay,
            (Some(start), Some(end)) => {
                let range = TimeRange::new(parse_minutes(start)?, parse_minutes(end)?)
                    .map_err(|e| DbError::decode("exception range", e))?;
                ExceptionBlock::Partial { range }
            }
            _ => {
                return Err(DbError::Decode(
                    "exception range has only one bound".into(),
                ));
            }
        };
        Ok(ScheduleException {
            tenant_id: parse_uuid("tenant UUID", &self.tenant_id)?,
            date: parse_date(&self.date)?,
            block,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

fn record_key(tenant_id: Uuid, date: NaiveDate) -> String {
    format!("{tenant_id}_{date}")
}

/// SurrealDB implementation of the ScheduleException repository.
#[derive(Clone)]
pub struct SurrealScheduleExceptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScheduleExceptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScheduleExceptionRepository for SurrealScheduleExceptionRepository<C> {
    async fn put(&self, input: PutScheduleException) -> SlotwiseResult<ScheduleException> {
        let (start_minute, end_minute) = match input.block {
            ExceptionBlock::FullDay => (None, None),
            ExceptionBlock::Partial { range } => {
                (Some(range.start.minutes()), Some(range.end.minutes()))
            }
        };

        // Last write wins: the record key is derived from (tenant, date).
        self.db
            .query(
                "UPSERT type::record('schedule_exception', $key) SET \
                 tenant_id = $tenant_id, date = $date, \
                 start_minute = $start_minute, end_minute = $end_minute, \
                 reason = $reason, created_at = time::now()",
            )
            .bind(("key", record_key(input.tenant_id, input.date)))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("date", input.date.to_string()))
            .bind(("start_minute", start_minute))
            .bind(("end_minute", end_minute))
            .bind(("reason", input.reason))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_for_date(input.tenant_id, input.date)
            .await?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "schedule_exception".into(),
                    id: record_key(input.tenant_id, input.date),
                }
                .into()
            })
    }

    async fn get_for_date(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> SlotwiseResult<Option<ScheduleException>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('schedule_exception', $key)")
            .bind(("key", record_key(tenant_id, date)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ExceptionRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_exception())
            .transpose()
            .map_err(Into::into)
    }

    async fn list_between(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SlotwiseResult<Vec<ScheduleException>> {
        // ISO dates compare correctly as strings.
        let mut result = self
            .db
            .query(
                "SELECT * FROM schedule_exception \
                 WHERE tenant_id = $tenant_id \
                 AND date >= $from AND date <= $to \
                 ORDER BY date ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("from", from.to_string()))
            .bind(("to", to.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ExceptionRow> = result.take(0).map_err(DbError::from)?;
        let exceptions = rows
            .into_iter()
            .map(|row| row.try_into_exception())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(exceptions)
    }

    async fn remove(&self, tenant_id: Uuid, date: NaiveDate) -> SlotwiseResult<()> {
        self.db
            .query("DELETE type::record('schedule_exception', $key)")
            .bind(("key", record_key(tenant_id, date)))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
