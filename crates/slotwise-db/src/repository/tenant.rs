//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::calendar::OperatingHours;
use slotwise_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use slotwise_core::repository::{PaginatedResult, Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, from_json, parse_uuid, to_json};
use crate::error::DbError;

/// DB-side row struct; the record ID is projected via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    record_id: String,
    owner_principal_id: String,
    name: String,
    is_active: bool,
    operating_hours: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid("UUID", &self.record_id)?,
            owner_principal_id: parse_uuid("owner UUID", &self.owner_principal_id)?,
            name: self.name,
            is_active: self.is_active,
            operating_hours: from_json::<OperatingHours>("operating hours", self.operating_hours)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn count_where(&self, filter: &str, owner: Option<String>) -> Result<u64, DbError> {
        let query = format!("SELECT count() AS total FROM tenant {filter} GROUP ALL");
        let mut result = self.db.query(query).bind(("owner", owner)).await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn page_where(
        &self,
        filter: &str,
        owner: Option<String>,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<Tenant>> {
        let total = self.count_where(filter, owner.clone()).await?;

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM tenant {filter} \
             ORDER BY created_at ASC \
             LIMIT $limit START $offset"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("owner", owner))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> SlotwiseResult<Tenant> {
        let id = Uuid::new_v4();
        let hours = to_json("operating hours", &input.operating_hours)?;

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 owner_principal_id = $owner, name = $name, \
                 is_active = true, operating_hours = $hours",
            )
            .bind(("id", id.to_string()))
            .bind(("owner", input.owner_principal_id.to_string()))
            .bind(("name", input.name))
            .bind(("hours", hours))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> SlotwiseResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('tenant', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> SlotwiseResult<Tenant> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.operating_hours.is_some() {
            sets.push("operating_hours = $hours");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('tenant', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(hours) = input.operating_hours {
            builder = builder.bind(("hours", to_json("operating hours", &hours)?));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> SlotwiseResult<()> {
        self.db
            .query("DELETE type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> SlotwiseResult<PaginatedResult<Tenant>> {
        self.page_where("", None, pagination).await
    }

    async fn list_by_owner(
        &self,
        owner_principal_id: Uuid,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<Tenant>> {
        self.page_where(
            "WHERE owner_principal_id = $owner",
            Some(owner_principal_id.to_string()),
            pagination,
        )
        .await
    }
}
