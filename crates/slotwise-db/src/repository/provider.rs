//! SurrealDB implementation of [`ProviderRepository`].

use chrono::{DateTime, Utc};
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::provider::{CreateProvider, Provider, UpdateProvider, WorkingHours};
use slotwise_core::repository::ProviderRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{from_json, parse_uuid, to_json};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProviderRow {
    record_id: String,
    tenant_id: String,
    name: String,
    working_hours: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProviderRow {
    fn try_into_provider(self) -> Result<Provider, DbError> {
        Ok(Provider {
            id: parse_uuid("UUID", &self.record_id)?,
            tenant_id: parse_uuid("tenant UUID", &self.tenant_id)?,
            name: self.name,
            working_hours: from_json::<WorkingHours>("working hours", self.working_hours)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Provider repository.
#[derive(Clone)]
pub struct SurrealProviderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProviderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProviderRepository for SurrealProviderRepository<C> {
    async fn create(&self, input: CreateProvider) -> SlotwiseResult<Provider> {
        let id = Uuid::new_v4();
        let tenant_id = input.tenant_id;
        let hours = to_json("working hours", &input.working_hours)?;

        self.db
            .query(
                "CREATE type::record('provider', $id) SET \
                 tenant_id = $tenant_id, name = $name, \
                 working_hours = $hours, is_active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("hours", hours))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> SlotwiseResult<Provider> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('provider', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "provider".into(),
            id: id_str,
        })?;

        Ok(row.try_into_provider()?)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateProvider,
    ) -> SlotwiseResult<Provider> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.working_hours.is_some() {
            sets.push("working_hours = $hours");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('provider', $id) SET {} \
             WHERE tenant_id = $tenant_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(hours) = input.working_hours {
            builder = builder.bind(("hours", to_json("working hours", &hours)?));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn list(&self, tenant_id: Uuid) -> SlotwiseResult<Vec<Provider>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM provider \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let providers = rows
            .into_iter()
            .map(|row| row.try_into_provider())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(providers)
    }
}
