//! SurrealDB implementation of [`ServiceRepository`].

use chrono::{DateTime, Utc};
use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::service::{CreateService, DurationType, Service};
use slotwise_core::repository::ServiceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_enum, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ServiceRow {
    record_id: String,
    tenant_id: String,
    name: String,
    description: String,
    duration_type: String,
    fixed_duration_minutes: Option<u32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    fn try_into_service(self) -> Result<Service, DbError> {
        Ok(Service {
            id: parse_uuid("UUID", &self.record_id)?,
            tenant_id: parse_uuid("tenant UUID", &self.tenant_id)?,
            name: self.name,
            description: self.description,
            duration_type: parse_enum::<DurationType>(&self.duration_type)?,
            fixed_duration_minutes: self.fixed_duration_minutes,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Service repository.
#[derive(Clone)]
pub struct SurrealServiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ServiceRepository for SurrealServiceRepository<C> {
    async fn create(&self, input: CreateService) -> SlotwiseResult<Service> {
        let id = Uuid::new_v4();
        let tenant_id = input.tenant_id;

        let result = self
            .db
            .query(
                "CREATE type::record('service', $id) SET \
                 tenant_id = $tenant_id, name = $name, \
                 description = $description, \
                 duration_type = $duration_type, \
                 fixed_duration_minutes = $fixed_duration_minutes, \
                 is_active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("duration_type", input.duration_type.as_str()))
            .bind(("fixed_duration_minutes", input.fixed_duration_minutes))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> SlotwiseResult<Service> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('service', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service".into(),
            id: id_str,
        })?;

        Ok(row.try_into_service()?)
    }

    async fn set_active(&self, tenant_id: Uuid, id: Uuid, is_active: bool) -> SlotwiseResult<Service> {
        self.db
            .query(
                "UPDATE type::record('service', $id) SET \
                 is_active = $is_active, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("is_active", is_active))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(tenant_id, id).await
    }

    async fn list(&self, tenant_id: Uuid, active_only: bool) -> SlotwiseResult<Vec<Service>> {
        let query = if active_only {
            "SELECT meta::id(id) AS record_id, * FROM service \
             WHERE tenant_id = $tenant_id AND is_active = true \
             ORDER BY created_at ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM service \
             WHERE tenant_id = $tenant_id \
             ORDER BY created_at ASC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRow> = result.take(0).map_err(DbError::from)?;
        let services = rows
            .into_iter()
            .map(|row| row.try_into_service())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(services)
    }
}
