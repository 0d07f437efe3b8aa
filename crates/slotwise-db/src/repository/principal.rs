//! SurrealDB implementation of [`PrincipalRepository`].

use chrono::{DateTime, Utc};
use slotwise_core::error::{SlotwiseError, SlotwiseResult};
use slotwise_core::models::principal::{
    CapabilitySet, CreatePrincipal, Principal, Role, UpdatePrincipal,
};
use slotwise_core::repository::{PaginatedResult, Pagination, PrincipalRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, from_json, parse_enum, parse_uuid, to_json};
use crate::error::DbError;

const SELECT_BY_ID: &str = "SELECT meta::id(id) AS record_id, * \
     FROM type::record('principal', $id)";

#[derive(Debug, SurrealValue)]
struct PrincipalRow {
    record_id: String,
    role: String,
    owner_id: Option<String>,
    display_name: String,
    email: String,
    capabilities: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    fn try_into_principal(self) -> Result<Principal, DbError> {
        let owner_id = self
            .owner_id
            .as_deref()
            .map(|raw| parse_uuid("owner UUID", raw))
            .transpose()?;
        Ok(Principal {
            id: parse_uuid("UUID", &self.record_id)?,
            role: parse_enum::<Role>(&self.role)?,
            owner_id,
            display_name: self.display_name,
            email: self.email,
            capabilities: from_json::<CapabilitySet>("capabilities", self.capabilities)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Principal repository.
#[derive(Clone)]
pub struct SurrealPrincipalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPrincipalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> SlotwiseResult<Principal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_BY_ID)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_principal()?)
    }
}

impl<C: Connection> PrincipalRepository for SurrealPrincipalRepository<C> {
    async fn create(&self, input: CreatePrincipal) -> SlotwiseResult<Principal> {
        let id = Uuid::new_v4();
        let capabilities = to_json("capabilities", &input.capabilities)?;

        let result = self
            .db
            .query(
                "CREATE type::record('principal', $id) SET \
                 role = $role, owner_id = $owner_id, \
                 display_name = $display_name, email = $email, \
                 capabilities = $capabilities, is_active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("role", input.role.as_str()))
            .bind(("owner_id", input.owner_id.map(|o| o.to_string())))
            .bind(("display_name", input.display_name))
            .bind(("email", input.email))
            .bind(("capabilities", capabilities))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(|e| {
            let msg = e.to_string();
            if msg.contains("idx_principal_email") {
                SlotwiseError::AlreadyExists {
                    entity: "principal".into(),
                }
            } else {
                DbError::Query(msg).into()
            }
        })?;

        self.fetch(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> SlotwiseResult<Principal> {
        self.fetch(id).await
    }

    async fn get_platform_owner(&self) -> SlotwiseResult<Option<Principal>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM principal \
                 WHERE role = 'PlatformOwner' \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_principal())
            .transpose()
            .map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdatePrincipal) -> SlotwiseResult<Principal> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.capabilities.is_some() {
            sets.push("capabilities = $capabilities");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('principal', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(capabilities) = input.capabilities {
            builder = builder.bind(("capabilities", to_json("capabilities", &capabilities)?));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.fetch(id).await
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<Principal>> {
        let owner_id_str = owner_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM principal \
                 WHERE owner_id = $owner_id GROUP ALL",
            )
            .bind(("owner_id", owner_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM principal \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("owner_id", owner_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_principal())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
