//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs and calendar dates (`YYYY-MM-DD`) are stored as strings, times
//! of day as integer minutes since midnight. Enums are stored as strings
//! with ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "booking_day_guard",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Principals (global scope)
-- =======================================================================
DEFINE TABLE principal SCHEMAFULL;
DEFINE FIELD role ON TABLE principal TYPE string \
    ASSERT $value IN ['PlatformOwner', 'ScopedOperator'];
DEFINE FIELD owner_id ON TABLE principal TYPE option<string>;
DEFINE FIELD display_name ON TABLE principal TYPE string;
DEFINE FIELD email ON TABLE principal TYPE string;
DEFINE FIELD capabilities ON TABLE principal TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD is_active ON TABLE principal TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_principal_email ON TABLE principal \
    COLUMNS email UNIQUE;
DEFINE INDEX idx_principal_owner ON TABLE principal \
    COLUMNS owner_id;

-- =======================================================================
-- Tenants (global scope, owned by a principal)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD owner_principal_id ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD is_active ON TABLE tenant TYPE bool DEFAULT true;
DEFINE FIELD operating_hours ON TABLE tenant TYPE object FLEXIBLE;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_owner ON TABLE tenant \
    COLUMNS owner_principal_id;

-- =======================================================================
-- Services (tenant scope)
-- =======================================================================
DEFINE TABLE service SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE service TYPE string;
DEFINE FIELD name ON TABLE service TYPE string;
DEFINE FIELD description ON TABLE service TYPE string;
DEFINE FIELD duration_type ON TABLE service TYPE string \
    ASSERT $value IN ['Fixed', 'Flexible'];
DEFINE FIELD fixed_duration_minutes ON TABLE service TYPE option<int>;
DEFINE FIELD is_active ON TABLE service TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE service TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE service TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_service_tenant ON TABLE service COLUMNS tenant_id;

-- =======================================================================
-- Providers (tenant scope)
-- =======================================================================
DEFINE TABLE provider SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE provider TYPE string;
DEFINE FIELD name ON TABLE provider TYPE string;
DEFINE FIELD working_hours ON TABLE provider TYPE object FLEXIBLE;
DEFINE FIELD is_active ON TABLE provider TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE provider TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE provider TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_provider_tenant ON TABLE provider COLUMNS tenant_id;

-- =======================================================================
-- Schedule exceptions (tenant scope, one per date)
-- =======================================================================
DEFINE TABLE schedule_exception SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE schedule_exception TYPE string;
DEFINE FIELD date ON TABLE schedule_exception TYPE string;
DEFINE FIELD start_minute ON TABLE schedule_exception TYPE option<int>;
DEFINE FIELD end_minute ON TABLE schedule_exception TYPE option<int>;
DEFINE FIELD reason ON TABLE schedule_exception TYPE string;
DEFINE FIELD created_at ON TABLE schedule_exception TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_exception_tenant_date ON TABLE schedule_exception \
    COLUMNS tenant_id, date UNIQUE;

-- =======================================================================
-- Booking requests (tenant scope)
-- =======================================================================
DEFINE TABLE booking_request SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE booking_request TYPE string;
DEFINE FIELD service_id ON TABLE booking_request TYPE string;
DEFINE FIELD desired_date ON TABLE booking_request TYPE string;
DEFINE FIELD preferred_window ON TABLE booking_request \
    TYPE option<string>;
DEFINE FIELD customer ON TABLE booking_request TYPE object FLEXIBLE;
DEFINE FIELD notes ON TABLE booking_request TYPE option<string>;
DEFINE FIELD status ON TABLE booking_request TYPE string \
    ASSERT $value IN ['Pending', 'Confirmed', 'Rejected'];
DEFINE FIELD booking_id ON TABLE booking_request TYPE option<string>;
DEFINE FIELD rejection_reason ON TABLE booking_request \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE booking_request TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_request_tenant_status ON TABLE booking_request \
    COLUMNS tenant_id, status;

-- =======================================================================
-- Bookings (tenant scope, never deleted)
-- =======================================================================
DEFINE TABLE booking SCHEMAFULL;
DEFINE FIELD request_id ON TABLE booking TYPE option<string>;
DEFINE FIELD tenant_id ON TABLE booking TYPE string;
DEFINE FIELD service_id ON TABLE booking TYPE string;
DEFINE FIELD provider_id ON TABLE booking TYPE string;
DEFINE FIELD date ON TABLE booking TYPE string;
DEFINE FIELD start_minute ON TABLE booking TYPE int;
DEFINE FIELD end_minute ON TABLE booking TYPE int;
DEFINE FIELD duration_minutes ON TABLE booking TYPE int;
DEFINE FIELD customer ON TABLE booking TYPE object FLEXIBLE;
DEFINE FIELD status ON TABLE booking TYPE string \
    ASSERT $value IN ['Active', 'Cancelled'];
DEFINE FIELD cancelled_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_provider_day ON TABLE booking \
    COLUMNS tenant_id, provider_id, date;
DEFINE INDEX idx_booking_tenant_date ON TABLE booking \
    COLUMNS tenant_id, date;
";

// -----------------------------------------------------------------------
// Schema v2: per provider-day commit guard
// -----------------------------------------------------------------------

/// One record per `(tenant, provider, date)`. Every booking commit bumps
/// `seq` on its day, so concurrent commits for the same day write the
/// same key and the store lets only one of them through.
const SCHEMA_V2: &str = "\
DEFINE TABLE booking_day SCHEMAFULL;
DEFINE FIELD seq ON TABLE booking_day TYPE int DEFAULT 0;
DEFINE FIELD updated_at ON TABLE booking_day TYPE datetime \
    DEFAULT time::now();
";

/// Bring the schema up to date and return the resulting version.
///
/// Each pending migration runs in one transaction together with its
/// `_migration` record, so a failed migration leaves no version behind.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = current_version(db).await?;
    let mut version = applied;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying schema migration"
        );
        let sql = format!(
            "BEGIN TRANSACTION;\n{}\n\
             CREATE _migration SET version = $version, name = $name;\n\
             COMMIT TRANSACTION;",
            migration.sql
        );
        db.query(sql)
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "v{} '{}': {e}",
                    migration.version, migration.name
                ))
            })?;
        version = migration.version;
    }

    Ok(version)
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let rows: Vec<MigrationRecord> = result.take(0)?;
    Ok(rows.first().map_or(0, |r| r.version))
}
