//! Tenant domain model.
//!
//! A tenant is a managed business. It is created by exactly one principal,
//! which becomes its owner for authorization purposes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::calendar::OperatingHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// The principal that created this tenant.
    pub owner_principal_id: Uuid,
    pub name: String,
    pub is_active: bool,
    /// Base weekly schedule. Date-scoped overrides live in their own
    /// repository.
    pub operating_hours: OperatingHours,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub owner_principal_id: Uuid,
    pub name: String,
    pub operating_hours: OperatingHours,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub operating_hours: Option<OperatingHours>,
}
