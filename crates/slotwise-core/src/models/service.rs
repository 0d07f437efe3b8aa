//! Service domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DurationType {
    /// Duration is known when the service is defined.
    Fixed,
    /// Duration is decided by an operator when confirming a request.
    Flexible,
}

impl DurationType {
    pub fn as_str(self) -> &'static str {
        match self {
            DurationType::Fixed => "Fixed",
            DurationType::Flexible => "Flexible",
        }
    }
}

impl std::str::FromStr for DurationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fixed" => Ok(DurationType::Fixed),
            "Flexible" => Ok(DurationType::Flexible),
            other => Err(format!("unknown duration type: {other}")),
        }
    }
}

/// A bookable offering of a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_type: DurationType,
    /// Present iff `duration_type` is `Fixed`.
    pub fixed_duration_minutes: Option<u32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Flexible services need an operator to pick duration and time.
    pub fn requires_manual_confirmation(&self) -> bool {
        self.duration_type == DurationType::Flexible
    }
}

/// Caller-supplied definition of a new service. Validated by the
/// catalog before it reaches the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub description: String,
    pub duration_type: DurationType,
    pub fixed_duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_type: DurationType,
    pub fixed_duration_minutes: Option<u32>,
}
