//! Provider domain model.
//!
//! A provider is a staff resource of a tenant. Bookings are always made
//! against a provider.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::TimeRange;

/// Weekly availability of a provider: the same hours on every working day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub days: Vec<Weekday>,
    pub hours: TimeRange,
}

impl WorkingHours {
    /// The working window on `weekday`, if the provider works that day.
    pub fn window_on(&self, weekday: Weekday) -> Option<TimeRange> {
        self.days.contains(&weekday).then_some(self.hours)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub working_hours: WorkingHours,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProvider {
    pub tenant_id: Uuid,
    pub name: String,
    pub working_hours: WorkingHours,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProvider {
    pub name: Option<String>,
    pub working_hours: Option<WorkingHours>,
    pub is_active: Option<bool>,
}
