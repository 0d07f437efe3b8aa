//! Booking request domain model.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How to reach the customer. Delivery is the notification adapter's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Confirmed => "Confirmed",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Confirmed" => Ok(RequestStatus::Confirmed),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// A customer's intent to book a service. Becomes a [`Booking`] only
/// through an authorized confirmation.
///
/// [`Booking`]: crate::models::booking::Booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub desired_date: NaiveDate,
    /// Free-text hint such as "mornings". Never interpreted.
    pub preferred_window: Option<String>,
    pub customer: CustomerContact,
    pub notes: Option<String>,
    pub status: RequestStatus,
    /// Set when the request is confirmed.
    pub booking_id: Option<Uuid>,
    /// Set when the request is rejected.
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub desired_date: NaiveDate,
    pub preferred_window: Option<String>,
    pub customer: CustomerContact,
    pub notes: Option<String>,
}
