//! Booking domain model.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking_request::CustomerContact;
use crate::time::{TimeOfDay, TimeRange};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Active,
    /// Kept for history; no longer occupies its interval.
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Active => "Active",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(BookingStatus::Active),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// A confirmed, time-exact commitment of a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// `None` for direct bookings of fixed-duration services.
    pub request_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub duration_minutes: u32,
    pub customer: CustomerContact,
    pub status: BookingStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn interval(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// Input for the atomic booking commit.
///
/// The store re-checks that no active booking of the provider overlaps
/// `[start_time, end_time)` on `date` and, when `request_id` is set, that
/// the request is still pending. Both writes happen together or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitBooking {
    pub request_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub duration_minutes: u32,
    pub customer: CustomerContact,
}

/// Why an atomic commit wrote nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRejection {
    /// An active booking of the provider overlaps the interval.
    Overlap,
    /// The linked request is no longer pending.
    RequestFinalized,
}

/// Result of [`BookingRepository::commit`].
///
/// [`BookingRepository::commit`]: crate::repository::BookingRepository::commit
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed(Booking),
    Rejected(CommitRejection),
}
