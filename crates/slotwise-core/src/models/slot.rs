//! Slot evaluation types shared by the availability engine and errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason a proposed interval cannot be booked. Variants are listed in
/// evaluation priority order; only the first failing one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conflict {
    ClosedDay,
    OutsideProviderHours,
    ScheduleException,
    BookingOverlap,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Conflict::ClosedDay => "business is closed",
            Conflict::OutsideProviderHours => "outside provider working hours",
            Conflict::ScheduleException => "blocked by a schedule exception",
            Conflict::BookingOverlap => "overlaps an existing booking",
        };
        f.write_str(s)
    }
}
