//! Outbound notification events.
//!
//! Emitted by the booking state machine after a transition has been
//! committed. Delivery (email, SMS, push) belongs to the adapter.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::booking_request::{BookingRequest, CustomerContact};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NotificationEvent {
    BookingConfirmed {
        tenant_id: Uuid,
        customer: CustomerContact,
        booking: Booking,
    },
    BookingRejected {
        tenant_id: Uuid,
        customer: CustomerContact,
        request: BookingRequest,
        reason: String,
    },
    BookingCancelled {
        tenant_id: Uuid,
        customer: CustomerContact,
        booking: Booking,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::BookingConfirmed { .. } => "booking.confirmed",
            NotificationEvent::BookingRejected { .. } => "booking.rejected",
            NotificationEvent::BookingCancelled { .. } => "booking.cancelled",
        }
    }

    pub fn tenant_id(&self) -> Uuid {
        match self {
            NotificationEvent::BookingConfirmed { tenant_id, .. }
            | NotificationEvent::BookingRejected { tenant_id, .. }
            | NotificationEvent::BookingCancelled { tenant_id, .. } => *tenant_id,
        }
    }

    pub fn customer(&self) -> &CustomerContact {
        match self {
            NotificationEvent::BookingConfirmed { customer, .. }
            | NotificationEvent::BookingRejected { customer, .. }
            | NotificationEvent::BookingCancelled { customer, .. } => customer,
        }
    }
}
