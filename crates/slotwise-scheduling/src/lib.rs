//! Slotwise Scheduling — permission model, service catalog, calendar
//! policy, availability engine and the booking request state machine.
//!
//! Every service here is generic over [`Repositories`] so that the
//! scheduling layer has no dependency on the database crate.
//!
//! [`Repositories`]: slotwise_core::repository::Repositories

pub mod availability;
pub mod booking;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod locks;
pub mod notify;
pub mod permission;

pub use availability::{AvailabilityEngine, DaySnapshot, OpenSlots};
pub use booking::{BookingService, BookingSummary, ConfirmBooking, DirectBooking, SubmitRequest};
pub use calendar::{CalendarPolicy, DayCalendar};
pub use catalog::ServiceCatalog;
pub use config::SchedulingConfig;
pub use directory::Directory;
pub use error::SchedulingError;
pub use notify::{ChannelNotifier, NotificationPort, TracingNotifier};
pub use permission::{Action, Decision, Resource, authorize};
