//! Domain models for Slotwise.
//!
//! These are the core types shared across all crates. Ownership between
//! entities is expressed through ids only; repositories resolve them.

pub mod booking;
pub mod booking_request;
pub mod calendar;
pub mod notification;
pub mod principal;
pub mod provider;
pub mod service;
pub mod slot;
pub mod tenant;
