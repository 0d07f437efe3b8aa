//! SurrealDB repository implementations.

mod booking;
mod booking_request;
mod exception;
mod principal;
mod provider;
mod service;
mod tenant;

use chrono::NaiveDate;
use slotwise_core::repository::Repositories;
use slotwise_core::time::TimeOfDay;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

pub use booking::SurrealBookingRepository;
pub use booking_request::SurrealBookingRequestRepository;
pub use exception::SurrealScheduleExceptionRepository;
pub use principal::SurrealPrincipalRepository;
pub use provider::SurrealProviderRepository;
pub use service::SurrealServiceRepository;
pub use tenant::SurrealTenantRepository;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// Row struct for guarded updates where only "did anything match" matters.
#[derive(Debug, SurrealValue)]
pub(crate) struct StatusRow {
    #[allow(dead_code)]
    pub(crate) status: String,
}

pub(crate) fn parse_uuid(what: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::decode(what, e))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DbError> {
    raw.parse::<NaiveDate>()
        .map_err(|e| DbError::decode("date", e))
}

pub(crate) fn parse_minutes(raw: u32) -> Result<TimeOfDay, DbError> {
    TimeOfDay::from_minutes(raw).map_err(|e| DbError::decode("time of day", e))
}

pub(crate) fn parse_enum<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T, DbError> {
    raw.parse::<T>().map_err(DbError::Decode)
}

pub(crate) fn to_json<T: serde::Serialize>(what: &str, value: &T) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(value).map_err(|e| DbError::decode(what, e))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(
    what: &str,
    value: serde_json::Value,
) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::decode(what, e))
}

/// All SurrealDB repositories over one shared client.
#[derive(Clone)]
pub struct SurrealRepositories<C: Connection> {
    principals: SurrealPrincipalRepository<C>,
    tenants: SurrealTenantRepository<C>,
    services: SurrealServiceRepository<C>,
    providers: SurrealProviderRepository<C>,
    exceptions: SurrealScheduleExceptionRepository<C>,
    requests: SurrealBookingRequestRepository<C>,
    bookings: SurrealBookingRepository<C>,
}

impl<C: Connection> SurrealRepositories<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            principals: SurrealPrincipalRepository::new(db.clone()),
            tenants: SurrealTenantRepository::new(db.clone()),
            services: SurrealServiceRepository::new(db.clone()),
            providers: SurrealProviderRepository::new(db.clone()),
            exceptions: SurrealScheduleExceptionRepository::new(db.clone()),
            requests: SurrealBookingRequestRepository::new(db.clone()),
            bookings: SurrealBookingRepository::new(db),
        }
    }
}

impl<C: Connection> Repositories for SurrealRepositories<C> {
    type Principals = SurrealPrincipalRepository<C>;
    type Tenants = SurrealTenantRepository<C>;
    type Services = SurrealServiceRepository<C>;
    type Providers = SurrealProviderRepository<C>;
    type Exceptions = SurrealScheduleExceptionRepository<C>;
    type Requests = SurrealBookingRequestRepository<C>;
    type Bookings = SurrealBookingRepository<C>;

    fn principals(&self) -> &Self::Principals {
        &self.principals
    }

    fn tenants(&self) -> &Self::Tenants {
        &self.tenants
    }

    fn services(&self) -> &Self::Services {
        &self.services
    }

    fn providers(&self) -> &Self::Providers {
        &self.providers
    }

    fn exceptions(&self) -> &Self::Exceptions {
        &self.exceptions
    }

    fn requests(&self) -> &Self::Requests {
        &self.requests
    }

    fn bookings(&self) -> &Self::Bookings {
        &self.bookings
    }
}
