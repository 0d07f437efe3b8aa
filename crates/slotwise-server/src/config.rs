//! Server configuration loaded from the environment.

use slotwise_db::DbConfig;
use slotwise_scheduling::SchedulingConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub scheduling: SchedulingConfig,
    /// Seeded as the platform owner when none exists.
    pub owner_email: String,
    pub owner_name: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |var: &'static str, default: String| -> Result<String, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { var }),
                Some(value) => Ok(value),
            }
        };

        let defaults = DbConfig::default();
        let db = DbConfig {
            url: read("SLOTWISE_DB_URL", defaults.url)?,
            namespace: read("SLOTWISE_DB_NS", defaults.namespace)?,
            database: read("SLOTWISE_DB_NAME", defaults.database)?,
            username: read("SLOTWISE_DB_USER", defaults.username)?,
            password: read("SLOTWISE_DB_PASSWORD", defaults.password)?,
        };

        let owner_email = read("SLOTWISE_OWNER_EMAIL", "owner@slotwise.local".into())?;
        if !owner_email.contains('@') {
            return Err(ConfigError::Invalid {
                var: "SLOTWISE_OWNER_EMAIL",
                reason: format!("'{owner_email}' is not an email address"),
            });
        }
        let owner_name = read("SLOTWISE_OWNER_NAME", "Platform Owner".into())?;

        Ok(Self {
            db,
            scheduling: SchedulingConfig::default(),
            owner_email,
            owner_name,
        })
    }
}
