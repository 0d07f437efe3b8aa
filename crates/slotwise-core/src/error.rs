//! Error types for the Slotwise system.

use thiserror::Error;
use uuid::Uuid;

use crate::models::slot::Conflict;

/// Machine-readable reason attached to every authorization denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The resource is owned by someone else, or does not exist.
    NotOwner,
    MissingCapability,
    InactivePrincipal,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DenyReason::NotOwner => "not owner",
            DenyReason::MissingCapability => "missing capability",
            DenyReason::InactivePrincipal => "inactive principal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SlotwiseError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authorization denied: {reason}")]
    Denied { reason: DenyReason },

    #[error("Slot unavailable: {conflict}")]
    SlotUnavailable { conflict: Conflict },

    #[error("Duration mismatch: service requires {expected} minutes, got {actual}")]
    DurationMismatch { expected: u32, actual: u32 },

    #[error("Already finalized: {id} is {status}")]
    AlreadyFinalized { id: Uuid, status: String },

    #[error("Service unavailable: {service_id}")]
    ServiceUnavailable { service_id: Uuid },

    #[error("Invalid service spec: {message}")]
    InvalidServiceSpec { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Storage or other infrastructure failure. Safe to retry.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlotwiseError {
    pub fn denied(reason: DenyReason) -> Self {
        SlotwiseError::Denied { reason }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        SlotwiseError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SlotwiseError::Validation {
            message: message.into(),
        }
    }

    /// Only infrastructure failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlotwiseError::Unavailable(_))
    }
}

pub type SlotwiseResult<T> = Result<T, SlotwiseError>;
