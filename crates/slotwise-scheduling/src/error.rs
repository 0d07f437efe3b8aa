//! Scheduling error types.

use slotwise_core::error::SlotwiseError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("duration must be greater than zero")]
    ZeroDuration,

    #[error("slot granularity must be greater than zero")]
    ZeroGranularity,

    #[error("duration of {actual} minutes is outside {min}..={max}")]
    DurationOutOfRange { min: u32, max: u32, actual: u32 },

    #[error("flexible services need a duration when confirmed")]
    MissingDuration,

    #[error("service name must not be blank")]
    BlankName,

    #[error("fixed services need a non-zero fixed duration")]
    MissingFixedDuration,

    #[error("flexible services must not carry a fixed duration")]
    UnexpectedFixedDuration,
}

impl From<SchedulingError> for SlotwiseError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::ZeroDuration
            | SchedulingError::ZeroGranularity
            | SchedulingError::DurationOutOfRange { .. } => SlotwiseError::Validation {
                message: err.to_string(),
            },
            SchedulingError::MissingDuration
            | SchedulingError::BlankName
            | SchedulingError::MissingFixedDuration
            | SchedulingError::UnexpectedFixedDuration => SlotwiseError::InvalidServiceSpec {
                message: err.to_string(),
            },
        }
    }
}
