//! Slotwise Core — domain models, repository traits and the shared
//! error type used by every other crate in the workspace.

pub mod error;
pub mod models;
pub mod repository;
pub mod time;

pub use error::{SlotwiseError, SlotwiseResult};
pub use time::TimeOfDay;
