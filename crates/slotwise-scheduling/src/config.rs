//! Scheduling configuration.

/// Limits applied by the availability engine and the service catalog.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Step between candidate start times when listing open slots
    /// (default: 15).
    pub slot_granularity_minutes: u32,
    /// Shortest bookable duration (default: 5).
    pub min_duration_minutes: u32,
    /// Longest bookable duration (default: 720 = 12 hours).
    pub max_duration_minutes: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 15,
            min_duration_minutes: 5,
            max_duration_minutes: 720,
        }
    }
}
