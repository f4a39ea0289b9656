//! Validation and analytics core for device vitals samples.
//!
//! Everything in here is pure: no I/O, no clock reads. Callers pass the
//! validation instant explicitly and hand the reducer an already ordered
//! (newest first) sequence of readings.

pub mod analytics;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use analytics::{summarize, Summary};
pub use validate::{parse_sample, validate, Metric, ValidationError, ValidationResult};

/// A validated device-health sample, ready to be appended to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Sample {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    /// Thermal state, 0 (normal) to 3 (severe).
    pub thermal_value: u8,
    /// Battery charge in percent.
    pub battery_level: u8,
    /// Memory utilization in percent.
    pub memory_usage: u8,
}

impl Sample {
    pub fn readings(&self) -> MetricValues {
        MetricValues {
            thermal: self.thermal_value,
            battery: self.battery_level,
            memory: self.memory_usage,
        }
    }
}

/// One value per tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricValues {
    pub thermal: u8,
    pub battery: u8,
    pub memory: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricAverages {
    pub thermal: f64,
    pub battery: f64,
    pub memory: f64,
}
