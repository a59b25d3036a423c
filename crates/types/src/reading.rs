//! Sensor readings and the events a sensor platform delivers

use crate::sensor::LogicalSensor;
use serde::{Deserialize, Serialize};

/// The sensor is not in contact with what it measures
pub const ACCURACY_NO_CONTACT: i32 = -1;
/// The reading cannot be trusted
pub const ACCURACY_UNRELIABLE: i32 = 0;
pub const ACCURACY_LOW: i32 = 1;
pub const ACCURACY_MEDIUM: i32 = 2;
pub const ACCURACY_HIGH: i32 = 3;

/// One scalar sample from a sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor: LogicalSensor,
    pub value: f32,
    /// Platform confidence level, see the `ACCURACY_*` constants
    pub accuracy: i32,
    /// Event time in nanoseconds, as stamped by the sensor platform
    pub timestamp_nanos: i64,
}

impl Reading {
    pub fn new(sensor: LogicalSensor, value: f32, accuracy: i32, timestamp_nanos: i64) -> Self {
        Self {
            sensor,
            value,
            accuracy,
            timestamp_nanos,
        }
    }

    /// Accuracy is exactly "unreliable"
    pub fn is_unreliable(&self) -> bool {
        self.accuracy == ACCURACY_UNRELIABLE
    }
}

/// Everything a sensor platform can push at us
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SensorEvent {
    Reading(Reading),
    AccuracyChanged { sensor: LogicalSensor, accuracy: i32 },
}

impl SensorEvent {
    /// Sensor the event came from
    pub fn sensor(&self) -> LogicalSensor {
        match self {
            SensorEvent::Reading(reading) => reading.sensor,
            SensorEvent::AccuracyChanged { sensor, .. } => *sensor,
        }
    }
}

impl From<Reading> for SensorEvent {
    fn from(reading: Reading) -> Self {
        SensorEvent::Reading(reading)
    }
}
