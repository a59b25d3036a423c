//! Logical sensor identities and the platform sensor-type table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Android `Sensor.TYPE_HEART_RATE`
pub const TYPE_HEART_RATE: i32 = 21;

/// Android `Sensor.TYPE_LOW_LATENCY_OFFBODY_DETECT`
pub const TYPE_LOW_LATENCY_OFFBODY_DETECT: i32 = 34;

/// Vendor PPG off-body calibration sensor (see `dumpsys sensorservice`)
pub const TYPE_VENDOR_OFFBODY_CALIBRATION: i32 = 33171007;

/// Vendor PPG "enhanced" off-body sensor
pub const TYPE_VENDOR_OFFBODY_ENHANCED: i32 = 33171008;

/// Stable identity of a sensor capability, independent of platform type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalSensor {
    /// Optical heart rate in beats per minute
    HeartRate,
    /// Low-latency off-body detection (0.0 = off body, 1.0 = on body)
    OffBodyLowLatency,
    /// Vendor calibration channel for the PPG off-body detector
    OffBodyCalibration,
    /// Vendor "enhanced" off-body detector
    OffBodyEnhanced,
}

impl LogicalSensor {
    /// Every logical sensor, in resolution order
    pub const ALL: [LogicalSensor; 4] = [
        LogicalSensor::HeartRate,
        LogicalSensor::OffBodyLowLatency,
        LogicalSensor::OffBodyCalibration,
        LogicalSensor::OffBodyEnhanced,
    ];

    /// Sensors that are started and stopped together as the biometric group
    pub const BIOMETRIC: [LogicalSensor; 3] = [
        LogicalSensor::HeartRate,
        LogicalSensor::OffBodyLowLatency,
        LogicalSensor::OffBodyEnhanced,
    ];

    /// Short machine-friendly identifier
    pub fn id(&self) -> &'static str {
        match self {
            LogicalSensor::HeartRate => "heart_rate",
            LogicalSensor::OffBodyLowLatency => "off_body_low_latency",
            LogicalSensor::OffBodyCalibration => "off_body_calibration",
            LogicalSensor::OffBodyEnhanced => "off_body_enhanced",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            LogicalSensor::HeartRate => "Heart Rate",
            LogicalSensor::OffBodyLowLatency => "Off-Body (low latency)",
            LogicalSensor::OffBodyCalibration => "Off-Body Calibration",
            LogicalSensor::OffBodyEnhanced => "Off-Body (enhanced)",
        }
    }

    /// Whether the platform type code is vendor-private and may be missing
    pub fn is_vendor_specific(&self) -> bool {
        matches!(
            self,
            LogicalSensor::OffBodyCalibration | LogicalSensor::OffBodyEnhanced
        )
    }

    /// Whether this sensor belongs to the biometric group
    pub fn is_biometric(&self) -> bool {
        !matches!(self, LogicalSensor::OffBodyCalibration)
    }

    /// Parse from the identifier returned by [`LogicalSensor::id`]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl fmt::Display for LogicalSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapping between logical sensors and platform numeric sensor types.
///
/// This is the only place vendor-private numeric identifiers live. The vendor
/// codes differ between firmware builds, so they can be overridden from the
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorTypeTable {
    #[serde(default = "default_heart_rate_type")]
    pub heart_rate: i32,
    #[serde(default = "default_off_body_type")]
    pub off_body_low_latency: i32,
    #[serde(default = "default_calibration_type")]
    pub off_body_calibration: i32,
    #[serde(default = "default_enhanced_type")]
    pub off_body_enhanced: i32,
}

fn default_heart_rate_type() -> i32 {
    TYPE_HEART_RATE
}

fn default_off_body_type() -> i32 {
    TYPE_LOW_LATENCY_OFFBODY_DETECT
}

fn default_calibration_type() -> i32 {
    TYPE_VENDOR_OFFBODY_CALIBRATION
}

fn default_enhanced_type() -> i32 {
    TYPE_VENDOR_OFFBODY_ENHANCED
}

impl Default for SensorTypeTable {
    fn default() -> Self {
        Self {
            heart_rate: TYPE_HEART_RATE,
            off_body_low_latency: TYPE_LOW_LATENCY_OFFBODY_DETECT,
            off_body_calibration: TYPE_VENDOR_OFFBODY_CALIBRATION,
            off_body_enhanced: TYPE_VENDOR_OFFBODY_ENHANCED,
        }
    }
}

impl SensorTypeTable {
    /// Platform type code for a logical sensor
    pub fn raw_type(&self, sensor: LogicalSensor) -> i32 {
        match sensor {
            LogicalSensor::HeartRate => self.heart_rate,
            LogicalSensor::OffBodyLowLatency => self.off_body_low_latency,
            LogicalSensor::OffBodyCalibration => self.off_body_calibration,
            LogicalSensor::OffBodyEnhanced => self.off_body_enhanced,
        }
    }

    /// Logical sensor for a platform type code, if it is one we know
    pub fn logical(&self, raw_type: i32) -> Option<LogicalSensor> {
        LogicalSensor::ALL
            .into_iter()
            .find(|sensor| self.raw_type(*sensor) == raw_type)
    }
}

/// A physical sensor resolved on the host device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorHandle {
    /// Logical identity this handle backs
    pub sensor: LogicalSensor,
    /// Platform type code the handle was resolved from
    pub raw_type: i32,
    /// Name reported by the device
    pub name: String,
    /// Vendor reported by the device
    pub vendor: String,
}

impl SensorHandle {
    pub fn new(
        sensor: LogicalSensor,
        raw_type: i32,
        name: impl Into<String>,
        vendor: impl Into<String>,
    ) -> Self {
        Self {
            sensor,
            raw_type,
            name: name.into(),
            vendor: vendor.into(),
        }
    }
}
