//! Error types for sensor access

use biosens_types::LogicalSensor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    /// No backing handle on this device
    #[error("{0} is not supported on this device")]
    Unsupported(LogicalSensor),

    /// The body-sensor permission was not granted
    #[error("body sensor permission denied")]
    PermissionDenied,

    /// The platform refused the request
    #[error("sensor backend error: {0}")]
    Backend(String),
}

pub type SensorResult<T> = Result<T, SensorError>;
