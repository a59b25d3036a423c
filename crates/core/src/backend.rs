//! Sensor backend trait and related types

use crate::error::SensorResult;
use biosens_types::{SensorEvent, SensorHandle};
use crossbeam::channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata about a sensor backend
#[derive(Debug, Clone)]
pub struct BackendMetadata {
    /// Unique identifier for this backend type
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of where readings come from
    pub description: String,
}

/// Whether the body-sensor permission has been granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Sending half of the event channel a backend pushes readings into
pub type EventSender = Sender<SensorEvent>;

/// Receiving half, drained by the monitor's delivery thread
pub type EventReceiver = Receiver<SensorEvent>;

/// Create the channel backends deliver into
pub fn event_channel() -> (EventSender, EventReceiver) {
    crossbeam::channel::unbounded()
}

/// Trait for all sensor platforms
///
/// A backend resolves platform type codes to handles and starts or stops
/// delivery for a handle. Readings are pushed asynchronously into the
/// [`EventSender`] the backend was built with; a reading already in flight
/// when `unregister` returns may still arrive.
pub trait SensorBackend: Send {
    /// Get metadata about this backend
    fn metadata(&self) -> &BackendMetadata;

    /// Resolve the default sensor for a platform type code
    fn default_sensor(&self, raw_type: i32) -> Option<SensorHandle>;

    /// Begin delivery for a handle at roughly the given sampling period
    fn register(&mut self, handle: &SensorHandle, period: Duration) -> SensorResult<()>;

    /// Stop delivery for a handle; a no-op if it is not registered
    fn unregister(&mut self, handle: &SensorHandle);

    /// Current body-sensor permission
    fn permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    /// Ask for the body-sensor permission and return the outcome
    fn request_permission(&mut self) -> PermissionStatus {
        self.permission()
    }
}

/// Type-erased backend for dynamic dispatch
pub type BoxedBackend = Box<dyn SensorBackend>;
