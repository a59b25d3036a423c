//! biosens-core: Sensor registry, subscription control and sample routing.
//!
//! This crate contains the collaborator traits (SensorBackend, ChartRenderer,
//! Alerter), the sensor registry, the subscription controller state machine,
//! the sample sink and the stateless handlers that tie them together.

pub mod constants;
mod alert;
mod backend;
mod chart;
mod commands;
mod controller;
mod error;
mod handlers;
mod registry;
mod renderer;
mod sink;

#[cfg(test)]
mod test_support;

pub use alert::{Alerter, SilentAlerter};
pub use backend::{
    event_channel, BackendMetadata, BoxedBackend, EventReceiver, EventSender, PermissionStatus,
    SensorBackend,
};
pub use chart::{ChartModel, ChartSnapshot, SeriesSnapshot, Viewport};
pub use commands::{CommandParseError, ControlsView, OperatorCommand};
pub use constants::{
    CHART_MAX_Y, CHART_MIN_Y, DEFAULT_SAMPLING_PERIOD, OFF_BODY_ENHANCED_SCALE, OFF_BODY_SCALE,
    SERIES_CAPACITY,
};
pub use controller::{Phase, PermissionPolicy, SubscriptionController, SubscriptionState};
pub use error::{SensorError, SensorResult};
pub use handlers::{handle_command, handle_sensor_event, CommandOutcome, Dispatch, MonitorContext};
pub use registry::SensorRegistry;
pub use renderer::{BoxedRenderer, ChartRenderer};
pub use sink::{format_value, SampleSink};

// Re-export types used in trait signatures for convenience
pub use biosens_types::{
    AlertKind, LabelField, LogicalSensor, Reading, SensorEvent, SensorHandle, SensorTypeTable,
    SeriesId, TimeSeriesPoint,
};
