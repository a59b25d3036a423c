//! biosens-types: Shared data types for the biosens sensor monitor.
//!
//! This crate contains pure data types (sensor identities, readings, chart
//! series, colors) that are shared across all biosens crates. Nothing in here
//! talks to a sensor platform, an audio device or a renderer.

pub mod alert;
pub mod color;
pub mod reading;
pub mod sensor;
pub mod series;

// Re-export commonly used types at the crate root for convenience
pub use alert::AlertKind;
pub use color::Color;
pub use reading::{
    Reading, SensorEvent, ACCURACY_HIGH, ACCURACY_LOW, ACCURACY_MEDIUM, ACCURACY_NO_CONTACT,
    ACCURACY_UNRELIABLE,
};
pub use sensor::{LogicalSensor, SensorHandle, SensorTypeTable};
pub use series::{BoundedSeries, LabelField, SeriesId, TimeSeriesPoint};
