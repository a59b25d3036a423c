//! Shared constants for sample routing and the chart viewport

use std::time::Duration;

/// Points kept per series; also the width of the chart's x viewport
pub const SERIES_CAPACITY: usize = 40;

/// Display-only multiplier for low-latency off-body values (0/1 -> 0/150)
pub const OFF_BODY_SCALE: f64 = 150.0;

/// Display-only multiplier for enhanced off-body values
pub const OFF_BODY_ENHANCED_SCALE: f64 = 100.0;

/// Lower bound of the chart's y viewport
pub const CHART_MIN_Y: f64 = 0.0;

/// Upper bound of the chart's y viewport (beats per minute)
pub const CHART_MAX_Y: f64 = 300.0;

/// Default sampling period requested from the platform (SENSOR_DELAY_NORMAL)
pub const DEFAULT_SAMPLING_PERIOD: Duration = Duration::from_millis(200);
