//! Sample sink: routes readings into chart series and drives the sound policy

use crate::alert::Alerter;
use crate::constants::{OFF_BODY_ENHANCED_SCALE, OFF_BODY_SCALE, SERIES_CAPACITY};
use crate::renderer::ChartRenderer;
use biosens_types::{AlertKind, LabelField, LogicalSensor, Reading, SeriesId, TimeSeriesPoint};
use log::debug;

/// Format a value the way the labels show it (`72.0`, `0.5`)
pub fn format_value(value: f32) -> String {
    format!("{:?}", value)
}

pub struct SampleSink {
    /// Shared x coordinate for every series; advanced once per plotted point
    tick: u64,
    capacity: usize,
    sound_enabled: bool,
}

impl SampleSink {
    pub fn new(sound_enabled: bool) -> Self {
        Self {
            tick: 0,
            capacity: SERIES_CAPACITY,
            sound_enabled,
        }
    }

    /// Plot a reading. Returns the point that was appended, or `None` for
    /// sensors that have no series (calibration).
    pub fn on_reading(
        &mut self,
        reading: &Reading,
        renderer: &mut dyn ChartRenderer,
        alerter: &dyn Alerter,
    ) -> Option<TimeSeriesPoint> {
        let series = SeriesId::for_sensor(reading.sensor)?;
        let text = format_value(reading.value);
        let value = reading.value as f64;

        debug!(
            "{} measurement: ({},{},{}) : value: {} Accuracy: {} timestamp: {}",
            reading.sensor,
            text,
            reading.accuracy,
            reading.timestamp_nanos,
            text,
            reading.accuracy,
            reading.timestamp_nanos
        );

        let point = match reading.sensor {
            LogicalSensor::HeartRate => {
                renderer.set_label(LabelField::HeartRate, &format!("HR: {}", text));
                let point = self.append(renderer, series, value);
                if reading.is_unreliable()
                    && self.sound_enabled
                    && !alerter.is_playing(AlertKind::Alarm)
                {
                    alerter.play(AlertKind::Alarm);
                }
                point
            }
            LogicalSensor::OffBodyLowLatency => {
                renderer.set_label(LabelField::Proximity, &format!("Prox: {}", text));
                let point = self.append(renderer, series, value * OFF_BODY_SCALE);
                // Fires on every reading, not only on an on/off-body change
                if self.sound_enabled {
                    alerter.play(AlertKind::Notification);
                }
                point
            }
            LogicalSensor::OffBodyEnhanced => {
                renderer.set_label(LabelField::OffBodyEnhanced, &format!("OFB_E: {}", text));
                self.append(renderer, series, value * OFF_BODY_ENHANCED_SCALE)
            }
            LogicalSensor::OffBodyCalibration => return None,
        };
        Some(point)
    }

    /// Accuracy side channel; only heart rate is surfaced
    pub fn on_accuracy_changed(
        &mut self,
        sensor: LogicalSensor,
        accuracy: i32,
        renderer: &mut dyn ChartRenderer,
    ) -> bool {
        if sensor != LogicalSensor::HeartRate {
            return false;
        }
        debug!("{} accuracy changed to: {}", sensor, accuracy);
        renderer.set_label(LabelField::Accuracy, &format!("Acc : {}", accuracy));
        true
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Next x coordinate that will be used
    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn append(&mut self, renderer: &mut dyn ChartRenderer, series: SeriesId, y: f64) -> TimeSeriesPoint {
        let point = TimeSeriesPoint::new(self.tick, y);
        self.tick += 1;
        renderer.append_point(series, point, self.capacity);
        point
    }
}

impl Default for SampleSink {
    fn default() -> Self {
        Self::new(false)
    }
}
