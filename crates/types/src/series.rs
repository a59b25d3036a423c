//! Chart series identities and the bounded point buffer behind them

use crate::color::Color;
use crate::sensor::LogicalSensor;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A plotted line on the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesId {
    HeartRate,
    OffBody,
    OffBodyEnhanced,
}

impl SeriesId {
    pub const ALL: [SeriesId; 3] = [SeriesId::HeartRate, SeriesId::OffBody, SeriesId::OffBodyEnhanced];

    /// Series a sensor plots into; calibration is label-only
    pub fn for_sensor(sensor: LogicalSensor) -> Option<SeriesId> {
        match sensor {
            LogicalSensor::HeartRate => Some(SeriesId::HeartRate),
            LogicalSensor::OffBodyLowLatency => Some(SeriesId::OffBody),
            LogicalSensor::OffBodyEnhanced => Some(SeriesId::OffBodyEnhanced),
            LogicalSensor::OffBodyCalibration => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            SeriesId::HeartRate => Color::from_rgb8(244, 152, 173),
            SeriesId::OffBody => Color::CYAN,
            SeriesId::OffBodyEnhanced => Color::GREEN,
        }
    }
}

/// A text field showing an instantaneous value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelField {
    HeartRate,
    Accuracy,
    Proximity,
    Calibration,
    OffBodyEnhanced,
}

/// One plotted point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Shared tick counter value at append time
    pub x: u64,
    pub y: f64,
}

impl TimeSeriesPoint {
    pub fn new(x: u64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fixed-capacity, arrival-ordered point buffer; the oldest point goes first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedSeries {
    capacity: usize,
    points: VecDeque<TimeSeriesPoint>,
}

impl BoundedSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append a point, evicting from the front until the capacity holds.
    /// Returns the number of evicted points.
    pub fn push(&mut self, point: TimeSeriesPoint) -> usize {
        self.points.push_back(point);
        let mut evicted = 0;
        while self.points.len() > self.capacity {
            self.points.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Change the capacity, trimming the oldest points if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<TimeSeriesPoint> {
        self.points.iter().copied().collect()
    }
}
