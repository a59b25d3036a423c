//! In-memory chart model
//!
//! Holds one bounded series per [`SeriesId`] plus the current label texts.
//! Front ends render from a [`ChartSnapshot`].

use crate::constants::{CHART_MAX_Y, CHART_MIN_Y, SERIES_CAPACITY};
use crate::renderer::ChartRenderer;
use biosens_types::{BoundedSeries, LabelField, SeriesId, TimeSeriesPoint};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ChartModel {
    series: BTreeMap<SeriesId, BoundedSeries>,
    labels: BTreeMap<LabelField, String>,
}

impl ChartModel {
    pub fn new() -> Self {
        let series = SeriesId::ALL
            .into_iter()
            .map(|id| (id, BoundedSeries::new(SERIES_CAPACITY)))
            .collect();
        Self {
            series,
            labels: BTreeMap::new(),
        }
    }

    pub fn series(&self, id: SeriesId) -> Option<&BoundedSeries> {
        self.series.get(&id)
    }

    pub fn label(&self, field: LabelField) -> Option<&str> {
        self.labels.get(&field).map(String::as_str)
    }

    /// Copy out everything needed to draw the chart
    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            captured_at: Utc::now(),
            viewport: Viewport::default(),
            series: self
                .series
                .iter()
                .map(|(id, series)| SeriesSnapshot {
                    id: *id,
                    color: id.color().to_hex(),
                    points: series.to_vec(),
                })
                .collect(),
            labels: self.labels.clone(),
        }
    }
}

impl Default for ChartModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for ChartModel {
    fn append_point(&mut self, series: SeriesId, point: TimeSeriesPoint, capacity: usize) {
        let entry = self
            .series
            .entry(series)
            .or_insert_with(|| BoundedSeries::new(capacity));
        if entry.capacity() != capacity {
            entry.set_capacity(capacity);
        }
        entry.push(point);
    }

    fn set_label(&mut self, field: LabelField, text: &str) {
        self.labels.insert(field, text.to_string());
    }
}

/// Fixed chart bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: SERIES_CAPACITY as f64,
            min_y: CHART_MIN_Y,
            max_y: CHART_MAX_Y,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSnapshot {
    pub id: SeriesId,
    pub color: String,
    pub points: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub captured_at: DateTime<Utc>,
    pub viewport: Viewport,
    pub series: Vec<SeriesSnapshot>,
    pub labels: BTreeMap<LabelField, String>,
}

impl ChartSnapshot {
    pub fn series(&self, id: SeriesId) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_evict_past_capacity() {
        let mut chart = ChartModel::new();
        for x in 0..45 {
            chart.append_point(SeriesId::HeartRate, TimeSeriesPoint::new(x, 60.0), SERIES_CAPACITY);
        }
        let series = chart.series(SeriesId::HeartRate).unwrap();
        assert_eq!(series.len(), SERIES_CAPACITY);
        assert_eq!(series.iter().next().map(|p| p.x), Some(5));
        assert!(chart.series(SeriesId::OffBody).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_serializes_labels_and_colors() {
        let mut chart = ChartModel::new();
        chart.set_label(LabelField::HeartRate, "HR: 61.0");
        chart.append_point(SeriesId::OffBody, TimeSeriesPoint::new(0, 150.0), SERIES_CAPACITY);

        let snapshot = chart.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["labels"]["heart_rate"], "HR: 61.0");
        assert_eq!(json["viewport"]["max_y"], 300.0);
        let off_body = snapshot.series(SeriesId::OffBody).unwrap();
        assert_eq!(off_body.color, "#00ffff");
        assert_eq!(off_body.points, vec![TimeSeriesPoint::new(0, 150.0)]);
    }
}
