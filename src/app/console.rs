//! Console front end: keeps the chart model and prints it on request

use biosens_core::{ChartModel, ChartRenderer, ChartSnapshot, ControlsView, SERIES_CAPACITY};
use biosens_types::{LabelField, SeriesId, TimeSeriesPoint};
use log::debug;
use std::fmt::Write as _;

/// Renderer that records into a [`ChartModel`] and formats text summaries
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    chart: ChartModel,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart(&self) -> &ChartModel {
        &self.chart
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        self.chart.snapshot()
    }

    /// Multi-line summary of labels, series and toggles
    pub fn summary(&self, controls: &ControlsView) -> String {
        let mut out = String::new();
        let labels = [
            LabelField::HeartRate,
            LabelField::Accuracy,
            LabelField::Proximity,
            LabelField::OffBodyEnhanced,
            LabelField::Calibration,
        ];
        let shown: Vec<&str> = labels.iter().filter_map(|f| self.chart.label(*f)).collect();
        let _ = writeln!(out, "{}", if shown.is_empty() { "(no data yet)".to_string() } else { shown.join("  ") });

        for id in SeriesId::ALL {
            if let Some(series) = self.chart.series(id) {
                let last = series
                    .last()
                    .map(|p| format!("x={} y={:.1}", p.x, p.y))
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    out,
                    "  {:<18} {:>2}/{} points  last {}  {}",
                    format!("{:?}", id),
                    series.len(),
                    SERIES_CAPACITY,
                    last,
                    id.color().to_hex()
                );
            }
        }

        let _ = write!(
            out,
            "  sound: {}  sensors: {}  calibrating: {}  ({:?})",
            on_off(controls.sound_enabled),
            on_off(controls.sensors_enabled),
            if controls.calibration_in_flight { "yes" } else { "no" },
            controls.phase
        );
        out
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl ChartRenderer for ConsoleRenderer {
    fn append_point(&mut self, series: SeriesId, point: TimeSeriesPoint, capacity: usize) {
        self.chart.append_point(series, point, capacity);
    }

    fn set_label(&mut self, field: LabelField, text: &str) {
        debug!("{:?} <- {}", field, text);
        self.chart.set_label(field, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosens_core::Phase;

    #[test]
    fn test_summary_lists_labels_and_toggles() {
        let mut renderer = ConsoleRenderer::new();
        renderer.set_label(LabelField::HeartRate, "HR: 70.0");
        renderer.append_point(SeriesId::HeartRate, TimeSeriesPoint::new(3, 70.0), SERIES_CAPACITY);

        let controls = ControlsView {
            sound_enabled: true,
            sensors_enabled: false,
            calibration_in_flight: true,
            phase: Phase::CalibrationActive,
        };
        let summary = renderer.summary(&controls);

        assert!(summary.starts_with("HR: 70.0"));
        assert!(summary.contains("1/40 points  last x=3 y=70.0"));
        assert!(summary.contains("sound: on  sensors: off  calibrating: yes"));
    }

    #[test]
    fn test_empty_summary() {
        let renderer = ConsoleRenderer::new();
        let controls = ControlsView {
            sound_enabled: false,
            sensors_enabled: true,
            calibration_in_flight: false,
            phase: Phase::PairActive,
        };
        assert!(renderer.summary(&controls).starts_with("(no data yet)"));
    }
}
