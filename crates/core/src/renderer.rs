//! Chart renderer trait

use biosens_types::{LabelField, SeriesId, TimeSeriesPoint};

/// Receives plotted points and label text.
///
/// Implementations must evict oldest-first once a series holds more than
/// `capacity` points.
pub trait ChartRenderer {
    /// Append a point to a series
    fn append_point(&mut self, series: SeriesId, point: TimeSeriesPoint, capacity: usize);

    /// Replace the text shown in a label field
    fn set_label(&mut self, field: LabelField, text: &str);
}

/// Type-erased renderer for dynamic dispatch
pub type BoxedRenderer = Box<dyn ChartRenderer + Send>;

impl<R: ChartRenderer + ?Sized> ChartRenderer for Box<R> {
    fn append_point(&mut self, series: SeriesId, point: TimeSeriesPoint, capacity: usize) {
        (**self).append_point(series, point, capacity)
    }

    fn set_label(&mut self, field: LabelField, text: &str) {
        (**self).set_label(field, text)
    }
}
