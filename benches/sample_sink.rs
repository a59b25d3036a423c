use biosens_core::{ChartModel, SampleSink, SilentAlerter};
use biosens_types::{LogicalSensor, Reading};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn readings(count: usize) -> Vec<Reading> {
    (0..count)
        .map(|i| {
            let sensor = match i % 3 {
                0 => LogicalSensor::HeartRate,
                1 => LogicalSensor::OffBodyLowLatency,
                _ => LogicalSensor::OffBodyEnhanced,
            };
            let value = if sensor == LogicalSensor::HeartRate {
                60.0 + (i % 40) as f32
            } else {
                (i % 2) as f32
            };
            Reading::new(sensor, value, (i % 4) as i32, i as i64 * 200_000_000)
        })
        .collect()
}

fn bench_sample_sink(c: &mut Criterion) {
    let batch = readings(1000);

    c.bench_function("sink_plot_1000_readings", |b| {
        b.iter(|| {
            let mut sink = SampleSink::new(false);
            let mut chart = ChartModel::new();
            for reading in &batch {
                black_box(sink.on_reading(reading, &mut chart, &SilentAlerter));
            }
        });
    });

    c.bench_function("sink_plot_with_sound", |b| {
        b.iter(|| {
            let mut sink = SampleSink::new(true);
            let mut chart = ChartModel::new();
            for reading in &batch {
                black_box(sink.on_reading(reading, &mut chart, &SilentAlerter));
            }
        });
    });

    let mut sink = SampleSink::new(false);
    let mut chart = ChartModel::new();
    for reading in &batch {
        sink.on_reading(reading, &mut chart, &SilentAlerter);
    }
    c.bench_function("chart_snapshot", |b| {
        b.iter(|| black_box(chart.snapshot()));
    });
}

criterion_group!(benches, bench_sample_sink);
criterion_main!(benches);
