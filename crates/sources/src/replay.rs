//! Replay of recorded sensor readings
//!
//! Recordings are JSON lines, one reading per line. A line names its sensor
//! either logically or by platform type code:
//!
//! ```text
//! {"sensor": "heart_rate", "value": 71.0, "accuracy": 3, "timestamp_nanos": 1000000}
//! {"raw_type": 34, "value": 1.0, "accuracy": 3, "timestamp_nanos": 1200000}
//! ```
//!
//! Each registered sensor replays its own readings with the recorded
//! inter-arrival gaps, scaled by `speed`.

use anyhow::{anyhow, Context, Result};
use biosens_core::{BackendMetadata, EventSender, SensorBackend, SensorError, SensorResult};
use biosens_types::{LogicalSensor, Reading, SensorHandle, SensorTypeTable, ACCURACY_HIGH};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// JSON-lines recording
    pub path: PathBuf,
    /// Playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Start over when a sensor's readings run out
    #[serde(default)]
    pub looped: bool,
}

fn default_speed() -> f64 {
    1.0
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            speed: default_speed(),
            looped: false,
        }
    }
}

/// One line of a recording
#[derive(Debug, Clone, Deserialize)]
struct RecordedEvent {
    #[serde(default)]
    sensor: Option<LogicalSensor>,
    #[serde(default)]
    raw_type: Option<i32>,
    value: f32,
    #[serde(default = "default_accuracy")]
    accuracy: i32,
    timestamp_nanos: i64,
}

fn default_accuracy() -> i32 {
    ACCURACY_HIGH
}

/// Parse a recording into readings grouped by sensor, each group in
/// timestamp order. Blank lines and `#` comments are skipped; lines for
/// sensor types the table does not know are skipped with a warning.
pub fn parse_recording(
    reader: impl BufRead,
    table: &SensorTypeTable,
) -> Result<HashMap<LogicalSensor, Vec<Reading>>> {
    let mut readings: HashMap<LogicalSensor, Vec<Reading>> = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read recording line {}", line_no))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: RecordedEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid recording line {}", line_no))?;
        let sensor = match (event.sensor, event.raw_type) {
            (Some(sensor), _) => sensor,
            (None, Some(raw)) => match table.logical(raw) {
                Some(sensor) => sensor,
                None => {
                    warn!("Recording line {}: unknown sensor type {}, skipped", line_no, raw);
                    continue;
                }
            },
            (None, None) => {
                return Err(anyhow!(
                    "Recording line {}: needs either \"sensor\" or \"raw_type\"",
                    line_no
                ))
            }
        };

        readings.entry(sensor).or_default().push(Reading::new(
            sensor,
            event.value,
            event.accuracy,
            event.timestamp_nanos,
        ));
    }

    for group in readings.values_mut() {
        group.sort_by_key(|r| r.timestamp_nanos);
    }
    Ok(readings)
}

pub struct ReplayBackend {
    metadata: BackendMetadata,
    recording: HashMap<LogicalSensor, Arc<Vec<Reading>>>,
    table: SensorTypeTable,
    sender: EventSender,
    runtime: Handle,
    tasks: HashMap<LogicalSensor, JoinHandle<()>>,
    speed: f64,
    looped: bool,
}

impl ReplayBackend {
    /// Load a recording from disk
    pub fn open(
        config: &ReplayConfig,
        table: SensorTypeTable,
        sender: EventSender,
        runtime: Handle,
    ) -> Result<Self> {
        let file = File::open(&config.path)
            .with_context(|| format!("Failed to open recording: {}", config.path.display()))?;
        let recording = parse_recording(BufReader::new(file), &table)?;
        info!(
            "Loaded recording {} ({} sensors)",
            config.path.display(),
            recording.len()
        );
        Ok(Self::from_readings(recording, config, table, sender, runtime))
    }

    pub fn from_readings(
        recording: HashMap<LogicalSensor, Vec<Reading>>,
        config: &ReplayConfig,
        table: SensorTypeTable,
        sender: EventSender,
        runtime: Handle,
    ) -> Self {
        Self {
            metadata: BackendMetadata {
                id: "replay".to_string(),
                name: "Replay".to_string(),
                description: format!("Recorded readings from {}", config.path.display()),
            },
            recording: recording
                .into_iter()
                .map(|(sensor, readings)| (sensor, Arc::new(readings)))
                .collect(),
            table,
            sender,
            runtime,
            tasks: HashMap::new(),
            speed: if config.speed > 0.0 { config.speed } else { 1.0 },
            looped: config.looped,
        }
    }
}

const MIN_LOOP_PAUSE: Duration = Duration::from_millis(1);

/// Wall-clock wait between two recorded timestamps at the given speed.
/// Out-of-order or extreme timestamps never panic.
fn replay_gap(previous_nanos: i64, next_nanos: i64, speed: f64) -> Duration {
    let gap = next_nanos.saturating_sub(previous_nanos).max(0) as f64 / speed;
    Duration::from_nanos(gap as u64)
}

impl SensorBackend for ReplayBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    fn default_sensor(&self, raw_type: i32) -> Option<SensorHandle> {
        let sensor = self.table.logical(raw_type)?;
        let readings = self.recording.get(&sensor)?;
        if readings.is_empty() {
            return None;
        }
        Some(SensorHandle::new(
            sensor,
            raw_type,
            format!("Recorded {}", sensor.name()),
            "biosens",
        ))
    }

    fn register(&mut self, handle: &SensorHandle, period: Duration) -> SensorResult<()> {
        let readings = self
            .recording
            .get(&handle.sensor)
            .cloned()
            .ok_or(SensorError::Unsupported(handle.sensor))?;
        if self.tasks.contains_key(&handle.sensor) {
            return Ok(());
        }

        let sender = self.sender.clone();
        let speed = self.speed;
        let looped = self.looped;
        let sensor = handle.sensor;

        let task = self.runtime.spawn(async move {
            loop {
                let mut previous: Option<i64> = None;
                for reading in readings.iter() {
                    if let Some(prev) = previous {
                        tokio::time::sleep(replay_gap(prev, reading.timestamp_nanos, speed)).await;
                    }
                    previous = Some(reading.timestamp_nanos);
                    if sender.send((*reading).into()).is_err() {
                        trace!("Event receiver gone, stopping replay of {}", sensor);
                        return;
                    }
                }
                if !looped {
                    debug!("Replay of {} finished", sensor);
                    return;
                }
                // Pause one sampling period between passes
                tokio::time::sleep(period.max(MIN_LOOP_PAUSE)).await;
            }
        });
        self.tasks.insert(handle.sensor, task);
        Ok(())
    }

    fn unregister(&mut self, handle: &SensorHandle) {
        if let Some(task) = self.tasks.remove(&handle.sensor) {
            task.abort();
        }
    }
}

impl Drop for ReplayBackend {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
