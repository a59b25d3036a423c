//! Simulated sensor device for demos and debugging
//!
//! Produces heart-rate and off-body readings from configurable waveforms,
//! one tokio task per registered sensor.

use biosens_core::{
    BackendMetadata, EventSender, PermissionStatus, SensorBackend, SensorError, SensorResult,
};
use biosens_types::{
    LogicalSensor, Reading, SensorEvent, SensorHandle, SensorTypeTable, ACCURACY_HIGH,
    ACCURACY_UNRELIABLE,
};
use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Waveform used to generate values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    /// Manual static value
    #[default]
    Manual,
    /// Sine wave oscillation
    SineWave,
    /// Sawtooth wave (linear ramp)
    Sawtooth,
    /// Triangle wave
    Triangle,
    /// Square wave
    Square,
}

/// Value generator for one simulated sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub mode: WaveMode,
    /// Value used in Manual mode
    pub manual_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Wave period in seconds
    pub period: f64,
    /// Uniform noise amplitude added to every value
    #[serde(default)]
    pub noise: f64,
}

impl WaveConfig {
    pub fn manual(value: f64) -> Self {
        Self {
            mode: WaveMode::Manual,
            manual_value: value,
            min_value: value,
            max_value: value,
            period: 1.0,
            noise: 0.0,
        }
    }

    /// Noise-free value at `elapsed` seconds since the device started
    pub fn value_at(&self, elapsed: f64) -> f64 {
        let range = self.max_value - self.min_value;
        let period = if self.period > 0.0 { self.period } else { 1.0 };

        match self.mode {
            WaveMode::Manual => self.manual_value,
            WaveMode::SineWave => {
                let phase = (elapsed / period) * std::f64::consts::TAU;
                let normalized = (phase.sin() + 1.0) / 2.0; // 0.0 to 1.0
                self.min_value + normalized * range
            }
            WaveMode::Sawtooth => {
                let normalized = (elapsed / period).fract(); // 0.0 to 1.0
                self.min_value + normalized * range
            }
            WaveMode::Triangle => {
                let phase = (elapsed / period).fract() * 2.0; // 0.0 to 2.0
                let normalized = if phase <= 1.0 { phase } else { 2.0 - phase };
                self.min_value + normalized * range
            }
            WaveMode::Square => {
                let phase = (elapsed / period).fract();
                if phase < 0.5 {
                    self.min_value
                } else {
                    self.max_value
                }
            }
        }
    }

    fn sample(&self, elapsed: f64) -> f64 {
        let value = self.value_at(elapsed);
        if self.noise > 0.0 {
            value + rand::thread_rng().gen_range(-self.noise..=self.noise)
        } else {
            value
        }
    }
}

/// Configuration for the simulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedDeviceConfig {
    /// Sensors the device exposes; vendor sensors can be left out
    #[serde(default = "default_exposed")]
    pub exposed: Vec<LogicalSensor>,
    #[serde(default = "default_true")]
    pub permission_granted: bool,
    #[serde(default = "default_heart_rate_wave")]
    pub heart_rate: WaveConfig,
    #[serde(default = "default_off_body_wave")]
    pub off_body: WaveConfig,
    #[serde(default = "default_enhanced_wave")]
    pub off_body_enhanced: WaveConfig,
    /// Every Nth heart-rate reading is reported as unreliable (0 = never)
    #[serde(default)]
    pub unreliable_every: u32,
    /// Delay before the single calibration reading is produced
    #[serde(default = "default_calibration_delay")]
    pub calibration_delay_ms: u64,
    #[serde(default = "default_calibration_value")]
    pub calibration_value: f32,
}

fn default_exposed() -> Vec<LogicalSensor> {
    LogicalSensor::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_heart_rate_wave() -> WaveConfig {
    WaveConfig {
        mode: WaveMode::SineWave,
        manual_value: 72.0,
        min_value: 58.0,
        max_value: 96.0,
        period: 20.0,
        noise: 1.5,
    }
}

fn default_off_body_wave() -> WaveConfig {
    WaveConfig {
        mode: WaveMode::Square,
        manual_value: 1.0,
        min_value: 1.0,
        max_value: 0.0,
        period: 30.0,
        noise: 0.0,
    }
}

fn default_enhanced_wave() -> WaveConfig {
    WaveConfig {
        mode: WaveMode::Triangle,
        manual_value: 1.0,
        min_value: 0.0,
        max_value: 1.0,
        period: 12.0,
        noise: 0.0,
    }
}

fn default_calibration_delay() -> u64 {
    3000
}

fn default_calibration_value() -> f32 {
    1.0
}

impl Default for SimulatedDeviceConfig {
    fn default() -> Self {
        Self {
            exposed: default_exposed(),
            permission_granted: true,
            heart_rate: default_heart_rate_wave(),
            off_body: default_off_body_wave(),
            off_body_enhanced: default_enhanced_wave(),
            unreliable_every: 0,
            calibration_delay_ms: default_calibration_delay(),
            calibration_value: default_calibration_value(),
        }
    }
}

pub struct SimulatedBackend {
    metadata: BackendMetadata,
    config: SimulatedDeviceConfig,
    table: SensorTypeTable,
    sender: EventSender,
    runtime: Handle,
    tasks: HashMap<LogicalSensor, JoinHandle<()>>,
    started: Instant,
}

impl SimulatedBackend {
    pub fn new(
        config: SimulatedDeviceConfig,
        table: SensorTypeTable,
        sender: EventSender,
        runtime: Handle,
    ) -> Self {
        Self {
            metadata: BackendMetadata {
                id: "simulated".to_string(),
                name: "Simulated".to_string(),
                description: "Waveform-driven wearable with PPG heart rate and off-body sensors"
                    .to_string(),
            },
            config,
            table,
            sender,
            runtime,
            tasks: HashMap::new(),
            started: Instant::now(),
        }
    }

    fn spawn_calibration(&self) -> JoinHandle<()> {
        let sender = self.sender.clone();
        let delay = Duration::from_millis(self.config.calibration_delay_ms);
        let value = self.config.calibration_value;
        let started = self.started;

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let reading = Reading::new(
                LogicalSensor::OffBodyCalibration,
                value,
                ACCURACY_HIGH,
                started.elapsed().as_nanos() as i64,
            );
            if sender.send(reading.into()).is_err() {
                trace!("Event receiver gone, calibration reading discarded");
            }
        })
    }

    fn spawn_stream(&self, sensor: LogicalSensor, period: Duration) -> JoinHandle<()> {
        let wave = match sensor {
            LogicalSensor::OffBodyLowLatency => self.config.off_body.clone(),
            LogicalSensor::OffBodyEnhanced => self.config.off_body_enhanced.clone(),
            _ => self.config.heart_rate.clone(),
        };
        let unreliable_every = self.config.unreliable_every;
        let sender = self.sender.clone();
        let started = self.started;

        self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut count: u64 = 0;
            let mut last_accuracy = None;

            loop {
                interval.tick().await;
                count += 1;

                let elapsed = started.elapsed();
                let mut value = wave.sample(elapsed.as_secs_f64()) as f32;
                let accuracy = if sensor == LogicalSensor::HeartRate
                    && unreliable_every > 0
                    && count % unreliable_every as u64 == 0
                {
                    ACCURACY_UNRELIABLE
                } else {
                    ACCURACY_HIGH
                };
                if sensor == LogicalSensor::OffBodyLowLatency {
                    value = value.round().clamp(0.0, 1.0);
                }

                if last_accuracy != Some(accuracy) {
                    last_accuracy = Some(accuracy);
                    let changed = SensorEvent::AccuracyChanged { sensor, accuracy };
                    if sender.send(changed).is_err() {
                        break;
                    }
                }

                let reading = Reading::new(sensor, value, accuracy, elapsed.as_nanos() as i64);
                if sender.send(reading.into()).is_err() {
                    trace!("Event receiver gone, stopping {}", sensor);
                    break;
                }
            }
        })
    }
}

impl SensorBackend for SimulatedBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    fn default_sensor(&self, raw_type: i32) -> Option<SensorHandle> {
        let sensor = self.table.logical(raw_type)?;
        if !self.config.exposed.contains(&sensor) {
            return None;
        }
        Some(SensorHandle::new(
            sensor,
            raw_type,
            format!("Simulated {}", sensor.name()),
            "biosens",
        ))
    }

    fn register(&mut self, handle: &SensorHandle, period: Duration) -> SensorResult<()> {
        if !self.config.exposed.contains(&handle.sensor) {
            return Err(SensorError::Unsupported(handle.sensor));
        }
        if self.tasks.contains_key(&handle.sensor) {
            return Ok(());
        }

        let task = match handle.sensor {
            LogicalSensor::OffBodyCalibration => self.spawn_calibration(),
            sensor => self.spawn_stream(sensor, period),
        };
        debug!("Simulated {} started ({:?})", handle.sensor, period);
        self.tasks.insert(handle.sensor, task);
        Ok(())
    }

    fn unregister(&mut self, handle: &SensorHandle) {
        if let Some(task) = self.tasks.remove(&handle.sensor) {
            task.abort();
            debug!("Simulated {} stopped", handle.sensor);
        }
    }

    fn permission(&self) -> PermissionStatus {
        if self.config.permission_granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
