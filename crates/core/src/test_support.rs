//! Recording doubles shared by the unit tests

use crate::alert::Alerter;
use crate::backend::{BackendMetadata, PermissionStatus, SensorBackend};
use crate::error::{SensorError, SensorResult};
use crate::registry::SensorRegistry;
use crate::renderer::ChartRenderer;
use biosens_types::{
    AlertKind, LabelField, LogicalSensor, SensorHandle, SensorTypeTable, SeriesId, TimeSeriesPoint,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    Register(LogicalSensor),
    Unregister(LogicalSensor),
}

pub struct RecordingBackend {
    metadata: BackendMetadata,
    table: SensorTypeTable,
    sensors: Vec<LogicalSensor>,
    registered: BTreeSet<LogicalSensor>,
    calls: Vec<BackendCall>,
    permission: PermissionStatus,
    permission_requests: usize,
    failing: Option<LogicalSensor>,
}

impl RecordingBackend {
    pub fn with_sensors(sensors: &[LogicalSensor]) -> Self {
        Self {
            metadata: BackendMetadata {
                id: "recording".to_string(),
                name: "Recording".to_string(),
                description: "Records register/unregister calls".to_string(),
            },
            table: SensorTypeTable::default(),
            sensors: sensors.to_vec(),
            registered: BTreeSet::new(),
            calls: Vec::new(),
            permission: PermissionStatus::Granted,
            permission_requests: 0,
            failing: None,
        }
    }

    pub fn denied(mut self) -> Self {
        self.permission = PermissionStatus::Denied;
        self
    }

    /// Make `register` fail for one sensor
    pub fn failing_on(mut self, sensor: LogicalSensor) -> Self {
        self.failing = Some(sensor);
        self
    }

    pub fn registered(&self) -> Vec<LogicalSensor> {
        self.registered.iter().copied().collect()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.clone()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests
    }
}

impl SensorBackend for RecordingBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    fn default_sensor(&self, raw_type: i32) -> Option<SensorHandle> {
        let sensor = self.table.logical(raw_type)?;
        self.sensors
            .contains(&sensor)
            .then(|| SensorHandle::new(sensor, raw_type, format!("Test {}", sensor.id()), "biosens"))
    }

    fn register(&mut self, handle: &SensorHandle, _period: Duration) -> SensorResult<()> {
        if self.failing == Some(handle.sensor) {
            return Err(SensorError::Backend("refused".to_string()));
        }
        self.calls.push(BackendCall::Register(handle.sensor));
        self.registered.insert(handle.sensor);
        Ok(())
    }

    fn unregister(&mut self, handle: &SensorHandle) {
        self.calls.push(BackendCall::Unregister(handle.sensor));
        self.registered.remove(&handle.sensor);
    }

    fn permission(&self) -> PermissionStatus {
        self.permission
    }

    fn request_permission(&mut self) -> PermissionStatus {
        self.permission_requests += 1;
        self.permission
    }
}

pub fn registry_with(backend: &RecordingBackend) -> SensorRegistry {
    SensorRegistry::resolve_all(backend, SensorTypeTable::default())
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub points: Vec<(SeriesId, TimeSeriesPoint, usize)>,
    pub labels: Vec<(LabelField, String)>,
}

impl RecordingRenderer {
    pub fn last_label(&self, field: LabelField) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|(f, _)| *f == field)
            .map(|(_, text)| text.as_str())
    }
}

impl ChartRenderer for RecordingRenderer {
    fn append_point(&mut self, series: SeriesId, point: TimeSeriesPoint, capacity: usize) {
        self.points.push((series, point, capacity));
    }

    fn set_label(&mut self, field: LabelField, text: &str) {
        self.labels.push((field, text.to_string()));
    }
}

/// Alerter whose alarm keeps "playing" until `finish_alarm` is called
#[derive(Default)]
pub struct FakeAlerter {
    played: RefCell<Vec<AlertKind>>,
    alarm_playing: Cell<bool>,
}

impl FakeAlerter {
    pub fn played(&self) -> Vec<AlertKind> {
        self.played.borrow().clone()
    }

    pub fn finish_alarm(&self) {
        self.alarm_playing.set(false);
    }
}

impl Alerter for FakeAlerter {
    fn play(&self, kind: AlertKind) {
        self.played.borrow_mut().push(kind);
        if kind == AlertKind::Alarm {
            self.alarm_playing.set(true);
        }
    }

    fn is_playing(&self, kind: AlertKind) -> bool {
        kind == AlertKind::Alarm && self.alarm_playing.get()
    }
}
