//! Subscription controller
//!
//! Owns the one piece of mutable subscription state in the system: which
//! sensors are currently delivering. The biometric group (heart rate plus
//! both off-body detectors) is always started and stopped together, and the
//! calibration sensor never delivers at the same time as that group.
//!
//! ```text
//! Idle -> PairActive <-> CalibrationActive -> PairActive
//!              |  ^
//!              v  |
//!            Quiesced            (any) -> Stopped
//! ```

use crate::backend::{PermissionStatus, SensorBackend};
use crate::constants::DEFAULT_SAMPLING_PERIOD;
use crate::error::{SensorError, SensorResult};
use crate::registry::SensorRegistry;
use biosens_types::LogicalSensor;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// What to do when the body-sensor permission is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// Refuse to start delivery until the permission is granted
    #[default]
    Block,
    /// Log the denial and try anyway
    Proceed,
}

/// Logical subscription flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SubscriptionState {
    pub pair_enabled: bool,
    pub calibration_in_flight: bool,
}

/// Controller state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing has been started yet
    Idle,
    PairActive,
    CalibrationActive,
    /// Started, but neither the pair nor calibration is delivering
    Quiesced,
    /// Shut down; all delivery stopped
    Stopped,
}

pub struct SubscriptionController {
    registry: SensorRegistry,
    state: SubscriptionState,
    delivering: HashSet<LogicalSensor>,
    period: Duration,
    policy: PermissionPolicy,
    started: bool,
    stopped: bool,
}

impl SubscriptionController {
    pub fn new(registry: SensorRegistry) -> Self {
        Self {
            registry,
            state: SubscriptionState::default(),
            delivering: HashSet::new(),
            period: DEFAULT_SAMPLING_PERIOD,
            policy: PermissionPolicy::default(),
            started: false,
            stopped: false,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_permission_policy(mut self, policy: PermissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Foreground entry: request the permission, then enable the pair if
    /// `sensors_enabled` is set.
    pub fn start(&mut self, backend: &mut dyn SensorBackend, sensors_enabled: bool) {
        self.state = SubscriptionState::default();
        self.delivering.clear();
        self.stopped = false;
        self.started = true;

        if backend.permission() == PermissionStatus::Denied
            && backend.request_permission() == PermissionStatus::Denied
        {
            error!("body sensor permission denied");
        }

        if sensors_enabled {
            self.enable_pair(backend);
        }
    }

    /// Begin delivery for every present biometric sensor.
    ///
    /// A missing handle does not block the others.
    pub fn enable_pair(&mut self, backend: &mut dyn SensorBackend) {
        self.started = true;
        if let Err(e) = self.check_permission(backend) {
            error!("{}, not starting sensors", e);
            return;
        }
        for sensor in LogicalSensor::BIOMETRIC {
            self.begin_delivery(backend, sensor);
        }
        self.state.pair_enabled = true;
    }

    /// Stop delivery for every biometric sensor. Idempotent.
    pub fn disable_pair(&mut self, backend: &mut dyn SensorBackend) {
        for sensor in LogicalSensor::BIOMETRIC {
            self.end_delivery(backend, sensor);
        }
        self.state.pair_enabled = false;
    }

    /// Quiesce the PPG sensors, then start the calibration sensor.
    ///
    /// Returns whether calibration delivery is running. Without a calibration
    /// handle the pair stays disabled and nothing re-enables it on its own.
    pub fn begin_calibration(&mut self, backend: &mut dyn SensorBackend) -> bool {
        self.started = true;
        self.disable_pair(backend);

        if self.state.calibration_in_flight {
            debug!("Calibration already in progress");
            return true;
        }
        if let Err(e) = self.check_permission(backend) {
            error!("{}, not starting calibration", e);
            return false;
        }
        if self.begin_delivery(backend, LogicalSensor::OffBodyCalibration) {
            info!("PPG off-body calibration started");
            self.state.calibration_in_flight = true;
        } else {
            warn!("Calibration unavailable; biometric sensors remain disabled");
        }
        self.state.calibration_in_flight
    }

    /// One-shot transition on a calibration reading: stop calibration and
    /// re-enable the pair. Returns false (and does nothing) when no
    /// calibration is in flight.
    pub fn on_calibration_reading(&mut self, backend: &mut dyn SensorBackend) -> bool {
        if !self.state.calibration_in_flight {
            return false;
        }
        self.end_delivery(backend, LogicalSensor::OffBodyCalibration);
        self.state.calibration_in_flight = false;
        self.enable_pair(backend);
        true
    }

    /// Operator toggle for the biometric pair.
    ///
    /// Enabling while a calibration is in flight cancels the calibration so the
    /// two never deliver together.
    pub fn toggle_enabled(&mut self, request_enable: bool, backend: &mut dyn SensorBackend) {
        if request_enable {
            if self.state.calibration_in_flight {
                warn!("Enabling sensors cancels the calibration in progress");
                self.end_delivery(backend, LogicalSensor::OffBodyCalibration);
                self.state.calibration_in_flight = false;
            }
            self.enable_pair(backend);
        } else {
            self.disable_pair(backend);
        }
    }

    /// Stop delivery for every handle
    pub fn shutdown(&mut self, backend: &mut dyn SensorBackend) {
        self.disable_pair(backend);
        self.end_delivery(backend, LogicalSensor::OffBodyCalibration);
        self.state.calibration_in_flight = false;
        self.stopped = true;
        info!("All sensor delivery stopped");
    }

    /// Whether readings from this sensor should currently be accepted
    pub fn is_delivering(&self, sensor: LogicalSensor) -> bool {
        !self.stopped && self.delivering.contains(&sensor)
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        if self.stopped {
            Phase::Stopped
        } else if self.state.calibration_in_flight {
            Phase::CalibrationActive
        } else if self.state.pair_enabled {
            Phase::PairActive
        } else if self.started {
            Phase::Quiesced
        } else {
            Phase::Idle
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    fn check_permission(&self, backend: &dyn SensorBackend) -> SensorResult<()> {
        match (backend.permission(), self.policy) {
            (PermissionStatus::Granted, _) => Ok(()),
            (PermissionStatus::Denied, PermissionPolicy::Proceed) => {
                warn!("body sensor permission denied, registering anyway");
                Ok(())
            }
            (PermissionStatus::Denied, PermissionPolicy::Block) => {
                Err(SensorError::PermissionDenied)
            }
        }
    }

    fn begin_delivery(&mut self, backend: &mut dyn SensorBackend, sensor: LogicalSensor) -> bool {
        let Some(handle) = self.registry.resolve(sensor) else {
            debug!("{} not supported, skipping", sensor);
            return false;
        };
        if self.delivering.contains(&sensor) {
            return true;
        }
        match backend.register(handle, self.period) {
            Ok(()) => {
                debug!("Started {}", sensor);
                self.delivering.insert(sensor);
                true
            }
            Err(e) => {
                warn!("Failed to start {}: {}", sensor, e);
                false
            }
        }
    }

    fn end_delivery(&mut self, backend: &mut dyn SensorBackend, sensor: LogicalSensor) {
        if let Some(handle) = self.registry.resolve(sensor) {
            backend.unregister(handle);
        }
        if self.delivering.remove(&sensor) {
            debug!("Stopped {}", sensor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{registry_with, BackendCall, RecordingBackend};
    use LogicalSensor::*;

    fn full_controller() -> (SubscriptionController, RecordingBackend) {
        let backend = RecordingBackend::with_sensors(&LogicalSensor::ALL);
        let controller = SubscriptionController::new(registry_with(&backend));
        (controller, backend)
    }

    #[test]
    fn test_enable_pair_starts_present_sensors_only() {
        let mut backend = RecordingBackend::with_sensors(&[HeartRate]);
        let mut controller = SubscriptionController::new(registry_with(&backend));

        controller.enable_pair(&mut backend);

        assert_eq!(backend.registered(), vec![HeartRate]);
        assert!(controller.is_delivering(HeartRate));
        assert!(!controller.is_delivering(OffBodyLowLatency));
        assert_eq!(controller.phase(), Phase::PairActive);
    }

    #[test]
    fn test_disable_pair_is_idempotent() {
        let (mut controller, mut backend) = full_controller();
        controller.enable_pair(&mut backend);
        controller.disable_pair(&mut backend);
        controller.disable_pair(&mut backend);

        assert!(backend.registered().is_empty());
        assert!(!controller.state().pair_enabled);
        for sensor in LogicalSensor::BIOMETRIC {
            assert!(!controller.is_delivering(sensor));
        }
    }

    #[test]
    fn test_calibration_disables_pair_before_starting() {
        let (mut controller, mut backend) = full_controller();
        controller.enable_pair(&mut backend);
        backend.clear_calls();

        assert!(controller.begin_calibration(&mut backend));

        let calls = backend.calls();
        let calibration_at = calls
            .iter()
            .position(|c| *c == BackendCall::Register(OffBodyCalibration))
            .unwrap();
        for sensor in [HeartRate, OffBodyLowLatency, OffBodyEnhanced] {
            let stop_at = calls
                .iter()
                .position(|c| *c == BackendCall::Unregister(sensor))
                .unwrap();
            assert!(stop_at < calibration_at);
        }
        assert_eq!(backend.registered(), vec![OffBodyCalibration]);
        assert_eq!(controller.phase(), Phase::CalibrationActive);
    }

    #[test]
    fn test_calibration_reading_reenables_pair_once() {
        let (mut controller, mut backend) = full_controller();
        controller.enable_pair(&mut backend);
        controller.begin_calibration(&mut backend);
        backend.clear_calls();

        assert!(controller.on_calibration_reading(&mut backend));
        let calls = backend.calls();
        assert_eq!(calls[0], BackendCall::Unregister(OffBodyCalibration));
        assert_eq!(
            calls.iter().filter(|c| matches!(c, BackendCall::Register(_))).count(),
            3
        );
        assert_eq!(controller.phase(), Phase::PairActive);

        // A second calibration reading is late and changes nothing
        backend.clear_calls();
        assert!(!controller.on_calibration_reading(&mut backend));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_calibration_without_vendor_sensors_leaves_pair_disabled() {
        let mut backend = RecordingBackend::with_sensors(&[HeartRate, OffBodyLowLatency]);
        let mut controller = SubscriptionController::new(registry_with(&backend));
        assert_eq!(
            controller.registry().supported(),
            vec![HeartRate, OffBodyLowLatency]
        );

        controller.enable_pair(&mut backend);
        assert!(!controller.begin_calibration(&mut backend));

        assert!(backend.registered().is_empty());
        assert!(!controller.state().pair_enabled);
        assert!(!controller.state().calibration_in_flight);
        assert_eq!(controller.phase(), Phase::Quiesced);
        assert!(!controller.on_calibration_reading(&mut backend));
        assert!(backend.registered().is_empty());
    }

    #[test]
    fn test_enabling_during_calibration_cancels_it() {
        let (mut controller, mut backend) = full_controller();
        controller.begin_calibration(&mut backend);

        controller.toggle_enabled(true, &mut backend);

        assert!(!controller.is_delivering(OffBodyCalibration));
        assert!(!backend.registered().contains(&OffBodyCalibration));
        assert!(controller.is_delivering(HeartRate));
        assert_eq!(controller.phase(), Phase::PairActive);
    }

    #[test]
    fn test_toggle_disable() {
        let (mut controller, mut backend) = full_controller();
        controller.start(&mut backend, true);
        controller.toggle_enabled(false, &mut backend);
        assert_eq!(controller.phase(), Phase::Quiesced);
        controller.toggle_enabled(true, &mut backend);
        assert_eq!(controller.phase(), Phase::PairActive);
    }

    #[test]
    fn test_permission_block_registers_nothing() {
        let mut backend = RecordingBackend::with_sensors(&LogicalSensor::ALL).denied();
        let mut controller = SubscriptionController::new(registry_with(&backend));

        controller.start(&mut backend, true);
        controller.begin_calibration(&mut backend);

        assert!(backend.registered().is_empty());
        assert_eq!(backend.permission_requests(), 1);
        assert_eq!(controller.phase(), Phase::Quiesced);
    }

    #[test]
    fn test_permission_check_reports_denial() {
        let backend = RecordingBackend::with_sensors(&[HeartRate]).denied();
        let controller = SubscriptionController::new(registry_with(&backend));
        assert!(matches!(
            controller.check_permission(&backend),
            Err(SensorError::PermissionDenied)
        ));

        let controller = controller.with_permission_policy(PermissionPolicy::Proceed);
        assert!(controller.check_permission(&backend).is_ok());

        let granted = RecordingBackend::with_sensors(&[HeartRate]);
        let controller = SubscriptionController::new(registry_with(&granted));
        assert!(controller.check_permission(&granted).is_ok());
    }

    #[test]
    fn test_permission_proceed_registers_anyway() {
        let mut backend = RecordingBackend::with_sensors(&[HeartRate]).denied();
        let mut controller = SubscriptionController::new(registry_with(&backend))
            .with_permission_policy(PermissionPolicy::Proceed);

        controller.start(&mut backend, true);

        assert_eq!(backend.registered(), vec![HeartRate]);
    }

    #[test]
    fn test_shutdown_stops_everything() {
        let (mut controller, mut backend) = full_controller();
        controller.start(&mut backend, true);
        controller.begin_calibration(&mut backend);

        controller.shutdown(&mut backend);

        assert!(backend.registered().is_empty());
        assert_eq!(controller.phase(), Phase::Stopped);
        assert!(!controller.is_delivering(OffBodyCalibration));
    }

    #[test]
    fn test_idle_before_start() {
        let (controller, _backend) = full_controller();
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn test_start_without_sensors_enabled() {
        let (mut controller, mut backend) = full_controller();
        controller.start(&mut backend, false);
        assert!(backend.registered().is_empty());
        assert_eq!(controller.phase(), Phase::Quiesced);
    }
}
