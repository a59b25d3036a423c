//! Event handlers run on the delivery thread
//!
//! These are plain functions over explicitly borrowed collaborators. The
//! delivery thread owns the controller and sink; nothing else mutates them.

use crate::alert::Alerter;
use crate::backend::SensorBackend;
use crate::commands::OperatorCommand;
use crate::controller::SubscriptionController;
use crate::renderer::ChartRenderer;
use crate::sink::{format_value, SampleSink};
use biosens_types::{LabelField, LogicalSensor, Reading, SensorEvent, SeriesId, TimeSeriesPoint};
use log::{debug, info, trace};

/// Everything a handler may touch
pub struct MonitorContext<'a> {
    pub controller: &'a mut SubscriptionController,
    pub sink: &'a mut SampleSink,
    pub backend: &'a mut dyn SensorBackend,
    pub renderer: &'a mut dyn ChartRenderer,
    pub alerter: &'a dyn Alerter,
}

/// What happened to a sensor event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    Plotted(SeriesId, TimeSeriesPoint),
    /// Calibration finished and the biometric sensors were restarted
    Calibrated(f32),
    AccuracyShown(i32),
    /// The sensor is not delivering (late or suppressed reading)
    Dropped,
    Ignored,
}

/// What the monitor loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Snapshot,
    Quit,
}

pub fn handle_sensor_event(ctx: &mut MonitorContext<'_>, event: SensorEvent) -> Dispatch {
    match event {
        SensorEvent::Reading(reading) => handle_reading(ctx, &reading),
        SensorEvent::AccuracyChanged { sensor, accuracy } => {
            if !ctx.controller.is_delivering(sensor) {
                trace!("Dropping accuracy change from inactive {}", sensor);
                return Dispatch::Dropped;
            }
            if ctx.sink.on_accuracy_changed(sensor, accuracy, ctx.renderer) {
                Dispatch::AccuracyShown(accuracy)
            } else {
                Dispatch::Ignored
            }
        }
    }
}

fn handle_reading(ctx: &mut MonitorContext<'_>, reading: &Reading) -> Dispatch {
    if reading.sensor == LogicalSensor::OffBodyCalibration {
        if !ctx.controller.on_calibration_reading(ctx.backend) {
            trace!("Dropping calibration reading, no calibration in flight");
            return Dispatch::Dropped;
        }
        let text = format_value(reading.value);
        info!("PPG offbody calibration: {}", text);
        ctx.renderer
            .set_label(LabelField::Calibration, &format!("Cal: {}", text));
        return Dispatch::Calibrated(reading.value);
    }

    if !ctx.controller.is_delivering(reading.sensor) {
        trace!("Dropping late reading from {}", reading.sensor);
        return Dispatch::Dropped;
    }

    match ctx.sink.on_reading(reading, ctx.renderer, ctx.alerter) {
        Some(point) => match SeriesId::for_sensor(reading.sensor) {
            Some(series) => Dispatch::Plotted(series, point),
            None => Dispatch::Ignored,
        },
        None => Dispatch::Ignored,
    }
}

pub fn handle_command(ctx: &mut MonitorContext<'_>, command: OperatorCommand) -> CommandOutcome {
    debug!("Operator command: {:?}", command);
    match command {
        OperatorCommand::SetSound(on) => ctx.sink.set_sound_enabled(on),
        OperatorCommand::ToggleSound => {
            let on = !ctx.sink.sound_enabled();
            ctx.sink.set_sound_enabled(on);
        }
        OperatorCommand::SetSensors(on) => ctx.controller.toggle_enabled(on, ctx.backend),
        OperatorCommand::ToggleSensors => {
            let on = !ctx.controller.state().pair_enabled;
            ctx.controller.toggle_enabled(on, ctx.backend);
        }
        OperatorCommand::Calibrate => {
            ctx.controller.begin_calibration(ctx.backend);
            ctx.renderer.set_label(LabelField::Calibration, "Cal: --");
        }
        OperatorCommand::Snapshot => return CommandOutcome::Snapshot,
        OperatorCommand::Quit => return CommandOutcome::Quit,
    }
    CommandOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ControlsView;
    use crate::test_support::{registry_with, FakeAlerter, RecordingBackend, RecordingRenderer};
    use biosens_types::{AlertKind, ACCURACY_HIGH, ACCURACY_UNRELIABLE};
    use LogicalSensor::*;

    struct Harness {
        controller: SubscriptionController,
        sink: SampleSink,
        backend: RecordingBackend,
        renderer: RecordingRenderer,
        alerter: FakeAlerter,
    }

    impl Harness {
        fn new(sensors: &[LogicalSensor]) -> Self {
            let mut backend = RecordingBackend::with_sensors(sensors);
            let mut controller = SubscriptionController::new(registry_with(&backend));
            controller.start(&mut backend, true);
            Self {
                controller,
                sink: SampleSink::new(false),
                backend,
                renderer: RecordingRenderer::default(),
                alerter: FakeAlerter::default(),
            }
        }

        fn ctx(&mut self) -> MonitorContext<'_> {
            MonitorContext {
                controller: &mut self.controller,
                sink: &mut self.sink,
                backend: &mut self.backend,
                renderer: &mut self.renderer,
                alerter: &self.alerter,
            }
        }

        fn send(&mut self, sensor: LogicalSensor, value: f32, accuracy: i32) -> Dispatch {
            let reading = Reading::new(sensor, value, accuracy, 0);
            handle_sensor_event(&mut self.ctx(), reading.into())
        }

        fn command(&mut self, command: OperatorCommand) -> CommandOutcome {
            handle_command(&mut self.ctx(), command)
        }
    }

    #[test]
    fn test_readings_plot_while_pair_active() {
        let mut h = Harness::new(&LogicalSensor::ALL);
        assert_eq!(
            h.send(HeartRate, 65.0, ACCURACY_HIGH),
            Dispatch::Plotted(SeriesId::HeartRate, TimeSeriesPoint::new(0, 65.0))
        );
        assert_eq!(
            h.send(OffBodyLowLatency, 1.0, ACCURACY_HIGH),
            Dispatch::Plotted(SeriesId::OffBody, TimeSeriesPoint::new(1, 150.0))
        );
    }

    #[test]
    fn test_no_biometric_readings_accepted_during_calibration() {
        let mut h = Harness::new(&LogicalSensor::ALL);
        h.send(HeartRate, 65.0, ACCURACY_HIGH);

        h.command(OperatorCommand::Calibrate);
        assert_eq!(h.renderer.last_label(LabelField::Calibration), Some("Cal: --"));
        for sensor in [HeartRate, OffBodyLowLatency, OffBodyEnhanced] {
            assert_eq!(h.send(sensor, 1.0, ACCURACY_HIGH), Dispatch::Dropped);
        }
        assert_eq!(h.sink.tick(), 1);

        assert_eq!(h.send(OffBodyCalibration, 0.25, ACCURACY_HIGH), Dispatch::Calibrated(0.25));
        assert_eq!(h.renderer.last_label(LabelField::Calibration), Some("Cal: 0.25"));
        assert_eq!(
            h.send(HeartRate, 66.0, ACCURACY_HIGH),
            Dispatch::Plotted(SeriesId::HeartRate, TimeSeriesPoint::new(1, 66.0))
        );
    }

    #[test]
    fn test_late_reading_after_disable_is_dropped() {
        let mut h = Harness::new(&LogicalSensor::ALL);
        h.command(OperatorCommand::SetSensors(false));

        assert_eq!(h.send(HeartRate, 70.0, ACCURACY_HIGH), Dispatch::Dropped);
        assert_eq!(h.send(OffBodyCalibration, 1.0, ACCURACY_HIGH), Dispatch::Dropped);
        assert!(h.renderer.points.is_empty());
    }

    #[test]
    fn test_calibration_without_vendor_sensors_never_resumes() {
        let mut h = Harness::new(&[HeartRate, OffBodyLowLatency]);
        h.command(OperatorCommand::Calibrate);

        assert!(h.backend.registered().is_empty());
        assert_eq!(h.send(HeartRate, 70.0, ACCURACY_HIGH), Dispatch::Dropped);
        let view = ControlsView::observe(&h.controller, &h.sink);
        assert!(!view.sensors_enabled);
        assert!(!view.calibration_in_flight);

        // Only the operator brings the sensors back
        h.command(OperatorCommand::ToggleSensors);
        assert!(matches!(h.send(HeartRate, 70.0, ACCURACY_HIGH), Dispatch::Plotted(..)));
    }

    #[test]
    fn test_sound_toggle_drives_alarm() {
        let mut h = Harness::new(&[HeartRate]);
        h.send(HeartRate, 0.0, ACCURACY_UNRELIABLE);
        assert!(h.alerter.played().is_empty());

        h.command(OperatorCommand::ToggleSound);
        assert!(ControlsView::observe(&h.controller, &h.sink).sound_enabled);
        h.send(HeartRate, 0.0, ACCURACY_UNRELIABLE);
        h.send(HeartRate, 0.0, ACCURACY_UNRELIABLE);
        assert_eq!(h.alerter.played(), vec![AlertKind::Alarm]);
    }

    #[test]
    fn test_accuracy_changes() {
        let mut h = Harness::new(&[HeartRate, OffBodyLowLatency]);
        let ev = SensorEvent::AccuracyChanged { sensor: HeartRate, accuracy: 1 };
        assert_eq!(handle_sensor_event(&mut h.ctx(), ev), Dispatch::AccuracyShown(1));
        let ev = SensorEvent::AccuracyChanged { sensor: OffBodyLowLatency, accuracy: 1 };
        assert_eq!(handle_sensor_event(&mut h.ctx(), ev), Dispatch::Ignored);
        assert_eq!(h.renderer.last_label(LabelField::Accuracy), Some("Acc : 1"));
    }

    #[test]
    fn test_snapshot_and_quit_are_passed_up() {
        let mut h = Harness::new(&[HeartRate]);
        assert_eq!(h.command(OperatorCommand::Snapshot), CommandOutcome::Snapshot);
        assert_eq!(h.command(OperatorCommand::Quit), CommandOutcome::Quit);
        assert_eq!(h.command(OperatorCommand::SetSound(true)), CommandOutcome::Continue);
    }

    #[test]
    fn test_failed_registration_does_not_block_partner() {
        let mut backend = RecordingBackend::with_sensors(&LogicalSensor::ALL).failing_on(HeartRate);
        let mut controller = SubscriptionController::new(registry_with(&backend));
        controller.start(&mut backend, true);

        assert!(!controller.is_delivering(HeartRate));
        assert!(controller.is_delivering(OffBodyLowLatency));
        assert!(controller.is_delivering(OffBodyEnhanced));
    }
}
