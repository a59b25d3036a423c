//! The monitor: one delivery thread that owns all sensor state
//!
//! Sensor events and operator commands arrive on two channels. A single
//! thread selects over both and runs each handler to completion, so the
//! controller, the sink and its tick counter are never shared.

mod console;

pub use console::ConsoleRenderer;

use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use biosens_core::{
    handle_command, handle_sensor_event, Alerter, BoxedBackend, CommandOutcome, ControlsView,
    EventReceiver, MonitorContext, OperatorCommand, PermissionPolicy, SampleSink, SensorRegistry,
    SubscriptionController,
};
use biosens_types::SensorTypeTable;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{info, warn};
use std::thread::JoinHandle;
use std::time::Duration;

/// Startup settings for a monitor session
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub sound_enabled: bool,
    pub sensors_enabled: bool,
    pub sampling_period: Duration,
    pub permission_policy: PermissionPolicy,
    pub sensor_types: SensorTypeTable,
}

impl From<&AppConfig> for MonitorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            sound_enabled: config.sound_enabled,
            sensors_enabled: config.sensors_enabled,
            sampling_period: config.sampling_period(),
            permission_policy: config.permission_policy,
            sensor_types: config.sensor_types.clone(),
        }
    }
}

/// State owned by the delivery thread
pub struct Monitor {
    controller: SubscriptionController,
    sink: SampleSink,
    backend: BoxedBackend,
    renderer: ConsoleRenderer,
    sensors_enabled: bool,
}

impl Monitor {
    /// Resolve sensors once against the backend and set up fresh state
    pub fn new(options: &MonitorOptions, backend: BoxedBackend) -> Self {
        let registry = SensorRegistry::resolve_all(backend.as_ref(), options.sensor_types.clone());
        let controller = SubscriptionController::new(registry)
            .with_period(options.sampling_period)
            .with_permission_policy(options.permission_policy);

        Self {
            controller,
            sink: SampleSink::new(options.sound_enabled),
            backend,
            renderer: ConsoleRenderer::new(),
            sensors_enabled: options.sensors_enabled,
        }
    }

    /// Start the delivery thread. The alerter is built on that thread since
    /// audio output handles cannot move between threads.
    pub fn spawn<F>(self, events: EventReceiver, make_alerter: F) -> Result<MonitorHandle>
    where
        F: FnOnce() -> Box<dyn Alerter> + Send + 'static,
    {
        let (commands, command_rx) = unbounded();
        let thread = std::thread::Builder::new()
            .name("sensor-delivery".to_string())
            .spawn(move || {
                let alerter = make_alerter();
                self.run(events, command_rx, alerter.as_ref())
            })
            .context("Failed to spawn sensor delivery thread")?;

        Ok(MonitorHandle { commands, thread })
    }

    fn controls(&self) -> ControlsView {
        ControlsView::observe(&self.controller, &self.sink)
    }

    fn run(
        mut self,
        events: EventReceiver,
        commands: Receiver<OperatorCommand>,
        alerter: &dyn Alerter,
    ) -> ConsoleRenderer {
        self.controller
            .start(self.backend.as_mut(), self.sensors_enabled);
        info!("Monitor started ({:?})", self.controller.phase());

        loop {
            crossbeam::select! {
                recv(events) -> event => {
                    let Ok(event) = event else {
                        warn!("Sensor event channel closed");
                        break;
                    };
                    let mut ctx = MonitorContext {
                        controller: &mut self.controller,
                        sink: &mut self.sink,
                        backend: self.backend.as_mut(),
                        renderer: &mut self.renderer,
                        alerter,
                    };
                    handle_sensor_event(&mut ctx, event);
                }
                recv(commands) -> command => {
                    let Ok(command) = command else {
                        info!("Command channel closed");
                        break;
                    };
                    let mut ctx = MonitorContext {
                        controller: &mut self.controller,
                        sink: &mut self.sink,
                        backend: self.backend.as_mut(),
                        renderer: &mut self.renderer,
                        alerter,
                    };
                    match handle_command(&mut ctx, command) {
                        CommandOutcome::Continue => {}
                        CommandOutcome::Snapshot => {
                            println!("{}", self.renderer.summary(&self.controls()));
                        }
                        CommandOutcome::Quit => break,
                    }
                }
            }
        }

        self.controller.shutdown(self.backend.as_mut());
        self.renderer
    }
}

/// Handle to a running monitor
pub struct MonitorHandle {
    commands: Sender<OperatorCommand>,
    thread: JoinHandle<ConsoleRenderer>,
}

impl MonitorHandle {
    /// A sender for operator commands; cheap to clone
    pub fn commands(&self) -> Sender<OperatorCommand> {
        self.commands.clone()
    }

    pub fn send(&self, command: OperatorCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("Monitor is no longer running"))
    }

    /// Wait for the delivery thread to finish and get the final chart back
    pub fn join(self) -> Result<ConsoleRenderer> {
        drop(self.commands);
        self.thread
            .join()
            .map_err(|_| anyhow!("Sensor delivery thread panicked"))
    }
}
