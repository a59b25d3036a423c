//! biosens-sources: Sensor backend implementations for biosens.

mod replay;
mod simulated;

pub use replay::{parse_recording, ReplayBackend, ReplayConfig};
pub use simulated::{SimulatedBackend, SimulatedDeviceConfig, WaveConfig, WaveMode};

use anyhow::Result;
use biosens_core::{BoxedBackend, EventSender};
use biosens_types::SensorTypeTable;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

/// Which sensor platform to read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Simulated(SimulatedDeviceConfig),
    Replay(ReplayConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Simulated(SimulatedDeviceConfig::default())
    }
}

impl BackendConfig {
    /// Backend type identifier
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Simulated(_) => "simulated",
            BackendConfig::Replay(_) => "replay",
        }
    }
}

/// Build the configured backend. Backend tasks are spawned on `runtime`.
pub fn create_backend(
    config: &BackendConfig,
    table: &SensorTypeTable,
    sender: EventSender,
    runtime: Handle,
) -> Result<BoxedBackend> {
    let backend: BoxedBackend = match config {
        BackendConfig::Simulated(device) => Box::new(SimulatedBackend::new(
            device.clone(),
            table.clone(),
            sender,
            runtime,
        )),
        BackendConfig::Replay(replay) => Box::new(ReplayBackend::open(
            replay,
            table.clone(),
            sender,
            runtime,
        )?),
    };
    log::info!("Using {} sensor backend", backend.metadata().name);
    Ok(backend)
}
