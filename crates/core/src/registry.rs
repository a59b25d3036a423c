//! Registry of resolved sensor handles

use crate::backend::SensorBackend;
use biosens_types::{LogicalSensor, SensorHandle, SensorTypeTable};
use log::{info, warn};
use std::collections::HashMap;

/// Handles resolved once at startup, keyed by logical sensor
///
/// A missing entry means the device does not expose that sensor; every later
/// operation against it is a no-op.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    handles: HashMap<LogicalSensor, SensorHandle>,
    table: SensorTypeTable,
}

impl SensorRegistry {
    /// Create an empty registry
    pub fn new(table: SensorTypeTable) -> Self {
        Self {
            handles: HashMap::new(),
            table,
        }
    }

    /// Resolve every logical sensor against the backend
    pub fn resolve_all(backend: &dyn SensorBackend, table: SensorTypeTable) -> Self {
        let mut registry = Self::new(table);
        for sensor in LogicalSensor::ALL {
            let raw_type = registry.table.raw_type(sensor);
            match backend.default_sensor(raw_type) {
                Some(handle) => {
                    info!(
                        "Resolved {} -> type {} ({} / {})",
                        sensor, raw_type, handle.name, handle.vendor
                    );
                    registry.insert(handle);
                }
                None => warn!("{} (type {}) is not available on this device", sensor, raw_type),
            }
        }
        registry
    }

    /// Add a handle under its logical sensor
    pub fn insert(&mut self, handle: SensorHandle) {
        self.handles.insert(handle.sensor, handle);
    }

    /// Handle for a logical sensor, if the device has one
    pub fn resolve(&self, sensor: LogicalSensor) -> Option<&SensorHandle> {
        self.handles.get(&sensor)
    }

    pub fn is_supported(&self, sensor: LogicalSensor) -> bool {
        self.handles.contains_key(&sensor)
    }

    /// Supported sensors in resolution order
    pub fn supported(&self) -> Vec<LogicalSensor> {
        LogicalSensor::ALL
            .into_iter()
            .filter(|s| self.is_supported(*s))
            .collect()
    }

    pub fn table(&self) -> &SensorTypeTable {
        &self.table
    }
}
