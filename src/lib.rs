//! biosens: live monitor for a wearable's PPG sensor stack
//!
//! This library wires the workspace crates into a running monitor:
//! - Configuration management
//! - The single-threaded sensor delivery loop
//! - A console front end for the chart model

pub mod app;
pub mod config;

// Re-export commonly used types
pub use app::{ConsoleRenderer, Monitor, MonitorHandle, MonitorOptions};
pub use config::AppConfig;
