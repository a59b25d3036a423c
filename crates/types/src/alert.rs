//! Alert kinds

use serde::{Deserialize, Serialize};

/// Which sound to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Sustained alarm for unreliable heart-rate accuracy; at most one at a time
    Alarm,
    /// Short one-shot notification
    Notification,
}
