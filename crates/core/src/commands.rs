//! Operator commands and the read-only view of the toggles they drive

use crate::controller::{Phase, SubscriptionController};
use crate::sink::SampleSink;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    SetSound(bool),
    ToggleSound,
    SetSensors(bool),
    ToggleSensors,
    /// One-shot PPG off-body calibration
    Calibrate,
    /// Print the current chart
    Snapshot,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("expected on, off or toggle after '{0}'")]
    BadSwitch(String),
}

fn parse_switch(verb: &str, arg: Option<&str>) -> Result<Option<bool>, CommandParseError> {
    match arg {
        None | Some("toggle") => Ok(None),
        Some("on") | Some("1") | Some("true") => Ok(Some(true)),
        Some("off") | Some("0") | Some("false") => Ok(Some(false)),
        Some(_) => Err(CommandParseError::BadSwitch(verb.to_string())),
    }
}

impl FromStr for OperatorCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let mut words = lowered.split_whitespace();
        let verb = words.next().ok_or(CommandParseError::Empty)?;
        let arg = words.next();

        match verb {
            "sound" | "s" => Ok(match parse_switch(verb, arg)? {
                Some(on) => OperatorCommand::SetSound(on),
                None => OperatorCommand::ToggleSound,
            }),
            "sensors" | "e" => Ok(match parse_switch(verb, arg)? {
                Some(on) => OperatorCommand::SetSensors(on),
                None => OperatorCommand::ToggleSensors,
            }),
            "calibrate" | "c" => Ok(OperatorCommand::Calibrate),
            "snapshot" | "p" => Ok(OperatorCommand::Snapshot),
            "quit" | "exit" | "q" => Ok(OperatorCommand::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

/// What a menu would show as checked, derived from the live state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlsView {
    pub sound_enabled: bool,
    pub sensors_enabled: bool,
    pub calibration_in_flight: bool,
    pub phase: Phase,
}

impl ControlsView {
    pub fn observe(controller: &SubscriptionController, sink: &SampleSink) -> Self {
        let state = controller.state();
        Self {
            sound_enabled: sink.sound_enabled(),
            sensors_enabled: state.pair_enabled,
            calibration_in_flight: state.calibration_in_flight,
            phase: controller.phase(),
        }
    }
}
