//! Audio playback for the accuracy alarm and off-body notifications

use anyhow::{Context, Result};
use biosens_core::{Alerter, SilentAlerter};
use biosens_types::AlertKind;
use log::{debug, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

const ALARM_SOUND_PATHS: &[&str] = &[
    // freedesktop sounds (Linux)
    "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
    "/usr/share/sounds/freedesktop/stereo/bell.oga",
    // Ubuntu/GNOME sounds
    "/usr/share/sounds/gnome/default/alerts/glass.ogg",
    // macOS
    "/System/Library/Sounds/Glass.aiff",
    // Windows
    "C:\\Windows\\Media\\Alarm01.wav",
];

const NOTIFICATION_SOUND_PATHS: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo/message.oga",
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/gnome/default/alerts/drip.ogg",
    "/usr/share/sounds/Oxygen-Sys-App-Message.ogg",
    "/System/Library/Sounds/Ping.aiff",
    "C:\\Windows\\Media\\notify.wav",
];

/// Configuration for alert sounds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertSoundConfig {
    /// Whether to open an audio device at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Custom alarm sound (None = system alarm sound)
    #[serde(default)]
    pub alarm_sound_path: Option<String>,

    /// Custom notification sound (None = system notification sound)
    #[serde(default)]
    pub notification_sound_path: Option<String>,

    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.8
}

impl Default for AlertSoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alarm_sound_path: None,
            notification_sound_path: None,
            volume: 0.8,
        }
    }
}

impl AlertSoundConfig {
    /// Files to try for a kind, custom path first
    pub fn candidates(&self, kind: AlertKind) -> Vec<String> {
        let (custom, system) = match kind {
            AlertKind::Alarm => (&self.alarm_sound_path, ALARM_SOUND_PATHS),
            AlertKind::Notification => (&self.notification_sound_path, NOTIFICATION_SOUND_PATHS),
        };
        custom
            .iter()
            .cloned()
            .chain(system.iter().map(|p| p.to_string()))
            .collect()
    }
}

/// Plays alert sounds on the default output device.
///
/// The alarm has its own sink so "already playing" can be observed;
/// notifications each get a detached sink and overlap freely.
pub struct AudioAlerter {
    // Keep the stream alive - dropping it stops all audio
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    alarm: Sink,
    config: AlertSoundConfig,
}

impl AudioAlerter {
    pub fn new(config: AlertSoundConfig) -> Result<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output stream")?;
        let alarm = Sink::try_new(&stream_handle).context("Failed to create audio sink")?;
        alarm.set_volume(config.volume.clamp(0.0, 1.0));

        Ok(Self {
            _stream: stream,
            stream_handle,
            alarm,
            config,
        })
    }

    /// Queue the sound for `kind` on a sink, falling back to a generated tone
    fn append_sound(&self, sink: &Sink, kind: AlertKind) {
        for path in self.config.candidates(kind) {
            if !Path::new(&path).exists() {
                continue;
            }
            match decode(&path) {
                Ok(source) => {
                    sink.append(source);
                    return;
                }
                Err(e) => warn!("{:#}", e),
            }
        }

        let (frequency, duration) = match kind {
            AlertKind::Alarm => (880.0, Duration::from_millis(1500)),
            AlertKind::Notification => (440.0, Duration::from_millis(150)),
        };
        let source = rodio::source::SineWave::new(frequency)
            .take_duration(duration)
            .amplify(0.3); // Reduce volume to avoid being too loud
        sink.append(source);
    }

    fn play_notification(&self) -> Result<()> {
        let sink = Sink::try_new(&self.stream_handle).context("Failed to create audio sink")?;
        sink.set_volume(self.config.volume.clamp(0.0, 1.0));
        self.append_sound(&sink, AlertKind::Notification);
        sink.detach();
        Ok(())
    }
}

fn decode(path: &str) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Failed to open sound file: {}", path))?;
    Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode sound file: {}", path))
}

impl Alerter for AudioAlerter {
    fn play(&self, kind: AlertKind) {
        debug!("Playing {:?}", kind);
        match kind {
            AlertKind::Alarm => {
                self.append_sound(&self.alarm, kind);
                self.alarm.play();
            }
            AlertKind::Notification => {
                if let Err(e) = self.play_notification() {
                    warn!("Notification sound failed: {:#}", e);
                }
            }
        }
    }

    fn is_playing(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::Alarm => !self.alarm.empty(),
            // Detached, not tracked
            AlertKind::Notification => false,
        }
    }
}

/// Open the audio device, or fall back to a logging alerter when sound is
/// disabled or no device is present.
pub fn create_alerter(config: &AlertSoundConfig) -> Box<dyn Alerter> {
    if !config.enabled {
        return Box::new(SilentAlerter);
    }
    match AudioAlerter::new(config.clone()) {
        Ok(alerter) => Box::new(alerter),
        Err(e) => {
            warn!("Audio unavailable, alerts will only be logged: {:#}", e);
            Box::new(SilentAlerter)
        }
    }
}
