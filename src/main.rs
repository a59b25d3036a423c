use anyhow::{Context, Result};
use biosens::{AppConfig, Monitor, MonitorOptions};
use biosens_core::{event_channel, OperatorCommand};
use biosens_sources::{BackendConfig, ReplayConfig, SimulatedDeviceConfig};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Simulated,
    Replay,
}

/// biosens - live monitor for wearable PPG heart-rate and off-body sensors
#[derive(Parser, Debug, Clone)]
#[command(name = "biosens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sensor backend to use (overrides the config file)
    #[arg(long = "backend", value_enum)]
    backend: Option<BackendKind>,

    /// Replay readings from a JSON-lines recording
    #[arg(short = 'r', long = "replay", value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Replay speed multiplier
    #[arg(long = "speed", value_name = "FACTOR")]
    speed: Option<f64>,

    /// Start with alert sounds enabled
    #[arg(short = 's', long = "sound")]
    sound: bool,

    /// Start with the biometric sensors stopped
    #[arg(long = "sensors-off")]
    sensors_off: bool,

    /// Simulate a device without the vendor calibration/enhanced sensors
    #[arg(long = "no-vendor-sensors")]
    no_vendor_sensors: bool,

    /// Stop after this many seconds
    #[arg(short = 't', long = "duration", value_name = "SECONDS")]
    duration: Option<u64>,

    /// Write the final chart as JSON to this file
    #[arg(short = 'o', long = "snapshot-out", value_name = "FILE")]
    snapshot_out: Option<PathBuf>,

    /// Save the effective configuration and exit
    #[arg(long = "write-config")]
    write_config: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info (normal verbosity)
    // Level 2: debug (every reading)
    // Level 3+: trace (dropped readings too)
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Merge command line overrides into the loaded configuration
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if cli.sound {
        config.sound_enabled = true;
    }
    if cli.sensors_off {
        config.sensors_enabled = false;
    }

    let kind = match (cli.backend, &cli.replay) {
        (Some(kind), _) => Some(kind),
        (None, Some(_)) => Some(BackendKind::Replay),
        (None, None) => None,
    };
    match kind {
        Some(BackendKind::Replay) => {
            let mut replay = match &config.backend {
                BackendConfig::Replay(existing) => existing.clone(),
                BackendConfig::Simulated(_) => ReplayConfig::new(""),
            };
            if let Some(path) = &cli.replay {
                replay.path = path.clone();
            }
            config.backend = BackendConfig::Replay(replay);
        }
        Some(BackendKind::Simulated) => {
            if !matches!(config.backend, BackendConfig::Simulated(_)) {
                config.backend = BackendConfig::Simulated(SimulatedDeviceConfig::default());
            }
        }
        None => {}
    }

    match &mut config.backend {
        BackendConfig::Replay(replay) => {
            if let Some(speed) = cli.speed {
                replay.speed = speed;
            }
        }
        BackendConfig::Simulated(device) => {
            if cli.no_vendor_sensors {
                device.exposed.retain(|s| !s.is_vendor_specific());
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    warn!("Starting biosens v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::load().context("Failed to load config")?,
    };
    apply_overrides(&mut config, &cli);

    if cli.write_config {
        match &cli.config {
            Some(path) => config.save_to_path(path)?,
            None => config.save()?,
        }
        println!("Configuration written");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let (sender, receiver) = event_channel();
    let backend = biosens_sources::create_backend(
        &config.backend,
        &config.sensor_types,
        sender,
        runtime.handle().clone(),
    )?;

    let alert_sound = config.alert_sound.clone();
    let monitor = Monitor::new(&MonitorOptions::from(&config), backend)
        .spawn(receiver, move || biosens_audio::create_alerter(&alert_sound))?;

    println!("Commands: sound [on|off|toggle], sensors [on|off|toggle], calibrate, snapshot, quit");

    // Operator commands from stdin
    let commands = monitor.commands();
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<OperatorCommand>() {
                    Ok(command) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
        })
        .context("Failed to spawn stdin reader")?;

    // Ctrl-C or the run time limit ends the session
    let commands = monitor.commands();
    let duration = cli.duration.map(Duration::from_secs);
    runtime.spawn(async move {
        match duration {
            Some(duration) => tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
                _ = tokio::time::sleep(duration) => info!("Run time elapsed"),
            },
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Could not listen for Ctrl-C: {}", e);
                    return;
                }
                info!("Interrupted");
            }
        }
        let _ = commands.send(OperatorCommand::Quit);
    });

    let renderer = monitor.join()?;
    runtime.shutdown_background();

    let snapshot = renderer.snapshot();
    if let Some(path) = &cli.snapshot_out {
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!("Chart snapshot written to {}", path.display());
    }
    for series in &snapshot.series {
        info!("{:?}: {} points", series.id, series.points.len());
    }
    Ok(())
}
