//! # DualShock Bridge
//!
//! Bench harness for the emulated DualShock port.
//!
//! Runs one emulated pad per configured port over the idle input backend and
//! clocks a poll frame through each of them at the console field rate.

use std::path::Path;

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use dualshock_bridge::config::Config;
use dualshock_bridge::input::IdleBackend;
use dualshock_bridge::keep_awake::KeepAwake;
use dualshock_bridge::pad::{DualShock, PlayStationDevice};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 600;

/// Poll frame the console sends every field (0x42 read, motors off)
const POLL_FRAME: [u8; 9] = [0x01, 0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Load the configuration, falling back to defaults when the file is absent
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let config = Config::load(path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn frame_period(poll_rate_hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / poll_rate_hz as u64)
}

/// Main entry point for the DualShock bridge bench
///
/// # Control Flow
///
/// 1. Set up logging and load configuration
/// 2. Create one DualShock per configured port and start keep-awake if enabled
/// 3. Send a poll frame to every pad each field, logging a status line every
///    600 frames
/// 4. Stop on Ctrl+C
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("DualShock Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(Path::new(&config_path))?;

    if config.general.priority {
        debug!("Process priority boost requested (not applied by the bench)");
    }

    let mut pads = Vec::with_capacity(config.ports.len());
    for (port, settings) in config.ports.iter().enumerate() {
        let mut pad = DualShock::new(*settings, config.general.buffer_size, IdleBackend)?;
        pad.set_port(port as u8);
        info!("Port {} -> host pad {} ({:?} by default)", port, settings.host_port, pad.default_mode());
        pads.push(pad);
    }

    let _keep_awake = if config.general.keep_awake {
        let period = Duration::from_secs(config.general.keep_awake_interval_s);
        Some(KeepAwake::start(|| debug!("Keep-awake: nudging host input"), period))
    } else {
        None
    };

    let mut frame_interval = interval(frame_period(config.general.poll_rate_hz));

    info!("Polling {} pad(s) at {}Hz", pads.len(), config.general.poll_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                for pad in pads.iter_mut() {
                    let reply = pad.transfer(&POLL_FRAME);
                    debug!("[{}] {:02X?}", pad.device().port(), reply);
                }

                frame_count += 1;

                if frame_count % LOG_INTERVAL_FRAMES == 0 {
                    for pad in &pads {
                        info!("Port {}: {} frames, mode {:?}, plugged {}",
                            pad.device().port(), frame_count, pad.mode(), pad.is_plugged());
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total frames polled: {}", frame_count);
                break;
            }
        }
    }

    Ok(())
}
