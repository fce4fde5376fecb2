//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::pad::protocol::{PadMode, FRAME_LEN};

/// Number of emulated controller ports (and XInput slots)
pub const MAX_PORTS: usize = 4;

/// Largest device buffer accepted
const MAX_BUFFER_SIZE: usize = 256;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default = "default_ports")]
    pub ports: Vec<PortSettings>,
}

/// Plugin-wide settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(default)]
    pub priority: bool,

    #[serde(default)]
    pub keep_awake: bool,

    #[serde(default = "default_keep_awake_interval_s")]
    pub keep_awake_interval_s: u64,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_poll_rate_hz")]
    pub poll_rate_hz: u32,
}

/// Per-port settings, read-only to the device
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    /// Host gamepad slot (XInput 0-3)
    #[serde(default)]
    pub host_port: u8,

    /// Start in analog mode after reset
    #[serde(default = "default_default_analog")]
    pub default_analog: bool,

    /// Report the green (0x53) analog variant instead of red (0x73)
    #[serde(default)]
    pub green_analog: bool,
}

// Default value functions
fn default_keep_awake_interval_s() -> u64 { 50 }
fn default_buffer_size() -> usize { FRAME_LEN }
fn default_poll_rate_hz() -> u32 { 60 }

fn default_default_analog() -> bool { true }

fn default_ports() -> Vec<PortSettings> {
    vec![PortSettings::for_host_port(0), PortSettings::for_host_port(1)]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            priority: false,
            keep_awake: false,
            keep_awake_interval_s: default_keep_awake_interval_s(),
            buffer_size: default_buffer_size(),
            poll_rate_hz: default_poll_rate_hz(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            ports: default_ports(),
        }
    }
}

impl PortSettings {
    /// Default settings bound to one host gamepad slot
    pub fn for_host_port(host_port: u8) -> Self {
        Self {
            host_port,
            default_analog: default_default_analog(),
            green_analog: false,
        }
    }

    /// Mode selected on reset
    pub fn default_mode(&self) -> PadMode {
        if self.default_analog {
            PadMode::analog(self.green_analog)
        } else {
            PadMode::Digital
        }
    }

    /// Analog variant the mode button switches to
    pub fn analog_mode(&self) -> PadMode {
        PadMode::analog(self.green_analog)
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self::for_host_port(0)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dualshock_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.ports.is_empty() || self.ports.len() > MAX_PORTS {
            return Err(crate::error::DualShockBridgeError::Config(
                toml::de::Error::custom(format!("between 1 and {} ports must be configured", MAX_PORTS))
            ));
        }

        for (index, port) in self.ports.iter().enumerate() {
            if port.host_port as usize >= MAX_PORTS {
                return Err(crate::error::DualShockBridgeError::Config(
                    toml::de::Error::custom(format!(
                        "ports[{}].host_port {} is out of bounds (must be 0-{})",
                        index, port.host_port, MAX_PORTS - 1
                    ))
                ));
            }
        }

        if self.general.buffer_size < FRAME_LEN || self.general.buffer_size > MAX_BUFFER_SIZE {
            return Err(crate::error::DualShockBridgeError::Config(
                toml::de::Error::custom(format!("buffer_size must be between {} and {}", FRAME_LEN, MAX_BUFFER_SIZE))
            ));
        }

        if self.general.keep_awake_interval_s == 0 || self.general.keep_awake_interval_s > 3600 {
            return Err(crate::error::DualShockBridgeError::Config(
                toml::de::Error::custom("keep_awake_interval_s must be between 1 and 3600")
            ));
        }

        // NTSC and PAL field rates
        if ![50, 60].contains(&self.general.poll_rate_hz) {
            return Err(crate::error::DualShockBridgeError::Config(
                toml::de::Error::custom("poll_rate_hz must be one of: 50, 60")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_ok!(config.validate());
        assert_eq!(config.ports.len(), 2);
        assert_eq!(config.ports[1].host_port, 1);
    }

    #[test]
    fn test_empty_toml_matches_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[general]
keep_awake = true
keep_awake_interval_s = 30

[[ports]]
host_port = 2
green_analog = true

[[ports]]
host_port = 0
default_analog = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert!(config.general.keep_awake);
        assert_eq!(config.general.keep_awake_interval_s, 30);
        assert_eq!(config.general.buffer_size, 9);
        assert_eq!(config.ports.len(), 2);
        assert_eq!(config.ports[0].default_mode(), PadMode::AnalogGreen);
        assert_eq!(config.ports[1].default_mode(), PadMode::Digital);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/dualshock-bridge.toml");
        match result {
            Err(crate::error::DualShockBridgeError::Io(_)) => {}
            other => panic!("Expected Io error, got: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml() {
        assert_err!(Config::from_toml("[general\npriority = true"));
    }

    #[test]
    fn test_no_ports() {
        let mut config = Config::default();
        config.ports.clear();
        assert_err!(config.validate());
    }

    #[test]
    fn test_too_many_ports() {
        let mut config = Config::default();
        config.ports = (0..5).map(|_| PortSettings::default()).collect();
        assert_err!(config.validate());
    }

    #[test]
    fn test_host_port_out_of_range() {
        let mut config = Config::default();
        config.ports[0].host_port = 4;
        assert_err!(config.validate());
    }

    #[test]
    fn test_shared_host_port_allowed() {
        let mut config = Config::default();
        config.ports[1].host_port = 0;
        assert_ok!(config.validate());
    }

    #[test]
    fn test_buffer_size_too_small() {
        let mut config = Config::default();
        config.general.buffer_size = 8;
        assert_err!(config.validate());
    }

    #[test]
    fn test_buffer_size_too_large() {
        let mut config = Config::default();
        config.general.buffer_size = 257;
        assert_err!(config.validate());
    }

    #[test]
    fn test_keep_awake_interval_zero() {
        let mut config = Config::default();
        config.general.keep_awake_interval_s = 0;
        assert_err!(config.validate());
    }

    #[test]
    fn test_invalid_poll_rate() {
        let mut config = Config::default();
        config.general.poll_rate_hz = 30;
        assert_err!(config.validate());
    }

    #[test]
    fn test_default_modes() {
        let mut settings = PortSettings::default();
        assert_eq!(settings.default_mode(), PadMode::AnalogRed);
        settings.green_analog = true;
        assert_eq!(settings.default_mode(), PadMode::AnalogGreen);
        settings.default_analog = false;
        assert_eq!(settings.default_mode(), PadMode::Digital);
        assert_eq!(settings.analog_mode(), PadMode::AnalogGreen);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_keep_awake_interval_s(), 50);
        assert_eq!(default_buffer_size(), 9);
        assert_eq!(default_poll_rate_hz(), 60);
        assert!(default_default_analog());
    }
}
