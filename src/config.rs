//! Daemon configuration
//!
//! Loaded from a JSON file. Every field has a default so a partial file (or no
//! file at all) yields a working Raspberry Pi setup.

use crate::errors::{Result, TempManagerError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/temp-manager/config.json";

/// Default directory holding the boot logo
pub const DEFAULT_ASSET_DIR: &str = "/usr/local/share/temp_manager";

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Seconds between control cycles once the system is running
    pub poll_interval_secs: u64,
    pub boot: BootConfig,
    pub probe: ProbeConfig,
    pub policy: PolicyConfig,
    pub fan: FanConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Seconds between boot readiness polls
    pub poll_interval_secs: u64,
    /// Give up waiting after this many polls. `None` waits forever.
    pub max_polls: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub firmware_temp_command: CommandSpec,
    pub thermal_zone_path: PathBuf,
    pub uptime_command: CommandSpec,
    pub boot_state_command: CommandSpec,
    pub ping_program: String,
    pub ping_target: String,
    pub ping_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Dead-zone below a band's lower bound before dropping out of it
    pub hysteresis_celsius: f32,
}

/// BCM pin numbers of the H-bridge motor driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub forward_pin: u8,
    pub backward_pin: u8,
    pub standby_pin: u8,
    pub pwm_frequency_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontChoice {
    Small,
    Regular,
    Large,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub i2c_bus: u8,
    pub address: u8,
    pub asset_dir: PathBuf,
    pub logo_file: String,
    pub font: FontChoice,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            boot: BootConfig::default(),
            probe: ProbeConfig::default(),
            policy: PolicyConfig::default(),
            fan: FanConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            max_polls: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            firmware_temp_command: CommandSpec::new("vcgencmd", &["measure_temp"]),
            thermal_zone_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            uptime_command: CommandSpec::new("uptime", &["-p"]),
            boot_state_command: CommandSpec::new("systemctl", &["is-system-running"]),
            ping_program: "ping".to_string(),
            ping_target: "8.8.8.8".to_string(),
            ping_timeout_secs: 2,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            hysteresis_celsius: 0.0,
        }
    }
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            forward_pin: 12,
            backward_pin: 13,
            standby_pin: 22,
            pwm_frequency_hz: 100.0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x3c,
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            logo_file: "raspberrypi_logo_inverted.bmp".to_string(),
            font: FontChoice::Regular,
        }
    }
}

impl DisplayConfig {
    pub fn logo_path(&self) -> PathBuf {
        self.asset_dir.join(&self.logo_file)
    }
}

impl DaemonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn boot_interval(&self) -> Duration {
        Duration::from_secs(self.boot.poll_interval_secs)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: DaemonConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file at `path`, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::load_from_file(path).map_err(|e| {
                TempManagerError::Config(format!("Failed to load {}: {}", path.display(), e))
            })?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(TempManagerError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.boot.poll_interval_secs == 0 {
            return Err(TempManagerError::Config(
                "boot.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.probe.ping_timeout_secs == 0 {
            return Err(TempManagerError::Config(
                "probe.ping_timeout_secs must be at least 1".to_string(),
            ));
        }

        let hysteresis = self.policy.hysteresis_celsius;
        if !hysteresis.is_finite() || hysteresis < 0.0 {
            return Err(TempManagerError::Config(format!(
                "policy.hysteresis_celsius must be a non-negative number, got {}",
                hysteresis
            )));
        }

        let fan = &self.fan;
        if fan.forward_pin == fan.backward_pin
            || fan.forward_pin == fan.standby_pin
            || fan.backward_pin == fan.standby_pin
        {
            return Err(TempManagerError::Config(format!(
                "fan pins must be distinct (forward {}, backward {}, standby {})",
                fan.forward_pin, fan.backward_pin, fan.standby_pin
            )));
        }
        if !(fan.pwm_frequency_hz.is_finite() && fan.pwm_frequency_hz > 0.0) {
            return Err(TempManagerError::Config(format!(
                "fan.pwm_frequency_hz must be positive, got {}",
                fan.pwm_frequency_hz
            )));
        }

        Ok(())
    }
}
