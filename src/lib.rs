//! Raspberry Pi Temperature Manager
//!
//! Reads CPU/GPU temperature, picks a fan mode, drives the fan through an
//! H-bridge and shows uptime, network and temperature on an SSD1306 OLED.

pub mod actuator;
pub mod args;
pub mod config;
pub mod daemon;
pub mod display;
pub mod errors;
#[cfg(feature = "rpi")]
pub mod hardware;
pub mod logging;
pub mod policy;
pub mod probe;

// Re-export commonly used types
pub use config::DaemonConfig;
pub use daemon::{ControlLoop, CycleReport};
pub use errors::{Result, TempManagerError};
pub use policy::{FanDecision, FanMode, ThermalPolicy};
pub use probe::{LinuxProbe, NetworkStatus, SystemProbe, TemperatureReading, UptimeReading};
