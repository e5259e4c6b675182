//! Read-only queries against the OS, the Pi firmware and the network.
//!
//! Each query fails independently. A failure never produces partial data:
//! the caller gets `None` (or `NetworkStatus::Down`) and the cause is logged.

mod linux;
pub mod parse;

pub use linux::LinuxProbe;

use serde::Serialize;
use std::fmt;

/// CPU and GPU temperature sampled together
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub cpu_celsius: f32,
    pub gpu_celsius: f32,
}

impl TemperatureReading {
    pub fn new(cpu_celsius: f32, gpu_celsius: f32) -> Self {
        Self {
            cpu_celsius,
            gpu_celsius,
        }
    }

    /// The hotter of the two sensors
    pub fn max(&self) -> f32 {
        self.cpu_celsius.max(self.gpu_celsius)
    }
}

/// System uptime split into whole units
///
/// Hours and minutes are whatever the OS reported; they are not normalised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UptimeReading {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkStatus {
    Up,
    Down,
}

impl NetworkStatus {
    /// Map a process exit code to a status. Only a clean exit counts as up.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => NetworkStatus::Up,
            _ => NetworkStatus::Down,
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkStatus::Up => write!(f, "UP"),
            NetworkStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// Source of every reading the control loop needs
#[allow(async_fn_in_trait)]
pub trait SystemProbe {
    /// Both temperatures, or `None` if either one could not be read
    async fn temperatures(&self) -> Option<TemperatureReading>;

    /// Uptime, or `None` if the uptime query itself failed
    async fn uptime(&self) -> Option<UptimeReading>;

    /// Reachability of the configured external address
    async fn network(&self) -> NetworkStatus;

    /// True once the init system reports it is fully running
    async fn is_booted(&self) -> bool;
}
