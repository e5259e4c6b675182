use super::{parse, NetworkStatus, SystemProbe, TemperatureReading, UptimeReading};
use crate::config::{CommandSpec, ProbeConfig};
use crate::errors::{Result, TempManagerError};
use log::{debug, warn};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Probe backed by Raspberry Pi OS commands and sysfs
pub struct LinuxProbe {
    config: ProbeConfig,
}

impl LinuxProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Run a command to completion and return its stdout.
    ///
    /// A non-zero exit status is an error, as is failing to spawn it at all.
    async fn run(spec: &CommandSpec) -> Result<String> {
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TempManagerError::Command {
                program: spec.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(TempManagerError::Command {
                program: spec.program.clone(),
                reason: format!("exited with {}", output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn read_gpu_temperature(&self) -> Result<f32> {
        let output = Self::run(&self.config.firmware_temp_command).await?;
        parse::firmware_temperature(&output)
    }

    async fn read_cpu_temperature(&self) -> Result<f32> {
        let raw = tokio::fs::read_to_string(&self.config.thermal_zone_path).await?;
        parse::thermal_zone_temperature(&raw)
    }

    async fn read_temperatures(&self) -> Result<TemperatureReading> {
        let gpu = self.read_gpu_temperature().await?;
        let cpu = self.read_cpu_temperature().await?;
        Ok(TemperatureReading::new(cpu, gpu))
    }
}

impl SystemProbe for LinuxProbe {
    async fn temperatures(&self) -> Option<TemperatureReading> {
        match self.read_temperatures().await {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("Temperature unavailable: {}", e);
                None
            }
        }
    }

    async fn uptime(&self) -> Option<UptimeReading> {
        match Self::run(&self.config.uptime_command).await {
            Ok(output) => Some(parse::uptime(&output)),
            Err(e) => {
                warn!("Uptime unavailable: {}", e);
                None
            }
        }
    }

    async fn network(&self) -> NetworkStatus {
        let wait = self.config.ping_timeout_secs;
        let wait_arg = wait.to_string();
        let ping = Command::new(&self.config.ping_program)
            .args([
                "-c",
                "1",
                "-W",
                wait_arg.as_str(),
                self.config.ping_target.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        // ping enforces its own deadline; this only guards against a wedged process
        match timeout(Duration::from_secs(wait.saturating_add(1)), ping).await {
            Ok(Ok(status)) => NetworkStatus::from_exit_code(status.code()),
            Ok(Err(e)) => {
                debug!("Could not run {}: {}", self.config.ping_program, e);
                NetworkStatus::Down
            }
            Err(_) => {
                debug!("{} did not finish in time", self.config.ping_program);
                NetworkStatus::Down
            }
        }
    }

    async fn is_booted(&self) -> bool {
        match Self::run(&self.config.boot_state_command).await {
            Ok(output) => parse::is_running_state(&output),
            Err(e) => {
                // systemctl exits non-zero while starting or degraded
                debug!("Boot state query: {}", e);
                false
            }
        }
    }
}
