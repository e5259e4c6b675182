//! Control loop: wait for boot, then probe, decide, render and actuate forever

use crate::actuator::FanDriver;
use crate::config::DaemonConfig;
use crate::display::{StatusDisplay, StatusFrame};
use crate::policy::{FanDecision, FanMode, ThermalPolicy};
use crate::probe::{NetworkStatus, SystemProbe, TemperatureReading, UptimeReading};
use log::{debug, info, warn};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Everything learned in one pass over the probes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub uptime: Option<UptimeReading>,
    pub network: NetworkStatus,
    pub temperatures: Option<TemperatureReading>,
    pub decision: Option<FanDecision>,
}

impl CycleReport {
    pub fn frame(&self) -> StatusFrame {
        StatusFrame::render(
            self.uptime.as_ref(),
            self.network,
            self.decision.as_ref(),
            self.temperatures.as_ref(),
        )
    }
}

/// Sample every probe once and decide the fan mode.
///
/// Temperature is read a single time; the same reading feeds the policy and
/// the display.
pub async fn sample<P: SystemProbe>(
    probe: &P,
    policy: &ThermalPolicy,
    previous: Option<FanMode>,
) -> CycleReport {
    let uptime = probe.uptime().await;
    let temperatures = probe.temperatures().await;
    let network = probe.network().await;
    let decision = temperatures
        .as_ref()
        .map(|reading| policy.decide_from(reading, previous));

    CycleReport {
        uptime,
        network,
        temperatures,
        decision,
    }
}

/// How the boot wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootOutcome {
    /// Number of readiness polls made, including the successful one
    pub polls: u32,
    /// False when `max_polls` ran out first
    pub booted: bool,
}

/// Timing knobs of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub poll_interval: Duration,
    pub boot_interval: Duration,
    pub max_boot_polls: Option<u32>,
}

impl From<&DaemonConfig> for LoopTiming {
    fn from(config: &DaemonConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            boot_interval: config.boot_interval(),
            max_boot_polls: config.boot.max_polls,
        }
    }
}

/// Owns the probe, the fan and the display for the life of the daemon
pub struct ControlLoop<P, F, D> {
    probe: P,
    fan: F,
    display: D,
    policy: ThermalPolicy,
    timing: LoopTiming,
    last_mode: Option<FanMode>,
}

impl<P, F, D> ControlLoop<P, F, D>
where
    P: SystemProbe,
    F: FanDriver,
    D: StatusDisplay,
{
    pub fn new(probe: P, fan: F, display: D, policy: ThermalPolicy, timing: LoopTiming) -> Self {
        Self {
            probe,
            fan,
            display,
            policy,
            timing,
            last_mode: None,
        }
    }

    /// Mode applied in the most recent cycle that had a temperature
    pub fn last_mode(&self) -> Option<FanMode> {
        self.last_mode
    }

    /// Poll boot readiness, animating the splash between polls
    pub async fn wait_for_boot(&mut self) -> BootOutcome {
        let mut polls = 0;
        let mut frame = 0;

        loop {
            polls += 1;
            if self.probe.is_booted().await {
                info!("System booted after {} poll(s)", polls);
                return BootOutcome {
                    polls,
                    booted: true,
                };
            }

            if let Some(max) = self.timing.max_boot_polls {
                if polls >= max {
                    warn!(
                        "System still not running after {} polls, starting fan control anyway",
                        polls
                    );
                    return BootOutcome {
                        polls,
                        booted: false,
                    };
                }
            }

            frame = frame % 3 + 1;
            if let Err(e) = self.display.show_boot_frame(frame) {
                warn!("Failed to draw boot frame: {}", e);
            }
            sleep(self.timing.boot_interval).await;
        }
    }

    /// One sense, decide, render, actuate pass
    pub async fn run_cycle(&mut self) -> CycleReport {
        let report = sample(&self.probe, &self.policy, self.last_mode).await;
        debug!("Cycle: {:?}", report);

        if let Err(e) = self.display.show_status(&report.frame()) {
            warn!("Failed to render status: {}", e);
        }

        match &report.decision {
            Some(decision) => {
                if self.last_mode != Some(decision.mode) {
                    info!(
                        "Fan mode {} at {:.1}°C (speed {:.1})",
                        decision.mode, decision.max_temp, decision.speed
                    );
                }
                self.fan.apply(decision);
                self.last_mode = Some(decision.mode);
            }
            None => {
                warn!("No temperature reading, keeping the fan as it is");
            }
        }

        report
    }

    /// Run until `shutdown` resolves, then stop the fan and blank the screen
    pub async fn run<S>(&mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        info!("Starting temperature manager");
        tokio::pin!(shutdown);

        let boot = tokio::select! {
            outcome = self.wait_for_boot() => Some(outcome),
            _ = &mut shutdown => None,
        };

        if boot.is_some() {
            info!(
                "Controlling fan every {}s",
                self.timing.poll_interval.as_secs()
            );
            loop {
                self.run_cycle().await;

                let stop = tokio::select! {
                    _ = sleep(self.timing.poll_interval) => false,
                    _ = &mut shutdown => true,
                };
                if stop {
                    break;
                }
            }
        }

        self.shutdown();
    }

    fn shutdown(&mut self) {
        info!("Shutting down, stopping fan");
        self.fan.stop();
        if let Err(e) = self.display.clear() {
            warn!("Failed to clear display: {}", e);
        }
    }

    /// Give back the peripherals
    pub fn into_parts(self) -> (P, F, D) {
        (self.probe, self.fan, self.display)
    }
}
