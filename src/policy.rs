//! Temperature to fan mode policy
//!
//! A fixed five-band lookup on the hotter of the CPU and GPU temperatures.
//! Bands are half-open, `[lower, next lower)`, so a reading exactly on a
//! boundary selects the higher band.

use crate::probe::TemperatureReading;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FanMode {
    Quiet,
    Echo,
    Airing,
    Turbo,
    Overheat,
}

/// Bands ordered from coolest to hottest: (lower bound °C, mode)
const BANDS: [(f32, FanMode); 5] = [
    (f32::NEG_INFINITY, FanMode::Quiet),
    (40.0, FanMode::Echo),
    (45.0, FanMode::Airing),
    (60.0, FanMode::Turbo),
    (80.0, FanMode::Overheat),
];

impl FanMode {
    /// Normalized duty cycle for this mode
    pub fn speed(self) -> f32 {
        match self {
            FanMode::Quiet => 0.0,
            FanMode::Echo => 0.3,
            FanMode::Airing => 0.6,
            FanMode::Turbo | FanMode::Overheat => 1.0,
        }
    }

    /// Whether the motor driver's standby line is released
    pub fn active(self) -> bool {
        !matches!(self, FanMode::Quiet)
    }

    /// Lowest temperature that selects this mode
    pub fn lower_bound(self) -> f32 {
        BANDS
            .iter()
            .find(|(_, mode)| *mode == self)
            .map(|(bound, _)| *bound)
            .unwrap_or(f32::NEG_INFINITY)
    }

    /// Band lookup for a single temperature
    pub fn for_temperature(celsius: f32) -> FanMode {
        BANDS
            .iter()
            .rev()
            .find(|(bound, _)| celsius >= *bound)
            .map(|(_, mode)| *mode)
            .unwrap_or(FanMode::Quiet)
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FanMode::Quiet => "QUIET",
            FanMode::Echo => "ECHO",
            FanMode::Airing => "AIRING",
            FanMode::Turbo => "TURBO",
            FanMode::Overheat => "OVERHEAT",
        };
        f.write_str(name)
    }
}

/// What the actuator should do this cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FanDecision {
    pub mode: FanMode,
    pub speed: f32,
    pub max_temp: f32,
    pub active: bool,
}

impl FanDecision {
    fn new(mode: FanMode, max_temp: f32) -> Self {
        Self {
            mode,
            speed: mode.speed(),
            max_temp,
            active: mode.active(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalPolicy {
    hysteresis_celsius: f32,
}

impl ThermalPolicy {
    /// `hysteresis_celsius` of zero gives the plain band lookup
    pub fn new(hysteresis_celsius: f32) -> Self {
        Self {
            hysteresis_celsius: hysteresis_celsius.max(0.0),
        }
    }

    /// Stateless decision: depends only on `max(cpu, gpu)`
    pub fn decide(&self, reading: &TemperatureReading) -> FanDecision {
        let max_temp = reading.max();
        FanDecision::new(FanMode::for_temperature(max_temp), max_temp)
    }

    /// Decision that keeps a hotter `previous` mode until the temperature
    /// drops more than the hysteresis below that mode's lower bound.
    pub fn decide_from(
        &self,
        reading: &TemperatureReading,
        previous: Option<FanMode>,
    ) -> FanDecision {
        let decision = self.decide(reading);

        match previous {
            Some(prev)
                if self.hysteresis_celsius > 0.0
                    && prev > decision.mode
                    && decision.max_temp >= prev.lower_bound() - self.hysteresis_celsius =>
            {
                FanDecision::new(prev, decision.max_temp)
            }
            _ => decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide_at(t: f32) -> FanDecision {
        ThermalPolicy::default().decide(&TemperatureReading::new(t, t))
    }

    #[test]
    fn test_band_selection() {
        let cases = [
            (-10.0, FanMode::Quiet),
            (39.9, FanMode::Quiet),
            (40.0, FanMode::Echo),
            (44.9, FanMode::Echo),
            (45.0, FanMode::Airing),
            (59.9, FanMode::Airing),
            (60.0, FanMode::Turbo),
            (79.9, FanMode::Turbo),
            (80.0, FanMode::Overheat),
            (120.0, FanMode::Overheat),
        ];

        for (temp, expected) in cases {
            assert_eq!(decide_at(temp).mode, expected, "at {}°C", temp);
        }
    }

    #[test]
    fn test_mode_outputs() {
        let quiet = decide_at(30.0);
        assert_eq!(quiet.speed, 0.0);
        assert!(!quiet.active);

        let echo = decide_at(42.0);
        assert_eq!(echo.speed, 0.3);
        assert!(echo.active);

        let airing = decide_at(50.0);
        assert_eq!(airing.speed, 0.6);
        assert!(airing.active);

        assert_eq!(decide_at(70.0).speed, 1.0);
        assert_eq!(decide_at(90.0).speed, 1.0);
        assert!(decide_at(90.0).active);
    }

    #[test]
    fn test_uses_hotter_sensor() {
        let policy = ThermalPolicy::default();

        let gpu_hot = policy.decide(&TemperatureReading::new(38.0, 61.5));
        assert_eq!(gpu_hot.mode, FanMode::Turbo);
        assert_eq!(gpu_hot.max_temp, 61.5);

        let cpu_hot = policy.decide(&TemperatureReading::new(61.5, 38.0));
        assert_eq!(cpu_hot, gpu_hot);
    }

    #[test]
    fn test_no_hysteresis_by_default() {
        let policy = ThermalPolicy::default();
        let above = TemperatureReading::new(45.0, 45.0);
        let below = TemperatureReading::new(44.9, 44.9);

        // Oscillating around a boundary flips the mode every time
        let mut previous = None;
        for (reading, expected) in [
            (above, FanMode::Airing),
            (below, FanMode::Echo),
            (above, FanMode::Airing),
            (below, FanMode::Echo),
        ] {
            let decision = policy.decide_from(&reading, previous);
            assert_eq!(decision.mode, expected);
            previous = Some(decision.mode);
        }
    }

    #[test]
    fn test_hysteresis_holds_higher_mode() {
        let policy = ThermalPolicy::new(2.0);

        let held = policy.decide_from(&TemperatureReading::new(43.5, 43.0), Some(FanMode::Airing));
        assert_eq!(held.mode, FanMode::Airing);
        assert_eq!(held.speed, 0.6);
        assert_eq!(held.max_temp, 43.5);

        let dropped =
            policy.decide_from(&TemperatureReading::new(42.9, 42.0), Some(FanMode::Airing));
        assert_eq!(dropped.mode, FanMode::Echo);

        // Rising is never delayed
        let rising = policy.decide_from(&TemperatureReading::new(60.0, 50.0), Some(FanMode::Echo));
        assert_eq!(rising.mode, FanMode::Turbo);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(FanMode::Quiet.to_string(), "QUIET");
        assert_eq!(FanMode::Overheat.to_string(), "OVERHEAT");
    }

    #[test]
    fn test_lower_bounds() {
        assert_eq!(FanMode::Quiet.lower_bound(), f32::NEG_INFINITY);
        assert_eq!(FanMode::Echo.lower_bound(), 40.0);
        assert_eq!(FanMode::Overheat.lower_bound(), 80.0);
    }
}
