//! Parsers for the raw text produced by the OS and firmware queries

use super::UptimeReading;
use crate::errors::{Result, TempManagerError};
use regex::Regex;
use std::sync::OnceLock;

fn firmware_temp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"temp=(\d+\.\d+)").expect("valid firmware temp pattern"))
}

fn uptime_unit_re(unit: &str) -> Regex {
    Regex::new(&format!(r"(\d+)\s+{}s?", unit)).expect("valid uptime pattern")
}

fn uptime_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| [uptime_unit_re("day"), uptime_unit_re("hour"), uptime_unit_re("minute")])
}

/// Parse `vcgencmd measure_temp` output, e.g. `temp=48.3'C`
pub fn firmware_temperature(output: &str) -> Result<f32> {
    firmware_temp_re()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .filter(|t| t.is_finite())
        .ok_or_else(|| TempManagerError::parse("GPU temperature", output.trim()))
}

/// Parse a thermal zone value in millidegrees Celsius, e.g. `48312`
pub fn thermal_zone_temperature(raw: &str) -> Result<f32> {
    let millidegrees: f32 = raw
        .trim()
        .parse()
        .map_err(|_| TempManagerError::parse("CPU temperature", raw.trim()))?;

    let celsius = millidegrees / 1000.0;
    if !celsius.is_finite() {
        return Err(TempManagerError::parse("CPU temperature", raw.trim()));
    }
    Ok(celsius)
}

/// Parse `uptime -p` output, e.g. `up 3 days, 4 hours, 5 minutes`.
///
/// Units that do not appear count as zero, so this never fails.
pub fn uptime(pretty: &str) -> UptimeReading {
    let [day_re, hour_re, minute_re] = uptime_res();
    let unit = |re: &Regex| {
        re.captures(pretty)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };

    UptimeReading {
        days: unit(day_re),
        hours: unit(hour_re),
        minutes: unit(minute_re),
    }
}

/// `systemctl is-system-running` prints exactly `running` once boot completed
pub fn is_running_state(output: &str) -> bool {
    output.trim() == "running"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_temperature() {
        assert_eq!(firmware_temperature("temp=48.3'C\n").unwrap(), 48.3);
        assert_eq!(firmware_temperature("temp=100.0'C").unwrap(), 100.0);
    }

    #[test]
    fn test_malformed_firmware_output_is_rejected() {
        // Needs a decimal point, like the firmware always prints
        assert!(firmware_temperature("temp=48'C").is_err());
        assert!(firmware_temperature("VCHI initialization failed").is_err());
        assert!(firmware_temperature("").is_err());
    }

    #[test]
    fn test_thermal_zone_temperature() {
        assert_eq!(thermal_zone_temperature("48312\n").unwrap(), 48.312);
        assert_eq!(thermal_zone_temperature("0").unwrap(), 0.0);
        assert_eq!(thermal_zone_temperature("-5000").unwrap(), -5.0);
        assert!(thermal_zone_temperature("").is_err());
        assert!(thermal_zone_temperature("hot").is_err());
    }

    #[test]
    fn test_uptime_all_units() {
        assert_eq!(
            uptime("3 days, 4 hours, 5 minutes"),
            UptimeReading {
                days: 3,
                hours: 4,
                minutes: 5
            }
        );
        assert_eq!(
            uptime("up 1 day, 1 hour, 1 minute"),
            UptimeReading {
                days: 1,
                hours: 1,
                minutes: 1
            }
        );
    }

    #[test]
    fn test_uptime_missing_units_default_to_zero() {
        assert_eq!(
            uptime("up 2 hours"),
            UptimeReading {
                days: 0,
                hours: 2,
                minutes: 0
            }
        );
        assert_eq!(
            uptime("up 2 weeks, 12 minutes"),
            UptimeReading {
                days: 0,
                hours: 0,
                minutes: 12
            }
        );
        assert_eq!(uptime("up"), UptimeReading::default());
        assert_eq!(uptime(""), UptimeReading::default());
    }

    #[test]
    fn test_running_state() {
        assert!(is_running_state("running\n"));
        assert!(!is_running_state("starting"));
        assert!(!is_running_state("degraded"));
        assert!(!is_running_state("running-ish"));
    }
}
