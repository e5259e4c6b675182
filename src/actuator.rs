//! H-bridge fan driver
//!
//! The fan hangs off one channel of a TB6612-style driver: two direction
//! inputs plus a standby line. Forward is the only direction used, so the
//! reverse input is held low and speed is the PWM duty on the forward input.

use crate::errors::{Result, TempManagerError};
use crate::policy::FanDecision;
use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

/// Anything that can turn a [`FanDecision`] into motor output
pub trait FanDriver {
    /// Drive the fan as decided. Faults are logged, not returned.
    fn apply(&mut self, decision: &FanDecision);

    /// Cut power to the fan
    fn stop(&mut self);
}

/// Fan on one H-bridge channel
pub struct HBridgeFan<EN, FWD, REV> {
    standby: EN,
    forward: FWD,
    backward: REV,
    applied: Option<(bool, u16)>,
}

impl<EN, FWD, REV> HBridgeFan<EN, FWD, REV>
where
    EN: OutputPin,
    FWD: SetDutyCycle,
    REV: OutputPin,
{
    pub fn new(standby: EN, forward: FWD, backward: REV) -> Self {
        Self {
            standby,
            forward,
            backward,
            applied: None,
        }
    }

    /// Last (standby released, forward duty) written to the hardware
    pub fn applied(&self) -> Option<(bool, u16)> {
        self.applied
    }

    /// Convert a normalized speed into the PWM's duty range
    fn duty_for(&self, speed: f32) -> u16 {
        let max = self.forward.max_duty_cycle();
        (speed.clamp(0.0, 1.0) * max as f32).round() as u16
    }

    fn drive(&mut self, active: bool, duty: u16) -> Result<()> {
        self.standby
            .set_state(PinState::from(active))
            .map_err(|e| TempManagerError::Hardware(format!("standby pin: {:?}", e)))?;
        self.backward
            .set_low()
            .map_err(|e| TempManagerError::Hardware(format!("reverse input: {:?}", e)))?;
        self.forward
            .set_duty_cycle(duty)
            .map_err(|e| TempManagerError::Hardware(format!("forward PWM: {:?}", e)))?;

        self.applied = Some((active, duty));
        Ok(())
    }

    /// Release the pins
    pub fn release(self) -> (EN, FWD, REV) {
        (self.standby, self.forward, self.backward)
    }
}

impl<EN, FWD, REV> FanDriver for HBridgeFan<EN, FWD, REV>
where
    EN: OutputPin,
    FWD: SetDutyCycle,
    REV: OutputPin,
{
    fn apply(&mut self, decision: &FanDecision) {
        let duty = self.duty_for(decision.speed);
        debug!(
            "Fan {} -> standby {}, duty {}/{}",
            decision.mode,
            if decision.active { "released" } else { "asserted" },
            duty,
            self.forward.max_duty_cycle()
        );

        if let Err(e) = self.drive(decision.active, duty) {
            warn!("Failed to drive fan in {} mode: {}", decision.mode, e);
        }
    }

    fn stop(&mut self) {
        if let Err(e) = self.drive(false, 0) {
            warn!("Failed to stop fan: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ThermalPolicy;
    use crate::probe::TemperatureReading;
    use std::convert::Infallible;

    #[derive(Debug, Default)]
    struct MockPin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> std::result::Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> std::result::Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct MockPwm {
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> std::result::Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    fn fan() -> HBridgeFan<MockPin, MockPwm, MockPin> {
        HBridgeFan::new(MockPin::default(), MockPwm::default(), MockPin::default())
    }

    fn decision_at(t: f32) -> FanDecision {
        ThermalPolicy::default().decide(&TemperatureReading::new(t, t))
    }

    #[test]
    fn test_quiet_asserts_standby() {
        let mut fan = fan();
        fan.apply(&decision_at(30.0));

        let (standby, forward, backward) = fan.release();
        assert!(!standby.high);
        assert_eq!(forward.duty, 0);
        assert!(!backward.high);
    }

    #[test]
    fn test_active_modes_drive_forward() {
        let mut fan = fan();

        fan.apply(&decision_at(42.0));
        assert_eq!(fan.applied(), Some((true, 300)));

        fan.apply(&decision_at(50.0));
        assert_eq!(fan.applied(), Some((true, 600)));

        fan.apply(&decision_at(85.0));
        let (standby, forward, backward) = fan.release();
        assert!(standby.high);
        assert_eq!(forward.duty, 1000);
        assert!(!backward.high, "reverse input must stay low");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let decision = decision_at(50.0);

        let mut once = fan();
        once.apply(&decision);

        let mut twice = fan();
        twice.apply(&decision);
        twice.apply(&decision);

        assert_eq!(once.applied(), twice.applied());
        let (a_en, a_fwd, a_rev) = once.release();
        let (b_en, b_fwd, b_rev) = twice.release();
        assert_eq!(a_en.high, b_en.high);
        assert_eq!(a_fwd.duty, b_fwd.duty);
        assert_eq!(a_rev.high, b_rev.high);
    }

    #[test]
    fn test_stop_cuts_power() {
        let mut fan = fan();
        fan.apply(&decision_at(70.0));
        fan.stop();

        assert_eq!(fan.applied(), Some((false, 0)));
    }
}
