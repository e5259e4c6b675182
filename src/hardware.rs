//! Raspberry Pi peripherals: GPIO for the H-bridge, I2C for the SSD1306

use crate::actuator::HBridgeFan;
use crate::config::{DaemonConfig, FanConfig};
use crate::display::{BootSplash, OledDisplay, Panel, StatusDisplay};
use crate::errors::{Result, TempManagerError};
use embedded_graphics::prelude::DrawTarget;
use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use log::info;
use rppal::gpio::{self, Gpio, OutputPin};
use rppal::i2c::I2c;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

/// Duty resolution exposed by [`SoftPwmPin`]
const SOFT_PWM_STEPS: u16 = 1000;

/// Error from the software PWM pin
#[derive(Debug)]
pub struct SoftPwmError(gpio::Error);

impl embedded_hal::pwm::Error for SoftPwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// GPIO output driven with rppal's software PWM
pub struct SoftPwmPin {
    pin: OutputPin,
    frequency_hz: f64,
}

impl SoftPwmPin {
    pub fn new(pin: OutputPin, frequency_hz: f64) -> Self {
        Self { pin, frequency_hz }
    }
}

impl ErrorType for SoftPwmPin {
    type Error = SoftPwmError;
}

impl SetDutyCycle for SoftPwmPin {
    fn max_duty_cycle(&self) -> u16 {
        SOFT_PWM_STEPS
    }

    fn set_duty_cycle(&mut self, duty: u16) -> std::result::Result<(), Self::Error> {
        if duty == 0 {
            self.pin.clear_pwm().map_err(SoftPwmError)?;
            self.pin.set_low();
            return Ok(());
        }

        let fraction = f64::from(duty.min(SOFT_PWM_STEPS)) / f64::from(SOFT_PWM_STEPS);
        self.pin
            .set_pwm_frequency(self.frequency_hz, fraction)
            .map_err(SoftPwmError)
    }
}

pub type PiFan = HBridgeFan<OutputPin, SoftPwmPin, OutputPin>;

pub type PiPanel =
    Ssd1306<I2CInterface<I2c>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

impl Panel for PiPanel {
    fn flush(&mut self) -> std::result::Result<(), <Self as DrawTarget>::Error> {
        PiPanel::flush(self)
    }
}

fn gpio_error(what: &str, e: gpio::Error) -> TempManagerError {
    TempManagerError::Hardware(format!("{}: {}", what, e))
}

/// Claim the motor driver pins. Standby starts asserted so the fan is off.
pub fn open_fan(config: &FanConfig) -> Result<PiFan> {
    let gpio = Gpio::new().map_err(|e| gpio_error("GPIO", e))?;
    let claim = |pin: u8| -> Result<OutputPin> {
        gpio.get(pin)
            .map(|p| p.into_output_low())
            .map_err(|e| gpio_error(&format!("GPIO {}", pin), e))
    };

    let standby = claim(config.standby_pin)?;
    let forward = SoftPwmPin::new(claim(config.forward_pin)?, config.pwm_frequency_hz);
    let backward = claim(config.backward_pin)?;

    info!(
        "Fan driver on GPIO {} (forward), {} (reverse), {} (standby)",
        config.forward_pin, config.backward_pin, config.standby_pin
    );
    Ok(HBridgeFan::new(standby, forward, backward))
}

/// Open and initialise the SSD1306, showing a blank screen
pub fn open_display(config: &DaemonConfig, splash: BootSplash) -> Result<OledDisplay<PiPanel>> {
    let display_config = &config.display;
    let i2c = I2c::with_bus(display_config.i2c_bus).map_err(|e| {
        TempManagerError::Hardware(format!("I2C bus {}: {}", display_config.i2c_bus, e))
    })?;

    let interface = I2CDisplayInterface::new_custom_address(i2c, display_config.address);
    let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    panel
        .init()
        .map_err(|e| TempManagerError::Display(format!("SSD1306 init: {:?}", e)))?;

    info!(
        "SSD1306 display on I2C bus {} at {:#04x}",
        display_config.i2c_bus, display_config.address
    );

    let mut display = OledDisplay::new(panel, display_config.font).with_splash(splash);
    display.clear()?;
    Ok(display)
}
