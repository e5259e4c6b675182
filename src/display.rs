//! Status screen for the 128x64 monochrome OLED
//!
//! [`StatusFrame::render`] turns the latest readings into positioned text;
//! [`OledDisplay`] clears the panel and draws a frame (or a boot splash) on
//! anything that implements [`Panel`].

use crate::config::FontChoice;
use crate::errors::{Result, TempManagerError};
use crate::policy::FanDecision;
use crate::probe::{NetworkStatus, TemperatureReading, UptimeReading};
use embedded_graphics::image::Image;
use embedded_graphics::mono_font::{iso_8859_1, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use log::info;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use tinybmp::Bmp;

/// Vertical distance between status rows
pub const LINE_PITCH: i32 = 12;

/// X offset of the GPU column
const RIGHT_COLUMN: i32 = 64;

/// Where the boot logo's top-left corner goes
const LOGO_ORIGIN: Point = Point::new(48, 8);

/// Largest logo that stays clear of the boot dots
const LOGO_MAX_SIZE: Size = Size::new(32, 32);

const BOOT_DOTS_Y: i32 = 42;

/// Shown in place of any reading that could not be taken
pub const UNAVAILABLE: &str = "N/A";

/// One piece of text at a fixed position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

impl TextLine {
    fn new(x: i32, y: i32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

/// A complete status screen, ready to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFrame {
    pub lines: Vec<TextLine>,
}

impl StatusFrame {
    pub fn render(
        uptime: Option<&UptimeReading>,
        network: NetworkStatus,
        decision: Option<&FanDecision>,
        temperatures: Option<&TemperatureReading>,
    ) -> Self {
        let uptime = match uptime {
            Some(u) => format!("Up: {}d {}h {}m", u.days, u.hours, u.minutes),
            None => format!("Up: {}", UNAVAILABLE),
        };
        let fan = match decision {
            Some(d) => format!("Fan: {}", d.mode),
            None => format!("Fan: {}", UNAVAILABLE),
        };
        let (cpu, gpu) = match temperatures {
            Some(t) => (celsius(t.cpu_celsius), celsius(t.gpu_celsius)),
            None => (UNAVAILABLE.to_string(), UNAVAILABLE.to_string()),
        };

        Self {
            lines: vec![
                TextLine::new(0, 0, uptime),
                TextLine::new(0, LINE_PITCH, format!("Network: {}", network)),
                TextLine::new(0, 2 * LINE_PITCH, fan),
                TextLine::new(0, 3 * LINE_PITCH, "CPU: "),
                TextLine::new(RIGHT_COLUMN, 3 * LINE_PITCH, "GPU: "),
                TextLine::new(0, 4 * LINE_PITCH, cpu),
                TextLine::new(RIGHT_COLUMN, 4 * LINE_PITCH, gpu),
            ],
        }
    }

    /// Text of every line, top to bottom
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }
}

fn celsius(value: f32) -> String {
    format!("{:.1}°C", value)
}

/// Something the status screen can be drawn on
pub trait StatusDisplay {
    /// Boot animation frame with `dots` loading dots (1 to 3)
    fn show_boot_frame(&mut self, dots: usize) -> Result<()>;

    /// Replace whatever is on screen with `frame`
    fn show_status(&mut self, frame: &StatusFrame) -> Result<()>;

    /// Blank the screen
    fn clear(&mut self) -> Result<()>;
}

/// A monochrome draw target whose pixels only appear after `flush`
pub trait Panel: DrawTarget<Color = BinaryColor> {
    fn flush(&mut self) -> std::result::Result<(), Self::Error>;
}

/// Boot logo bitmap, validated when loaded
pub struct BootSplash {
    logo: Vec<u8>,
}

impl BootSplash {
    /// Read the logo from disk. A missing or unreadable logo is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TempManagerError::AssetMissing {
                path: path.to_path_buf(),
            });
        }

        let logo = fs::read(path)?;
        let size = Self::parse(&logo)
            .map_err(|reason| TempManagerError::InvalidLogo {
                path: path.to_path_buf(),
                reason,
            })?
            .size();

        if size.width > LOGO_MAX_SIZE.width || size.height > LOGO_MAX_SIZE.height {
            return Err(TempManagerError::InvalidLogo {
                path: path.to_path_buf(),
                reason: format!(
                    "{}x{} does not fit in {}x{}",
                    size.width, size.height, LOGO_MAX_SIZE.width, LOGO_MAX_SIZE.height
                ),
            });
        }

        info!(
            "Loaded boot logo {} ({}x{})",
            path.display(),
            size.width,
            size.height
        );
        Ok(Self { logo })
    }

    /// Decode with the palette resolved and colours reduced to on/off by brightness
    fn parse(logo: &[u8]) -> std::result::Result<Bmp<'_, BinaryColor>, String> {
        Bmp::from_slice(logo).map_err(|e| format!("{:?}", e))
    }

    fn draw<D>(&self, target: &mut D) -> Result<()>
    where
        D: Panel,
        D::Error: Debug,
    {
        let bmp = Self::parse(&self.logo)
            .map_err(|reason| TempManagerError::Display(format!("boot logo: {}", reason)))?;

        Image::new(&bmp, LOGO_ORIGIN)
            .draw(target)
            .map_err(display_error)
    }
}

fn display_error<E: Debug>(e: E) -> TempManagerError {
    TempManagerError::Display(format!("{:?}", e))
}

fn font_for(choice: FontChoice) -> &'static MonoFont<'static> {
    // ISO 8859-1 for the degree sign
    match choice {
        FontChoice::Small => &iso_8859_1::FONT_6X10,
        FontChoice::Regular => &iso_8859_1::FONT_6X12,
        FontChoice::Large => &iso_8859_1::FONT_7X13,
    }
}

/// SSD1306-style display driven through embedded-graphics
pub struct OledDisplay<P> {
    panel: P,
    style: MonoTextStyle<'static, BinaryColor>,
    splash: Option<BootSplash>,
}

impl<P> OledDisplay<P>
where
    P: Panel,
    P::Error: Debug,
{
    pub fn new(panel: P, font: FontChoice) -> Self {
        Self {
            panel,
            style: MonoTextStyle::new(font_for(font), BinaryColor::On),
            splash: None,
        }
    }

    pub fn with_splash(mut self, splash: BootSplash) -> Self {
        self.splash = Some(splash);
        self
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<()> {
        Text::with_baseline(text, Point::new(x, y), self.style, Baseline::Top)
            .draw(&mut self.panel)
            .map_err(display_error)?;
        Ok(())
    }

    fn blank(&mut self) -> Result<()> {
        self.panel.clear(BinaryColor::Off).map_err(display_error)
    }
}

impl<P> StatusDisplay for OledDisplay<P>
where
    P: Panel,
    P::Error: Debug,
{
    fn show_boot_frame(&mut self, dots: usize) -> Result<()> {
        let dots = dots.clamp(1, 3);
        self.blank()?;

        if let Some(splash) = &self.splash {
            splash.draw(&mut self.panel)?;
        }

        let x = RIGHT_COLUMN - 4 * dots as i32;
        self.draw_text(x, BOOT_DOTS_Y, &".".repeat(dots))?;

        self.panel.flush().map_err(display_error)
    }

    fn show_status(&mut self, frame: &StatusFrame) -> Result<()> {
        self.blank()?;
        for line in &frame.lines {
            self.draw_text(line.x, line.y, &line.text)?;
        }
        self.panel.flush().map_err(display_error)
    }

    fn clear(&mut self) -> Result<()> {
        self.blank()?;
        self.panel.flush().map_err(display_error)
    }
}
