//! Green and red indicator LEDs
//!
//! LED failures are logged and swallowed: a dead LED must never stop a game.

pub mod pin;

use std::fmt;
use std::thread;
use std::time::Duration;

use rppal::gpio::Gpio;
use tracing::{debug, error, info, warn};

use crate::config::LedConfig;
pub use pin::{GpioLed, LedError, LedPin, LogLed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedColor {
    Green,
    Red,
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => f.write_str("green"),
            Self::Red => f.write_str("red"),
        }
    }
}

/// One indicator with its output line
pub struct Led {
    color: LedColor,
    pin: Box<dyn LedPin>,
}

impl Led {
    pub fn new(color: LedColor, pin: Box<dyn LedPin>) -> Self {
        Self { color, pin }
    }

    pub fn set(&mut self, on: bool) {
        if let Err(e) = self.pin.set(on) {
            error!("Failed to switch {} LED {}: {}", self.color, if on { "on" } else { "off" }, e);
        }
    }

    /// Blinks `count` times spread evenly over `total`
    ///
    /// Each flash spends half its slot on and half off. A count of zero does
    /// nothing.
    pub fn flash(&mut self, count: u32, total: Duration) {
        if count == 0 {
            return;
        }

        let half = total / count / 2;
        debug!("Flashing {} LED {}x, {:?} on/off", self.color, count, half);
        for _ in 0..count {
            self.set(true);
            pause(half);
            self.set(false);
            pause(half);
        }
    }
}

/// The green/red pair used by the game
pub struct Leds {
    pub green: Led,
    pub red: Led,
}

impl Leds {
    /// Builds the pair and switches both off
    pub fn new(green: Box<dyn LedPin>, red: Box<dyn LedPin>) -> Self {
        let mut leds = Self {
            green: Led::new(LedColor::Green, green),
            red: Led::new(LedColor::Red, red),
        };
        leds.all_off();
        leds
    }

    /// Claims the configured GPIO lines, falling back to logging-only LEDs
    pub fn open(config: &LedConfig) -> Self {
        let gpio = match Gpio::new() {
            Ok(gpio) => Some(gpio),
            Err(e) => {
                warn!("GPIO unavailable ({}), LEDs will only be logged", e);
                None
            }
        };

        let green = open_pin(gpio.as_ref(), LedColor::Green, config.green_pin);
        let red = open_pin(gpio.as_ref(), LedColor::Red, config.red_pin);
        info!(
            "LEDs ready (green GPIO {}, red GPIO {})",
            config.green_pin, config.red_pin
        );
        Self::new(green, red)
    }

    pub fn get_mut(&mut self, color: LedColor) -> &mut Led {
        match color {
            LedColor::Green => &mut self.green,
            LedColor::Red => &mut self.red,
        }
    }

    pub fn all_off(&mut self) {
        self.green.set(false);
        self.red.set(false);
    }

    pub fn cleanup(&mut self) {
        self.all_off();
        debug!("LEDs switched off");
    }
}

fn open_pin(gpio: Option<&Gpio>, color: LedColor, pin: u8) -> Box<dyn LedPin> {
    if let Some(gpio) = gpio {
        match GpioLed::open(gpio, pin) {
            Ok(led) => return Box::new(led),
            Err(e) => warn!("Could not claim GPIO {} for {} LED: {}", pin, color, e),
        }
    }
    Box::new(LogLed::new(color.to_string()))
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
