use rppal::gpio::{Gpio, OutputPin};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LedError {
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// A single on/off output line
pub trait LedPin {
    fn set(&mut self, on: bool) -> Result<(), LedError>;
}

/// LED wired to a GPIO line, driven through the kernel GPIO character device
pub struct GpioLed {
    pin: OutputPin,
}

impl GpioLed {
    /// Claims BCM pin `pin` as an output, initially low
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self, LedError> {
        let pin = gpio.get(pin)?.into_output_low();
        debug!("Claimed GPIO {} as LED output", pin.pin());
        Ok(Self { pin })
    }
}

impl LedPin for GpioLed {
    fn set(&mut self, on: bool) -> Result<(), LedError> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// Stand-in used when no GPIO is available; only logs state changes
#[derive(Debug, Default)]
pub struct LogLed {
    label: String,
    on: bool,
}

impl LogLed {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            on: false,
        }
    }
}

impl LedPin for LogLed {
    fn set(&mut self, on: bool) -> Result<(), LedError> {
        if self.on != on {
            info!("[{} LED] {}", self.label, if on { "on" } else { "off" });
        }
        self.on = on;
        Ok(())
    }
}
