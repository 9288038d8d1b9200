use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use super::bus::{BusTransport, ChannelReader};
use crate::config::JoystickConfig;

/// Averaged stick position in raw ADC units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPosition {
    pub x: i32,
    pub y: i32,
}

impl AxisPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// Sampler settings
#[derive(Clone, Debug)]
pub struct SamplerSettings {
    /// ADC input wired to the horizontal axis
    pub x_channel: u8,

    /// ADC input wired to the vertical axis
    pub y_channel: u8,

    /// Number of X/Y iterations per call
    ///
    /// This is the full budget: failed iterations are dropped, not repeated,
    /// so one call never performs more than `2 * sample_count` conversions.
    pub sample_count: usize,

    /// Pause after every iteration so the ADC input can settle
    ///
    /// A zero duration skips the sleep entirely.
    pub settle: Duration,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::from(&JoystickConfig::default())
    }
}

impl From<&JoystickConfig> for SamplerSettings {
    fn from(config: &JoystickConfig) -> Self {
        Self {
            x_channel: config.x_channel,
            y_channel: config.y_channel,
            sample_count: config.sample_count,
            settle: Duration::from_micros(config.settle_us),
        }
    }
}

/// Takes a fixed number of X/Y reads and averages the ones that worked
///
/// An iteration only counts when both axes converted. The fixed budget caps
/// the time spent per call; nothing is retried.
#[derive(Debug, Clone)]
pub struct SampleAggregator {
    settings: SamplerSettings,
}

impl SampleAggregator {
    pub fn new(settings: SamplerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Returns the truncated mean position, or `None` if every iteration failed
    pub fn sample<T: BusTransport>(&self, reader: &mut ChannelReader<T>) -> Option<AxisPosition> {
        let mut sum_x: i64 = 0;
        let mut sum_y: i64 = 0;
        let mut valid: i64 = 0;

        for iteration in 0..self.settings.sample_count {
            let x = reader.read(self.settings.x_channel);
            let y = reader.read(self.settings.y_channel);

            match (x, y) {
                (Ok(x), Ok(y)) => {
                    sum_x += i64::from(x);
                    sum_y += i64::from(y);
                    valid += 1;
                }
                (x, y) => {
                    if let Err(e) = x {
                        trace!("Dropping sample {}: X read failed: {}", iteration, e);
                    }
                    if let Err(e) = y {
                        trace!("Dropping sample {}: Y read failed: {}", iteration, e);
                    }
                }
            }

            if !self.settings.settle.is_zero() {
                thread::sleep(self.settings.settle);
            }
        }

        if valid == 0 {
            debug!(
                "All {} samples failed, no position available",
                self.settings.sample_count
            );
            return None;
        }

        Some(AxisPosition::new(
            (sum_x / valid) as i32,
            (sum_y / valid) as i32,
        ))
    }
}
