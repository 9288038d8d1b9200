//! Joystick Handle - init/read/moved/cleanup surface for the game loop
//!
//! Owns the bus, the aggregator and the classifier. A joystick whose device
//! could not be opened stays usable: every read degrades to the classifier's
//! hold rule, which is `Direction::None` for a fresh instance.

use tracing::{debug, error, info, warn};

use super::bus::{BusError, BusTransport, ChannelReader, SpiBus};
use super::classifier::{ClassifierSettings, Direction, DirectionClassifier};
use super::sampler::{SampleAggregator, SamplerSettings};
use super::DirectionSource;
use crate::config::{ConfigError, JoystickConfig};

pub struct Joystick<T: BusTransport> {
    settings: JoystickConfig,
    reader: Option<ChannelReader<T>>,
    sampler: SampleAggregator,
    classifier: DirectionClassifier,
}

impl<T: BusTransport> Joystick<T> {
    /// Creates an uninitialized joystick
    ///
    /// Only fails on settings the classifier cannot work with.
    pub fn new(settings: JoystickConfig) -> Result<Self, ConfigError> {
        let sampler = SampleAggregator::new(SamplerSettings::from(&settings));
        let classifier = DirectionClassifier::new(ClassifierSettings::from(&settings))?;

        debug!(
            "Split settings: sampler={:?}, classifier={:?}",
            sampler.settings(),
            classifier.settings()
        );

        Ok(Self {
            settings,
            reader: None,
            sampler,
            classifier,
        })
    }

    /// Opens the bus through `open`, unless already open
    ///
    /// On failure the error is logged and the joystick stays uninitialized.
    pub fn init_with<F>(&mut self, open: F)
    where
        F: FnOnce(&JoystickConfig) -> Result<T, BusError>,
    {
        if self.reader.is_some() {
            debug!("Joystick already initialized");
            return;
        }

        match open(&self.settings) {
            Ok(bus) => {
                self.reader = Some(ChannelReader::new(bus));
                self.classifier.reset();
                info!(
                    "Joystick initialized on CH{}/CH{}",
                    self.settings.x_channel, self.settings.y_channel
                );
            }
            Err(e) => {
                error!("Failed to open joystick ADC: {}", e);
                warn!("Joystick stays uninitialized, reads will report no direction");
            }
        }
    }

    /// Releases the bus; safe to call repeatedly
    pub fn cleanup(&mut self) {
        if let Some(reader) = self.reader.take() {
            drop(reader.into_inner());
            info!("Joystick bus closed");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.reader.is_some()
    }

    /// Samples the stick and runs the classifier
    pub fn read(&mut self) -> Direction {
        match self.reader.as_mut() {
            Some(reader) => {
                let position = self.sampler.sample(reader);
                self.classifier.update(position)
            }
            None => self.classifier.hold(),
        }
    }

    pub fn moved(&mut self) -> bool {
        self.read() != Direction::None
    }
}

impl Joystick<SpiBus> {
    /// Opens the SPI device named in the settings
    pub fn init(&mut self) {
        self.init_with(SpiBus::open);
    }
}

impl<T: BusTransport> DirectionSource for Joystick<T> {
    fn read(&mut self) -> Direction {
        Joystick::read(self)
    }
}
