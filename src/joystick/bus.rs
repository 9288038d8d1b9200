//! SPI channel reader for the MCP3208 family of 12-bit ADCs
//!
//! One conversion is one full-duplex, three byte transaction:
//!
//! ```text
//! tx = [0b0000_0 1 1 D2] [D1 D0 xx_xxxx] [xxxx_xxxx]
//!            start sgl
//! rx = [xxxx_xxxx] [xxx0 B11 B10 B9 B8] [B7 .. B0]
//! ```
//!
//! The reader performs no retries. A failed conversion is reported to the
//! caller, which decides whether the sample is simply dropped.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::{debug, info, trace};

use crate::config::JoystickConfig;

/// Length of a single conversion transaction in bytes
pub const FRAME_LEN: usize = 3;

/// Highest addressable input channel
pub const MAX_CHANNEL: u8 = 7;

/// Largest value a conversion can produce
pub const MAX_RAW: u16 = 0x0FFF;

/// Errors reported by the bus layer
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The spidev call itself failed
    ///
    /// Covers opening the device as well as individual transfers, for example
    /// when SPI is not enabled or the process lacks permission.
    #[error("SPI error: {0}")]
    Transport(#[from] rppal::spi::Error),

    /// Requested channel does not exist on the converter
    ///
    /// Rejected before any bytes are sent.
    #[error("Channel {0} is out of range (0-7)")]
    InvalidChannel(u8),

    /// The transaction moved fewer bytes than a full frame
    ///
    /// The partial reply is discarded since the 12-bit result spans the last
    /// two bytes.
    #[error("Short transfer: {transferred} of {expected} bytes")]
    ShortTransfer { transferred: usize, expected: usize },

    /// Configured bus index has no spidev counterpart
    #[error("Unsupported SPI bus {0}")]
    UnsupportedBus(u8),

    /// Configured chip select line is not one of `Ss0` to `Ss3`
    #[error("Unsupported chip select {0}")]
    UnsupportedChipSelect(u8),
}

/// A blocking, full-duplex bus able to exchange one conversion frame
///
/// Returns the number of bytes actually transferred.
pub trait BusTransport {
    fn transfer(
        &mut self,
        tx: &[u8; FRAME_LEN],
        rx: &mut [u8; FRAME_LEN],
    ) -> Result<usize, BusError>;
}

/// Linux spidev backed transport
pub struct SpiBus {
    spi: Spi,
}

impl SpiBus {
    /// Opens and configures the SPI device named by the joystick settings
    ///
    /// The device is configured for SPI mode 0 with 8 bits per word.
    pub fn open(settings: &JoystickConfig) -> Result<Self, BusError> {
        let bus = bus_from_index(settings.spi_bus)?;
        let slave_select = slave_select_from_index(settings.chip_select)?;

        debug!(
            "Opening SPI bus {:?}, {:?} at {} Hz",
            bus, slave_select, settings.clock_hz
        );
        let spi = Spi::new(bus, slave_select, settings.clock_hz, Mode::Mode0)?;
        spi.set_bits_per_word(8)?;

        info!(
            "SPI device spidev{}.{} ready",
            settings.spi_bus, settings.chip_select
        );
        Ok(Self { spi })
    }
}

impl BusTransport for SpiBus {
    fn transfer(
        &mut self,
        tx: &[u8; FRAME_LEN],
        rx: &mut [u8; FRAME_LEN],
    ) -> Result<usize, BusError> {
        Ok(self.spi.transfer(rx, tx)?)
    }
}

fn bus_from_index(index: u8) -> Result<Bus, BusError> {
    match index {
        0 => Ok(Bus::Spi0),
        1 => Ok(Bus::Spi1),
        2 => Ok(Bus::Spi2),
        3 => Ok(Bus::Spi3),
        4 => Ok(Bus::Spi4),
        5 => Ok(Bus::Spi5),
        6 => Ok(Bus::Spi6),
        other => Err(BusError::UnsupportedBus(other)),
    }
}

fn slave_select_from_index(index: u8) -> Result<SlaveSelect, BusError> {
    match index {
        0 => Ok(SlaveSelect::Ss0),
        1 => Ok(SlaveSelect::Ss1),
        2 => Ok(SlaveSelect::Ss2),
        3 => Ok(SlaveSelect::Ss3),
        other => Err(BusError::UnsupportedChipSelect(other)),
    }
}

/// Reads raw conversions from individual ADC channels
pub struct ChannelReader<T: BusTransport> {
    bus: T,
}

impl<T: BusTransport> ChannelReader<T> {
    pub fn new(bus: T) -> Self {
        Self { bus }
    }

    /// Performs a single conversion on `channel`
    pub fn read(&mut self, channel: u8) -> Result<u16, BusError> {
        let tx = command_frame(channel)?;
        let mut rx = [0u8; FRAME_LEN];

        let transferred = self.bus.transfer(&tx, &mut rx)?;
        if transferred < FRAME_LEN {
            return Err(BusError::ShortTransfer {
                transferred,
                expected: FRAME_LEN,
            });
        }

        let raw = decode_frame(&rx);
        trace!("CH{} -> {}", channel, raw);
        Ok(raw)
    }

    /// Gives the transport back, e.g. to close the device
    pub fn into_inner(self) -> T {
        self.bus
    }
}

/// Builds the single-ended conversion request for `channel`
pub fn command_frame(channel: u8) -> Result<[u8; FRAME_LEN], BusError> {
    if channel > MAX_CHANNEL {
        return Err(BusError::InvalidChannel(channel));
    }
    Ok([
        0x06 | ((channel & 0x04) >> 2), // start, single-ended, D2
        (channel & 0x03) << 6,          // D1 D0
        0x00,
    ])
}

/// Extracts the 12-bit result from a reply frame
pub fn decode_frame(rx: &[u8; FRAME_LEN]) -> u16 {
    (((rx[1] & 0x0F) as u16) << 8) | rx[2] as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joystick::testing::{FakeAdc, Reply};

    #[test]
    fn command_frame_encodes_channel_bits() {
        assert_eq!(command_frame(0).unwrap(), [0x06, 0x00, 0x00]);
        assert_eq!(command_frame(1).unwrap(), [0x06, 0x40, 0x00]);
        assert_eq!(command_frame(3).unwrap(), [0x06, 0xC0, 0x00]);
        assert_eq!(command_frame(4).unwrap(), [0x07, 0x00, 0x00]);
        assert_eq!(command_frame(7).unwrap(), [0x07, 0xC0, 0x00]);
    }

    #[test]
    fn command_frame_rejects_channel_out_of_range() {
        assert!(matches!(
            command_frame(8),
            Err(BusError::InvalidChannel(8))
        ));
    }

    #[test]
    fn decode_ignores_high_nibble_of_middle_byte() {
        assert_eq!(decode_frame(&[0xFF, 0xFA, 0xBC]), 0x0ABC);
        assert_eq!(decode_frame(&[0x00, 0x0F, 0xFF]), MAX_RAW);
        assert_eq!(decode_frame(&[0x00, 0x00, 0x00]), 0);
    }

    #[test]
    fn read_returns_value_for_requested_channel() {
        let adc = FakeAdc::new();
        adc.set_position(1234, 3000);
        let mut reader = ChannelReader::new(adc.clone());

        assert_eq!(reader.read(0).unwrap(), 1234);
        assert_eq!(reader.read(1).unwrap(), 3000);
        assert_eq!(adc.transactions(), 2);
    }

    #[test]
    fn read_reports_short_transfer() {
        let adc = FakeAdc::new();
        adc.push_replies([Reply::Short(2)]);
        let mut reader = ChannelReader::new(adc);

        match reader.read(0) {
            Err(BusError::ShortTransfer {
                transferred,
                expected,
            }) => {
                assert_eq!(transferred, 2);
                assert_eq!(expected, FRAME_LEN);
            }
            other => panic!("expected short transfer, got {:?}", other),
        }
    }

    #[test]
    fn invalid_channel_never_reaches_the_bus() {
        let adc = FakeAdc::new();
        let mut reader = ChannelReader::new(adc.clone());

        assert!(reader.read(9).is_err());
        assert_eq!(adc.transactions(), 0);
    }
}
