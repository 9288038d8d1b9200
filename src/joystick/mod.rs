//! Joystick subsystem for analog stick input over an SPI ADC
//!
//! Implements a three-stage acquisition pipeline:
//!
//! 1. [`bus`] - Raw channel conversions over SPI
//! 2. [`sampler`] - Multi-sample averaging with failed samples dropped
//! 3. [`classifier`] - Hysteresis state machine producing discrete directions
//!
//! [`device`] ties the stages together behind the `init`/`read`/`moved`/`cleanup`
//! surface used by the game loop.
//!
//! # Architecture
//!
//! ```text
//! ADC ──► ChannelReader ──► SampleAggregator ──► DirectionClassifier ──► Direction
//!         (u16 per read)    (AxisPosition)       (keeps displaced flag)
//! ```
//!
//! Everything runs synchronously on the caller's thread.

pub mod bus;
pub mod classifier;
pub mod device;
pub mod sampler;

pub use bus::{BusError, BusTransport, ChannelReader, SpiBus};
pub use classifier::{ClassifierState, Direction, DirectionClassifier, Polarity};
pub use device::Joystick;
pub use sampler::{AxisPosition, SampleAggregator};

/// Anything that can be polled for a discrete stick direction
pub trait DirectionSource {
    fn read(&mut self) -> Direction;

    fn moved(&mut self) -> bool {
        self.read() != Direction::None
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory stand-in for the ADC used across the joystick tests

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::bus::{BusError, BusTransport, FRAME_LEN};

    /// Scripted answer for one transaction, consumed before the steady values
    #[derive(Debug, Clone, Copy)]
    pub enum Reply {
        Value(u16),
        Short(usize),
        Fail,
    }

    #[derive(Debug, Default)]
    struct State {
        channels: [u16; 8],
        scripted: VecDeque<Reply>,
        failing: bool,
        transactions: usize,
    }

    /// Cheap to clone; every clone talks to the same simulated converter
    #[derive(Debug, Clone, Default)]
    pub struct FakeAdc {
        state: Rc<RefCell<State>>,
    }

    impl FakeAdc {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets channel 0 (X) and channel 1 (Y)
        pub fn set_position(&self, x: u16, y: u16) {
            let mut state = self.state.borrow_mut();
            state.channels[0] = x;
            state.channels[1] = y;
        }

        pub fn set_channel(&self, channel: u8, value: u16) {
            self.state.borrow_mut().channels[channel as usize] = value;
        }

        /// Makes every transaction fail until switched off again
        pub fn set_failing(&self, failing: bool) {
            self.state.borrow_mut().failing = failing;
        }

        pub fn push_replies(&self, replies: impl IntoIterator<Item = Reply>) {
            self.state.borrow_mut().scripted.extend(replies);
        }

        pub fn transactions(&self) -> usize {
            self.state.borrow().transactions
        }
    }

    impl BusTransport for FakeAdc {
        fn transfer(
            &mut self,
            tx: &[u8; FRAME_LEN],
            rx: &mut [u8; FRAME_LEN],
        ) -> Result<usize, BusError> {
            let mut state = self.state.borrow_mut();
            state.transactions += 1;

            if state.failing {
                return Err(BusError::ShortTransfer {
                    transferred: 0,
                    expected: FRAME_LEN,
                });
            }

            let channel = ((tx[0] & 0x01) << 2) | (tx[1] >> 6);
            let value = match state.scripted.pop_front() {
                Some(Reply::Value(value)) => value,
                Some(Reply::Short(transferred)) => return Ok(transferred),
                Some(Reply::Fail) => {
                    return Err(BusError::ShortTransfer {
                        transferred: 0,
                        expected: FRAME_LEN,
                    })
                }
                None => state.channels[channel as usize],
            };

            *rx = [0xFF, 0xE0 | ((value >> 8) as u8 & 0x0F), value as u8];
            Ok(FRAME_LEN)
        }
    }
}
