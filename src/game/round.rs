//! One reaction round as a compile-time checked state machine
//!
//! ```text
//! GetReady ──get_ready()──► Armed ──wait()──► Prompted ──await_response()──► RoundOutcome
//!                                    │
//!                                    └── stick moved early ──► TooSoon
//! ```

use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use statum::{machine, state};
use tracing::{debug, warn};

use super::Prompt;
use crate::config::GameSettings;
use crate::joystick::{Direction, DirectionSource};
use crate::led::Leds;

/// Result of a round that got past the ready phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    TooSoon,
    TimedOut {
        prompt: Prompt,
    },
    Responded {
        prompt: Prompt,
        response: Direction,
        reaction: Duration,
    },
}

#[state]
#[derive(Debug, Clone)]
pub enum RoundState {
    GetReady,
    Armed,
    Prompted(Prompt),
}

#[machine]
#[derive(Debug)]
pub struct Round<S: RoundState> {
    number: u32,
    settings: GameSettings,
}

/// What the random wait ended with
pub enum WaitResult {
    Prompted(Round<Prompted>),
    TooSoon,
}

impl Round<GetReady> {
    pub fn create(number: u32, settings: GameSettings) -> Self {
        Self::new(number, settings)
    }

    /// Alternates the LEDs, then waits until the stick is released
    pub fn get_ready<J: DirectionSource>(self, joystick: &mut J, leds: &mut Leds) -> Round<Armed> {
        println!("Get ready...");
        let blink = self.settings.ready_blink();
        for _ in 0..self.settings.ready_cycles {
            leds.green.set(true);
            pause(blink);
            leds.green.set(false);

            leds.red.set(true);
            pause(blink);
            leds.red.set(false);
        }

        if joystick.moved() {
            println!("Please let go of joystick");
            while joystick.moved() {
                pause(self.settings.release_poll());
            }
        }

        debug!("Round {} armed", self.number);
        self.transition()
    }
}

impl Round<Armed> {
    /// Sleeps a random time, then picks the direction to ask for
    pub fn wait<J: DirectionSource, R: Rng>(self, joystick: &mut J, rng: &mut R) -> WaitResult {
        let wait_ms = rng.gen_range(self.settings.min_wait_ms..=self.settings.max_wait_ms);
        debug!("Round {} waiting {}ms", self.number, wait_ms);
        pause(Duration::from_millis(wait_ms));

        if joystick.moved() {
            println!("too soon");
            return WaitResult::TooSoon;
        }

        let prompt = if rng.gen_bool(0.5) {
            Prompt::Up
        } else {
            Prompt::Down
        };
        WaitResult::Prompted(self.transition_with(prompt))
    }
}

impl Round<Prompted> {
    pub fn prompt(&self) -> Option<Prompt> {
        self.get_state_data().copied()
    }

    /// Lights the prompt LED and polls until a direction or the timeout
    pub fn await_response<J: DirectionSource>(self, joystick: &mut J, leds: &mut Leds) -> RoundOutcome {
        let prompt = match self.prompt() {
            Some(prompt) => prompt,
            None => {
                warn!("No prompt in Prompted state, defaulting to UP");
                Prompt::Up
            }
        };

        println!("Press {} now!", prompt.direction());
        leds.get_mut(prompt.led()).set(true);

        let timeout = self.settings.response_timeout();
        let started = Instant::now();
        let outcome = loop {
            let response = joystick.read();
            if response != Direction::None {
                break RoundOutcome::Responded {
                    prompt,
                    response,
                    reaction: started.elapsed(),
                };
            }
            if started.elapsed() >= timeout {
                break RoundOutcome::TimedOut { prompt };
            }
            pause(self.settings.response_poll());
        };

        leds.all_off();
        debug!("Round {} finished: {:?}", self.number, outcome);
        outcome
    }
}

pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
