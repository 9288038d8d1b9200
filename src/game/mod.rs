//! Reaction-time game driven by the joystick and the indicator LEDs
//!
//! Each round blinks the LEDs, waits a random time, then lights green for
//! UP or red for DOWN and times how long the player takes to push the stick.
//! LEFT or RIGHT ends the session, as does not answering in time.

pub mod round;
pub mod score;

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::config::GameSettings;
use crate::joystick::{Direction, DirectionSource};
use crate::led::{LedColor, Leds};
use round::{Round, RoundOutcome, WaitResult};
pub use score::{Scoreboard, SessionSummary, Verdict};

/// The direction the player is asked to push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Up,
    Down,
}

impl Prompt {
    pub fn direction(self) -> Direction {
        match self {
            Self::Up => Direction::Up,
            Self::Down => Direction::Down,
        }
    }

    pub fn led(self) -> LedColor {
        match self {
            Self::Up => LedColor::Green,
            Self::Down => LedColor::Red,
        }
    }
}

/// Sideways always quits, otherwise the response has to match the prompt
pub fn judge(prompt: Prompt, response: Direction) -> Verdict {
    match response {
        Direction::Left | Direction::Right => Verdict::Quit,
        other if other == prompt.direction() => Verdict::Correct,
        _ => Verdict::Incorrect,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub struct Game<J: DirectionSource, R: Rng> {
    joystick: J,
    leds: Leds,
    rng: R,
    settings: GameSettings,
    scoreboard: Scoreboard,
    rounds_started: u32,
}

impl<J: DirectionSource, R: Rng> Game<J, R> {
    pub fn new(joystick: J, leds: Leds, rng: R, settings: GameSettings) -> Self {
        Self {
            joystick,
            leds,
            rng,
            settings,
            scoreboard: Scoreboard::new(),
            rounds_started: 0,
        }
    }

    /// Plays rounds until the player quits or stops answering
    pub fn run(&mut self) -> SessionSummary {
        info!("Game started with settings: {:?}", self.settings);
        while self.play_round() == Flow::Continue {}

        self.leds.all_off();
        let summary = self.scoreboard.summary();
        info!("Game over: {}", summary);
        summary
    }

    /// Hands the hardware back for cleanup
    pub fn into_parts(self) -> (J, Leds) {
        (self.joystick, self.leds)
    }

    fn play_round(&mut self) -> Flow {
        self.rounds_started += 1;
        let round = Round::create(self.rounds_started, self.settings.clone());

        let armed = round.get_ready(&mut self.joystick, &mut self.leds);
        let outcome = match armed.wait(&mut self.joystick, &mut self.rng) {
            WaitResult::Prompted(prompted) => {
                prompted.await_response(&mut self.joystick, &mut self.leds)
            }
            WaitResult::TooSoon => RoundOutcome::TooSoon,
        };

        self.finish_round(outcome)
    }

    /// Scores the round and logs its record; true on a new best time
    fn record(&mut self, number: u32, verdict: Verdict, reaction: Option<Duration>) -> bool {
        let new_best = self.scoreboard.record(number, verdict, reaction);
        if let Some(record) = self.scoreboard.records().last() {
            info!("{}", record);
        }
        new_best
    }

    fn finish_round(&mut self, outcome: RoundOutcome) -> Flow {
        let number = self.rounds_started;

        match outcome {
            RoundOutcome::TooSoon => {
                self.record(number, Verdict::TooSoon, None);
                Flow::Continue
            }
            RoundOutcome::TimedOut { prompt } => {
                debug!("Round {}: no answer to {:?}", number, prompt);
                println!(
                    "No input within {}ms; quitting!",
                    self.settings.response_timeout_ms
                );
                self.record(number, Verdict::TimedOut, None);
                Flow::Stop
            }
            RoundOutcome::Responded {
                prompt,
                response,
                reaction,
            } => {
                let verdict = judge(prompt, response);
                debug!(
                    "Round {}: asked {:?}, got {} after {:?} -> {:?}",
                    number, prompt, response, reaction, verdict
                );
                let new_best = self.record(number, verdict, Some(reaction));

                match verdict {
                    Verdict::Quit => {
                        println!("User selected to quit.");
                        return Flow::Stop;
                    }
                    Verdict::Correct => {
                        println!("Correct!");
                        if new_best {
                            println!("New best time!");
                        }
                        let best = self.scoreboard.best().unwrap_or(reaction);
                        println!(
                            "Your reaction time was {}ms; best so far in game is {}ms.",
                            reaction.as_millis(),
                            best.as_millis()
                        );
                        self.leds
                            .green
                            .flash(self.settings.flash_count, self.settings.flash_total());
                    }
                    _ => {
                        println!("Incorrect.");
                        self.leds
                            .red
                            .flash(self.settings.flash_count, self.settings.flash_total());
                    }
                }

                println!();
                Flow::Continue
            }
        }
    }
}
