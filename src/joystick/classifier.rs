//! Hysteresis state machine turning averaged positions into directions
//!
//! The stick has two states: centered and displaced. Leaving the center
//! requires crossing the outer radius `deadzone_in`, coming back requires
//! falling inside the smaller radius `deadzone_out`:
//!
//! ```text
//!                d >= deadzone_in
//!   ┌──────────┐ ───────────────► ┌───────────┐
//!   │ centered │                  │ displaced │ ◄─┐ d > deadzone_out:
//!   └──────────┘ ◄─────────────── └───────────┘ ──┘ recompute direction
//!                d <= deadzone_out
//! ```
//!
//! Distances are compared squared so no square root is needed.
//!
//! # Direction resolution
//!
//! The axis with the larger magnitude wins. When `|dx| == |dy|` the X axis
//! wins, so an exact diagonal always reads as `Left` or `Right`. This
//! tie-break is fixed and part of the contract.
//!
//! Sign convention after [`Polarity`] is applied: negative dx is `Left`,
//! positive dx is `Right`, positive dy is `Up`, negative dy is `Down`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sampler::AxisPosition;
use crate::config::{ConfigError, JoystickConfig};

/// Discrete stick direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "NONE",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        };
        f.write_str(text)
    }
}

/// Wiring orientation of one axis
///
/// `Inverted` flips the sign of the offset before the direction is resolved,
/// for boards where a higher reading means left or down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Normal,
    Inverted,
}

impl Polarity {
    pub fn apply(self, offset: i32) -> i32 {
        match self {
            Self::Normal => offset,
            Self::Inverted => -offset,
        }
    }
}

/// State carried from one read to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub displaced: bool,
    pub last_direction: Direction,
}

/// Offset of a position from the configured center
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Displacement {
    pub dx: i32,
    pub dy: i32,
    pub distance_squared: i64,
}

impl Displacement {
    pub fn measure(position: AxisPosition, settings: &ClassifierSettings) -> Self {
        let dx = settings.x_polarity.apply(position.x - settings.center_x);
        let dy = settings.y_polarity.apply(position.y - settings.center_y);
        let distance_squared = i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy);

        Self {
            dx,
            dy,
            distance_squared,
        }
    }

    /// Dominant axis direction; ties go to the X axis
    pub fn direction(&self) -> Direction {
        if self.dx.abs() >= self.dy.abs() {
            if self.dx < 0 {
                Direction::Left
            } else {
                Direction::Right
            }
        } else if self.dy > 0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

// Classifier settings
#[derive(Clone, Debug)]
pub struct ClassifierSettings {
    /// Raw X reading of the stick at rest
    pub center_x: i32,

    /// Raw Y reading of the stick at rest
    pub center_y: i32,

    /// Radius the stick has to reach to leave the center
    ///
    /// Compared as `d² >= deadzone_in²`, so a reading exactly on the circle
    /// counts as displaced.
    pub deadzone_in: u32,

    /// Radius the stick has to fall back within to be released
    ///
    /// Must be strictly smaller than `deadzone_in`. The gap between the two
    /// is the hysteresis band in which a direction is held.
    pub deadzone_out: u32,

    /// Sign applied to dx before resolving Left/Right
    pub x_polarity: Polarity,

    /// Sign applied to dy before resolving Up/Down
    pub y_polarity: Polarity,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from(&JoystickConfig::default())
    }
}

impl From<&JoystickConfig> for ClassifierSettings {
    fn from(config: &JoystickConfig) -> Self {
        Self {
            center_x: config.center_x,
            center_y: config.center_y,
            deadzone_in: config.deadzone_in,
            deadzone_out: config.deadzone_out,
            x_polarity: config.x_polarity,
            y_polarity: config.y_polarity,
        }
    }
}

/// Stateful direction classifier with entry/exit hysteresis
#[derive(Debug, Clone)]
pub struct DirectionClassifier {
    settings: ClassifierSettings,
    enter_squared: i64,
    exit_squared: i64,
    state: ClassifierState,
}

impl DirectionClassifier {
    /// Fails when the entry radius is not strictly larger than the exit radius
    pub fn new(settings: ClassifierSettings) -> Result<Self, ConfigError> {
        if settings.deadzone_in <= settings.deadzone_out {
            return Err(ConfigError::InvalidDeadzone {
                deadzone_in: settings.deadzone_in,
                deadzone_out: settings.deadzone_out,
            });
        }

        let enter_squared = i64::from(settings.deadzone_in).pow(2);
        let exit_squared = i64::from(settings.deadzone_out).pow(2);

        Ok(Self {
            settings,
            enter_squared,
            exit_squared,
            state: ClassifierState::default(),
        })
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Back to centered with no direction
    pub fn reset(&mut self) {
        self.state = ClassifierState::default();
    }

    /// Direction to report when no fresh position is available
    ///
    /// Holds the last direction while displaced instead of dropping to
    /// `None` on a transient sampling gap.
    pub fn hold(&self) -> Direction {
        if self.state.displaced {
            self.state.last_direction
        } else {
            Direction::None
        }
    }

    /// Feeds one averaged position (or the lack of one) through the state machine
    pub fn update(&mut self, position: Option<AxisPosition>) -> Direction {
        let Some(position) = position else {
            return self.hold();
        };

        let displacement = Displacement::measure(position, &self.settings);
        let previous = self.state;

        if self.state.displaced {
            if displacement.distance_squared <= self.exit_squared {
                self.state = ClassifierState::default();
            } else {
                self.state.last_direction = displacement.direction();
            }
        } else if displacement.distance_squared >= self.enter_squared {
            self.state = ClassifierState {
                displaced: true,
                last_direction: displacement.direction(),
            };
        } else {
            self.state.last_direction = Direction::None;
        }

        if self.state != previous {
            debug!(
                "Joystick {} -> {} (dx={}, dy={}, d²={})",
                previous.last_direction,
                self.state.last_direction,
                displacement.dx,
                displacement.dy,
                displacement.distance_squared
            );
        }

        self.state.last_direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DirectionClassifier {
        DirectionClassifier::new(ClassifierSettings::default()).unwrap()
    }

    fn small_deadzones() -> DirectionClassifier {
        DirectionClassifier::new(ClassifierSettings {
            deadzone_in: 60,
            deadzone_out: 40,
            ..ClassifierSettings::default()
        })
        .unwrap()
    }

    fn at(dx: i32, dy: i32) -> Option<AxisPosition> {
        Some(AxisPosition::new(2048 + dx, 2048 + dy))
    }

    #[test]
    fn starts_centered() {
        let classifier = classifier();
        assert_eq!(classifier.state(), ClassifierState::default());
        assert_eq!(classifier.hold(), Direction::None);
    }

    #[test]
    fn rejects_inverted_deadzones() {
        let result = DirectionClassifier::new(ClassifierSettings {
            deadzone_in: 900,
            deadzone_out: 900,
            ..ClassifierSettings::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidDeadzone { .. })));
    }

    #[test]
    fn stays_centered_inside_inner_radius() {
        let mut classifier = classifier();
        for (dx, dy) in [(0, 0), (500, -500), (-899, 0), (0, 899), (600, 600)] {
            assert_eq!(classifier.update(at(dx, dy)), Direction::None);
            assert!(!classifier.state().displaced);
        }
    }

    #[test]
    fn stays_centered_in_hysteresis_band_when_not_displaced() {
        let mut classifier = classifier();
        // 1000 is past the exit radius but short of the entry radius
        assert_eq!(classifier.update(at(0, 1000)), Direction::None);
        assert_eq!(classifier.update(at(-1199, 0)), Direction::None);
        assert!(!classifier.state().displaced);
    }

    #[test]
    fn enters_displaced_exactly_at_entry_radius() {
        let mut classifier = classifier();
        assert_eq!(classifier.update(at(0, -1200)), Direction::Down);
        assert!(classifier.state().displaced);
    }

    #[test]
    fn resolves_each_cardinal_direction() {
        for (dx, dy, expected) in [
            (0, 1500, Direction::Up),
            (0, -1500, Direction::Down),
            (-1500, 0, Direction::Left),
            (1500, 0, Direction::Right),
            (-1300, 400, Direction::Left),
            (300, -1400, Direction::Down),
        ] {
            let mut classifier = classifier();
            assert_eq!(classifier.update(at(dx, dy)), expected, "dx={dx} dy={dy}");
        }
    }

    #[test]
    fn sticks_in_hysteresis_band_once_displaced() {
        let mut classifier = classifier();
        assert_eq!(classifier.update(at(1300, 0)), Direction::Right);

        // inside the entry radius but outside the exit radius
        assert_eq!(classifier.update(at(1000, 0)), Direction::Right);
        assert_eq!(classifier.update(at(901, 0)), Direction::Right);
        assert!(classifier.state().displaced);
    }

    #[test]
    fn direction_follows_stick_while_displaced() {
        let mut classifier = classifier();
        assert_eq!(classifier.update(at(1300, 0)), Direction::Right);
        assert_eq!(classifier.update(at(200, 1000)), Direction::Up);
        assert_eq!(classifier.update(at(-950, 100)), Direction::Left);
    }

    #[test]
    fn releases_at_exit_radius() {
        let mut classifier = classifier();
        classifier.update(at(-1300, 0));

        assert_eq!(classifier.update(at(-900, 0)), Direction::None);
        assert_eq!(classifier.state(), ClassifierState::default());
    }

    #[test]
    fn released_stick_must_cross_entry_radius_again() {
        let mut classifier = classifier();
        classifier.update(at(0, 1300));
        classifier.update(at(0, 0));

        assert_eq!(classifier.update(at(0, 1100)), Direction::None);
        assert_eq!(classifier.update(at(0, 1250)), Direction::Up);
    }

    #[test]
    fn repeated_reads_of_same_position_are_stable() {
        for position in [at(0, 0), at(0, 1000), at(1400, -20), at(-700, -1100)] {
            let mut classifier = classifier();
            let first = classifier.update(position);
            for _ in 0..10 {
                assert_eq!(classifier.update(position), first);
            }
        }
    }

    #[test]
    fn diagonal_tie_goes_to_x_axis() {
        let mut tight = small_deadzones();
        for _ in 0..5 {
            assert_eq!(tight.update(at(50, -50)), Direction::Right);
        }

        let mut tight = small_deadzones();
        assert_eq!(tight.update(at(-50, 50)), Direction::Left);

        let mut wide = classifier();
        assert_eq!(wide.update(at(900, 900)), Direction::Right);
    }

    #[test]
    fn missing_position_holds_last_direction_while_displaced() {
        let mut classifier = classifier();
        assert_eq!(classifier.update(at(0, 1500)), Direction::Up);

        assert_eq!(classifier.update(None), Direction::Up);
        assert_eq!(classifier.update(None), Direction::Up);
        assert!(classifier.state().displaced);
    }

    #[test]
    fn missing_position_reads_none_while_centered() {
        let mut classifier = classifier();
        assert_eq!(classifier.update(None), Direction::None);
        assert!(!classifier.state().displaced);
    }

    #[test]
    fn inverted_polarity_flips_directions() {
        let mut classifier = DirectionClassifier::new(ClassifierSettings {
            x_polarity: Polarity::Inverted,
            y_polarity: Polarity::Inverted,
            ..ClassifierSettings::default()
        })
        .unwrap();

        assert_eq!(classifier.update(at(0, 1500)), Direction::Down);
        classifier.reset();
        assert_eq!(classifier.update(at(1500, 0)), Direction::Left);
    }

    #[test]
    fn extreme_readings_do_not_overflow() {
        let mut classifier = DirectionClassifier::new(ClassifierSettings {
            center_x: 0,
            center_y: 0,
            ..ClassifierSettings::default()
        })
        .unwrap();

        assert_eq!(
            classifier.update(Some(AxisPosition::new(4095, 4095))),
            Direction::Right
        );
    }

    #[test]
    fn centered_to_up_and_back() {
        let mut classifier = classifier();
        assert_eq!(
            classifier.update(Some(AxisPosition::new(2048, 2048))),
            Direction::None
        );
        assert_eq!(
            classifier.update(Some(AxisPosition::new(2048, 3300))),
            Direction::Up
        );
        assert_eq!(
            classifier.update(Some(AxisPosition::new(2048, 2048))),
            Direction::None
        );
        assert!(!classifier.state().displaced);
    }
}
