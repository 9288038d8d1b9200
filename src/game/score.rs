use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    TooSoon,
    TimedOut,
    Quit,
}

#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub number: u32,
    pub verdict: Verdict,
    /// Only set for answered rounds
    pub reaction: Option<Duration>,
    pub finished_at: DateTime<Local>,
}

impl fmt::Display for RoundRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] round {}: {:?}",
            self.finished_at.format("%H:%M:%S%.3f"),
            self.number,
            self.verdict
        )?;
        if let Some(reaction) = self.reaction {
            write!(f, " after {}ms", reaction.as_millis())?;
        }
        Ok(())
    }
}

/// Per-session history with the best correct reaction time
#[derive(Debug, Default)]
pub struct Scoreboard {
    records: Vec<RoundRecord>,
    best: Option<Duration>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the round; returns true when it set a new best time
    pub fn record(&mut self, number: u32, verdict: Verdict, reaction: Option<Duration>) -> bool {
        let new_best = match (verdict, reaction) {
            (Verdict::Correct, Some(time)) if self.best.is_none_or(|best| time < best) => {
                self.best = Some(time);
                true
            }
            _ => false,
        };

        self.records.push(RoundRecord {
            number,
            verdict,
            reaction,
            finished_at: Local::now(),
        });
        new_best
    }

    pub fn best(&self) -> Option<Duration> {
        self.best
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    pub fn summary(&self) -> SessionSummary {
        let count = |verdict: Verdict| self.records.iter().filter(|r| r.verdict == verdict).count();

        SessionSummary {
            rounds: self.records.len(),
            correct: count(Verdict::Correct),
            incorrect: count(Verdict::Incorrect),
            too_soon: count(Verdict::TooSoon),
            best: self.best,
            ended_by: self.records.last().map(|r| r.verdict),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub rounds: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub too_soon: usize,
    pub best: Option<Duration>,
    pub ended_by: Option<Verdict>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rounds, {} correct, {} incorrect, {} too soon",
            self.rounds, self.correct, self.incorrect, self.too_soon
        )?;
        match self.best {
            Some(best) => write!(f, ", best {}ms", best.as_millis())?,
            None => write!(f, ", no best time")?,
        }
        if let Some(verdict) = self.ended_by {
            write!(f, ", ended by {:?}", verdict)?;
        }
        Ok(())
    }
}
