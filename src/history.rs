use chrono::{DateTime, Local};
use std::time::Duration;

use crate::util::{as_millis_f64, mean, trimmed_mean};

/// One completed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solve {
    pub duration: Duration,
    pub finished_at: DateTime<Local>,
}

impl Solve {
    /// Durations are kept at whole-millisecond precision.
    pub fn new(duration: Duration, finished_at: DateTime<Local>) -> Self {
        Self {
            duration: Duration::from_millis(duration.as_millis() as u64),
            finished_at,
        }
    }

    pub fn millis(&self) -> f64 {
        as_millis_f64(self.duration)
    }
}

/// Completed solves of this run, oldest first. Lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    solves: Vec<Solve>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, solve: Solve) {
        self.solves.push(solve);
    }

    pub fn record(&mut self, duration: Duration) -> Solve {
        let solve = Solve::new(duration, Local::now());
        self.push(solve);
        solve
    }

    pub fn len(&self) -> usize {
        self.solves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solves.is_empty()
    }

    pub fn solves(&self) -> &[Solve] {
        &self.solves
    }

    pub fn last(&self) -> Option<&Solve> {
        self.solves.last()
    }

    /// Most recent first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Solve> {
        self.solves.iter().rev().take(n)
    }

    fn millis(&self) -> Vec<f64> {
        self.solves.iter().map(Solve::millis).collect()
    }

    /// Mean of every solve, in seconds. NaN while the history is empty.
    pub fn average_secs(&self) -> f64 {
        mean(&self.millis()).map_or(f64::NAN, |ms| ms / 1000.0)
    }

    pub fn best(&self) -> Option<Duration> {
        self.solves.iter().map(|s| s.duration).min()
    }

    /// Trimmed average of the last `n` solves in seconds, once there are `n` of them.
    pub fn average_of(&self, n: usize) -> Option<f64> {
        if n < 3 || self.solves.len() < n {
            return None;
        }

        let window = self.solves[self.solves.len() - n..]
            .iter()
            .map(Solve::millis)
            .collect::<Vec<f64>>();

        trimmed_mean(&window).map(|ms| ms / 1000.0)
    }
}
