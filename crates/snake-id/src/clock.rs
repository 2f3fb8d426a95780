use crate::source::NumberSource;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default epoch for the timestamp field: 2018-01-02T15:04:05Z.
pub const DEFAULT_EPOCH: Timestamp = Timestamp::constant(1_514_905_445, 0);

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Unit of the timestamp field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Seconds,
    #[default]
    Milliseconds,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Seconds => write!(f, "seconds"),
            Precision::Milliseconds => write!(f, "milliseconds"),
        }
    }
}

/// A number source yielding whole time units elapsed since a fixed epoch.
///
/// The value follows the wall clock: if the clock steps backwards, so does
/// the returned number.
#[derive(Debug, Clone)]
pub struct EpochClock<C: Clock = SystemClock> {
    epoch: Timestamp,
    precision: Precision,
    clock: C,
}

impl EpochClock<SystemClock> {
    /// Creates a source backed by the real system clock.
    pub fn new(epoch: Timestamp, precision: Precision) -> Self {
        Self::with_clock(epoch, precision, SystemClock)
    }
}

impl<C: Clock> EpochClock<C> {
    pub fn with_clock(epoch: Timestamp, precision: Precision, clock: C) -> Self {
        Self {
            epoch,
            precision,
            clock,
        }
    }

    pub fn epoch(&self) -> Timestamp {
        self.epoch
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Elapsed whole units between the epoch and `now`, truncated toward zero.
    fn elapsed(&self, now: Timestamp) -> i64 {
        let elapsed = now.duration_since(self.epoch);
        match self.precision {
            Precision::Seconds => elapsed.as_secs(),
            Precision::Milliseconds => elapsed.as_millis() as i64,
        }
    }
}

impl<C: Clock> NumberSource for EpochClock<C> {
    fn next_number(&self) -> i64 {
        self.elapsed(self.clock.now())
    }
}
