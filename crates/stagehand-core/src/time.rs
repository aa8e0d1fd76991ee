use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// Non-negative span of virtual time, stored as fractional seconds.
///
/// Serialized as a plain number of seconds; negative or non-finite values
/// are rejected on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Duration {
    seconds: f64,
}

impl Duration {
    /// Create a duration from seconds. Negative and NaN inputs clamp to zero.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: if s.is_nan() { 0.0 } else { s.max(0.0) },
        }
    }

    /// Create a duration from milliseconds.
    pub fn from_millis(ms: f64) -> Self {
        Self::from_seconds(ms / 1000.0)
    }

    /// Create a zero-length duration.
    pub const fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get the duration in seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Whether no time passes, as in an instant step.
    pub fn is_zero(&self) -> bool {
        self.seconds == 0.0
    }

    /// Number of frames this span covers at `fps`, rounded up.
    pub fn frame_count(&self, fps: f64) -> u64 {
        if fps <= 0.0 || !fps.is_finite() {
            return 0;
        }
        // Tolerate float noise such as 0.1 * 30 = 3.0000000000000004.
        (self.seconds * fps - 1e-9).ceil().max(0.0) as u64
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds + rhs.seconds)
    }
}

impl Mul<f64> for Duration {
    type Output = Duration;
    fn mul(self, rhs: f64) -> Duration {
        Duration::from_seconds(self.seconds * rhs)
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
        iter.fold(Duration::zero(), |acc, d| acc + d)
    }
}

impl TryFrom<f64> for Duration {
    type Error = String;

    fn try_from(seconds: f64) -> Result<Self, Self::Error> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("duration must be a finite, non-negative number of seconds, got {seconds}"));
        }
        Ok(Duration { seconds })
    }
}

impl From<Duration> for f64 {
    fn from(d: Duration) -> Self {
        d.seconds
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds < 1.0 {
            write!(f, "{:.0}ms", self.seconds * 1000.0)
        } else {
            write!(f, "{:.2}s", self.seconds)
        }
    }
}

/// A reading of the virtual clock, in seconds since the scene started.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    /// Create a timestamp. Negative and NaN inputs clamp to zero.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: if s.is_nan() { 0.0 } else { s.max(0.0) },
        }
    }

    /// The start of the scene.
    pub const fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get the timestamp in seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Index of the frame this timestamp falls in at `fps`.
    pub fn to_frame(&self, fps: f64) -> u64 {
        (self.seconds * fps).floor() as u64
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::from_seconds(self.seconds + rhs.as_seconds())
    }
}

impl AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let minutes = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let ms = total_ms % 1_000;
        write!(f, "{:02}:{:02}.{:03}", minutes, secs, ms)
    }
}
