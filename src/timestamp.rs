/*!
 * Millisecond timestamps for caption and media timelines.
 *
 * `Timestamp` is a non-negative offset from a track's zero point, `Delta` is the
 * signed difference between two timestamps. Every conversion into milliseconds
 * rounds half-up so that chained additions across many groups never drift.
 */

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{CondenseError, CondenseResult};

/// Non-negative point on a track timeline, in whole milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

/// Signed millisecond difference between two timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Delta(i64);

impl Timestamp {
    /// The track's zero point
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create a timestamp from whole milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    /// Create a timestamp from fractional seconds, rounding half-up to the millisecond
    pub fn from_seconds(seconds: f64) -> CondenseResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(CondenseError::Validation(format!(
                "Timestamp must be a non-negative number of seconds, got {}",
                seconds
            )));
        }
        // Round the shortest decimal form, as clock strings are, not the binary value
        parse_clock_duration(&seconds.to_string())
            .map(Self::from_duration)
            .ok_or_else(|| CondenseError::Validation(format!("Timestamp out of range: {} seconds", seconds)))
    }

    /// Create a timestamp from a duration, rounding sub-millisecond parts half-up
    pub fn from_duration(duration: Duration) -> Self {
        let whole_ms = duration.as_secs() * 1000;
        let sub_ms = (u64::from(duration.subsec_nanos()) + 500_000) / 1_000_000;
        Timestamp(whole_ms + sub_ms)
    }

    /// Total length in milliseconds
    pub const fn total_milliseconds(&self) -> u64 {
        self.0
    }

    /// Total length in fractional seconds
    pub fn total_seconds(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Add a delta, returning `None` when the result would fall before zero
    pub fn checked_add(self, delta: Delta) -> Option<Self> {
        let ms = i64::try_from(self.0).ok()?.checked_add(delta.0)?;
        u64::try_from(ms).ok().map(Timestamp)
    }

    /// Parse a clock string such as `01:02:03.450`, `02:03.450` or the ASS form `1:02:03.45`
    pub fn parse_clock(value: &str) -> CondenseResult<Self> {
        parse_clock_duration(value)
            .map(Self::from_duration)
            .ok_or_else(|| CondenseError::Validation(format!("Invalid timestamp: '{}'", value)))
    }
}

/// Split a clock string into a duration, honoring any number of fractional digits
fn parse_clock_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (clock, fraction) = match value.split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, fraction),
        None => (value, ""),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let mut seconds: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let n: u64 = part.parse().ok()?;
        // Minutes and seconds must stay in range once an hour/minute field precedes them
        if i > 0 && n >= 60 {
            return None;
        }
        seconds = seconds.checked_mul(60)?.checked_add(n)?;
    }

    let nanos = if fraction.is_empty() {
        0
    } else {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Keep nine digits of precision, the rest is below a nanosecond
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse::<u32>().ok()?
    };

    Some(Duration::new(seconds, nanos))
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let seconds = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;
        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

impl FromStr for Timestamp {
    type Err = CondenseError;

    fn from_str(s: &str) -> CondenseResult<Self> {
        Self::parse_clock(s)
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

impl TryFrom<Delta> for Timestamp {
    type Error = CondenseError;

    fn try_from(delta: Delta) -> CondenseResult<Self> {
        u64::try_from(delta.0).map(Timestamp).map_err(|_| {
            CondenseError::InvariantViolation(format!(
                "Negative delta {} cannot be used as a timestamp",
                delta
            ))
        })
    }
}

impl Sub for Timestamp {
    type Output = Delta;

    fn sub(self, rhs: Timestamp) -> Delta {
        Delta(self.0 as i64 - rhs.0 as i64)
    }
}

/// Adding a delta clamps at the track's zero point
impl Add<Delta> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Delta) -> Timestamp {
        self.checked_add(rhs).unwrap_or(Timestamp::ZERO)
    }
}

impl Delta {
    /// Create a delta from signed milliseconds
    pub const fn from_millis(ms: i64) -> Self {
        Delta(ms)
    }

    /// Signed length in milliseconds
    pub const fn total_milliseconds(&self) -> i64 {
        self.0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl From<Timestamp> for Delta {
    fn from(timestamp: Timestamp) -> Self {
        Delta(timestamp.0 as i64)
    }
}

impl Sub for Delta {
    type Output = Delta;

    fn sub(self, rhs: Delta) -> Delta {
        Delta(self.0 - rhs.0)
    }
}

impl Add for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Delta {
        Delta(self.0 + rhs.0)
    }
}

impl Neg for Delta {
    type Output = Delta;

    fn neg(self) -> Delta {
        Delta(-self.0)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
