//! Three-phase actuation timing and travel direction.

use std::fmt;
use std::time::Duration;

use crate::error::TableError;
use crate::util::saturating_secs;

/// Travel direction along the channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accelerate, coast and decelerate durations in seconds.
///
/// Fields are finite and non-negative; `new` refuses anything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    accelerate_s: f64,
    coast_s: f64,
    decelerate_s: f64,
}

impl MotionProfile {
    pub fn new(accelerate_s: f64, coast_s: f64, decelerate_s: f64) -> Result<Self, TableError> {
        check_timing("accelerate_s", accelerate_s)?;
        check_timing("coast_s", coast_s)?;
        check_timing("decelerate_s", decelerate_s)?;
        Ok(Self {
            accelerate_s,
            coast_s,
            decelerate_s,
        })
    }

    /// For literal tables whose values are known to be valid.
    pub(crate) const fn from_trusted(accelerate_s: f64, coast_s: f64, decelerate_s: f64) -> Self {
        Self {
            accelerate_s,
            coast_s,
            decelerate_s,
        }
    }

    pub fn accelerate_s(&self) -> f64 {
        self.accelerate_s
    }

    pub fn coast_s(&self) -> f64 {
        self.coast_s
    }

    pub fn decelerate_s(&self) -> f64 {
        self.decelerate_s
    }

    /// Sum of the three phases in seconds.
    pub fn total_s(&self) -> f64 {
        self.accelerate_s + self.coast_s + self.decelerate_s
    }

    pub fn total(&self) -> Duration {
        saturating_secs(self.total_s())
    }

    /// Field-wise linear blend: `self + ratio * (other - self)`.
    ///
    /// `ratio` is clamped to [0, 1] so the result stays within both inputs.
    pub(crate) fn lerp(&self, other: &Self, ratio: f64) -> Self {
        let t = ratio.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + t * (b - a);
        Self {
            accelerate_s: mix(self.accelerate_s, other.accelerate_s),
            coast_s: mix(self.coast_s, other.coast_s),
            decelerate_s: mix(self.decelerate_s, other.decelerate_s),
        }
    }
}

fn check_timing(field: &'static str, value: f64) -> Result<(), TableError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TableError::BadTiming { field, value })
    }
}
