//! Linear score for a guess: 5 points lost per kilometre, 1 per 10 seconds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::Distance;

/// Points lost per kilometre of error.
pub const DISTANCE_PENALTY_PER_KM: f64 = 5.0;

/// Seconds of thinking time that cost one point.
pub const SECONDS_PER_PENALTY_POINT: f64 = 10.0;

/// Points awarded for one guess, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(100);

    /// Wraps a raw value, clamping it to `0..=100`.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    /// Scores a guess `distance` away from the target after `elapsed_secs` seconds.
    ///
    /// Negative or NaN elapsed time counts as zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(distance: Distance, elapsed_secs: f64) -> Self {
        let elapsed = elapsed_secs.max(0.0);
        let penalty = distance.km() * DISTANCE_PENALTY_PER_KM + elapsed / SECONDS_PER_PENALTY_POINT;
        let raw = (f64::from(Self::MAX.0) - penalty).max(0.0).round();
        Self(raw.min(f64::from(Self::MAX.0)) as u8)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
