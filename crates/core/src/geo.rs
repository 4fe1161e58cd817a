//! Great-circle distance between two guesses on the globe.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A non-negative distance in kilometres, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Distance(f64);

impl Distance {
    pub const ZERO: Distance = Distance(0.0);

    /// Wraps a raw kilometre value, rounding to two decimals.
    ///
    /// Negative and non-finite inputs collapse to zero.
    #[must_use]
    pub fn from_km(km: f64) -> Self {
        if !km.is_finite() || km <= 0.0 {
            return Self::ZERO;
        }
        Self(round_to_hundredths(km))
    }

    /// Haversine distance between `a` and `b`.
    #[must_use]
    pub fn between(a: Coordinate, b: Coordinate) -> Self {
        Self::from_km(haversine_km(a, b))
    }

    #[must_use]
    pub fn km(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Unrounded haversine distance in kilometres.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude().to_radians().cos()
            * b.latitude().to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // float error can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rounds half away from zero on the binary value.
///
/// At exact decimal ties this can differ from a string-based two-decimal
/// formatter by one hundredth (13.485 rounds to 13.49 here but formats as
/// 13.48). Haversine outputs practically never land on such a tie.
fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
