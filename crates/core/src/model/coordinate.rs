use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CoordinateError {
    #[error("latitude must be a finite number, got {0}")]
    NonFiniteLatitude(f64),

    #[error("longitude must be a finite number, got {0}")]
    NonFiniteLongitude(f64),
}

//
// ─── COORDINATE ────────────────────────────────────────────────────────────────
//

/// A point on the globe in floating point degrees.
///
/// Both components are guaranteed finite; there is no range normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting NaN and infinities.
    ///
    /// # Errors
    ///
    /// Returns `CoordinateError` if either component is not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() {
            return Err(CoordinateError::NonFiniteLatitude(latitude));
        }
        if !longitude.is_finite() {
            return Err(CoordinateError::NonFiniteLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The (0, 0) fallback used for malformed targets.
    #[must_use]
    pub const fn origin() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    /// Builds a coordinate, collapsing to the origin if either component is unusable.
    #[must_use]
    pub fn or_origin(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude).unwrap_or_else(|_| Self::origin())
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

//
// ─── RAW TARGET FIELD ──────────────────────────────────────────────────────────
//

/// One component of a stored target: either a number or numeric text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TargetComponent {
    Number(f64),
    Text(String),
}

impl TargetComponent {
    fn value(&self) -> Option<f64> {
        match self {
            TargetComponent::Number(n) => Some(*n),
            TargetComponent::Text(s) => parse_leading_float(s),
        }
    }

    /// Mirrors the "is this field set" check the question store relies on:
    /// zero, NaN and empty text all count as unset.
    fn is_set(&self) -> bool {
        match self {
            TargetComponent::Number(n) => *n != 0.0 && !n.is_nan(),
            TargetComponent::Text(s) => !s.is_empty(),
        }
    }
}

/// The target of a question exactly as it arrives from the document store.
///
/// Documents have been authored in three shapes: a `[lat, lon]` pair, a
/// `{ latitude, longitude }` object, and a `"lat,lon"` string. Anything else
/// deserializes into `Unsupported` instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TargetField {
    Pair(Vec<TargetComponent>),
    Point {
        #[serde(default)]
        latitude: Option<TargetComponent>,
        #[serde(default)]
        longitude: Option<TargetComponent>,
    },
    Text(String),
    Unsupported(IgnoredAny),
}

impl TargetField {
    #[must_use]
    pub fn pair(latitude: f64, longitude: f64) -> Self {
        TargetField::Pair(vec![
            TargetComponent::Number(latitude),
            TargetComponent::Number(longitude),
        ])
    }

    #[must_use]
    pub fn point(latitude: f64, longitude: f64) -> Self {
        TargetField::Point {
            latitude: Some(TargetComponent::Number(latitude)),
            longitude: Some(TargetComponent::Number(longitude)),
        }
    }

    #[must_use]
    pub fn text(raw: impl Into<String>) -> Self {
        TargetField::Text(raw.into())
    }

    /// Resolves the stored target to a coordinate, falling back to (0, 0)
    /// whenever the data is malformed.
    #[must_use]
    pub fn resolve(&self) -> Coordinate {
        let parsed = match self {
            TargetField::Pair(parts) if parts.len() == 2 => {
                (parts[0].value(), parts[1].value())
            }
            TargetField::Point {
                latitude: Some(lat),
                longitude,
            } if lat.is_set() => (lat.value(), longitude.as_ref().and_then(TargetComponent::value)),
            TargetField::Text(raw) => {
                let mut parts = raw.split(',');
                (
                    parts.next().and_then(parse_leading_float),
                    parts.next().and_then(parse_leading_float),
                )
            }
            _ => (None, None),
        };

        match parsed {
            (Some(lat), Some(lon)) => Coordinate::or_origin(lat, lon),
            _ => Coordinate::origin(),
        }
    }
}

/// Parses the longest numeric prefix of `raw`, skipping leading whitespace.
///
/// `" 40.4abc"` yields `40.4`; `"abc"` yields `None`.
#[must_use]
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().ok();
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - (end + 1);
        if mantissa_digits + frac_digits > 0 {
            end = frac_end;
            mantissa_digits += frac_digits;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}
