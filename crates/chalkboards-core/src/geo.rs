use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Legacy radius value the front end used to mean "no distance cutoff".
pub const ANYWHERE_SENTINEL_MILES: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// `None` unless both components are finite.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }
}

/// Search radius around the user's location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Radius {
    Miles(f64),
    Anywhere,
}

impl Radius {
    /// Treats the `999` sentinel as [`Radius::Anywhere`].
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_miles(miles: f64) -> Self {
        if miles == ANYWHERE_SENTINEL_MILES || miles.is_infinite() {
            Radius::Anywhere
        } else {
            Radius::Miles(miles)
        }
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Radius::Miles(m) => write!(f, "{m} mi"),
            Radius::Anywhere => f.write_str("anywhere"),
        }
    }
}

impl FromStr for Radius {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("any") || trimmed.eq_ignore_ascii_case("anywhere") {
            return Ok(Radius::Anywhere);
        }
        let miles: f64 = trimmed
            .parse()
            .map_err(|_| format!("radius must be a number of miles or 'anywhere', got '{s}'"))?;
        if miles.is_nan() || miles < 0.0 {
            return Err(format!("radius must be non-negative, got '{s}'"));
        }
        Ok(Radius::from_miles(miles))
    }
}
