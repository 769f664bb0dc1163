//! Great-circle distance and radius cutoff.

use chalkboards_core::{Coordinates, Radius};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Slack for comparing a haversine result against a radius typed by a user.
const RADIUS_EPSILON_MILES: f64 = 1e-9;

/// Haversine distance in miles between two lat/lng pairs given in degrees.
#[must_use]
pub fn distance_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

#[must_use]
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    distance_miles(a.lat, a.lng, b.lat, b.lng)
}

/// Whether `distance` passes the cutoff. [`Radius::Anywhere`] keeps everything.
#[must_use]
pub fn within_radius(distance: f64, radius: Radius) -> bool {
    match radius {
        Radius::Anywhere => true,
        Radius::Miles(r) => distance <= r + RADIUS_EPSILON_MILES,
    }
}
