use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};

/// Mean earth radius used for all distance calculations
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Points awarded for a guess at or within `PERFECT_RADIUS_M`
pub const MAX_POINTS: u32 = 500;
pub const PERFECT_RADIUS_M: f64 = 10.0;
/// Guesses at or beyond this distance score nothing
pub const ZERO_RADIUS_M: f64 = 250.0;

/// A latitude/longitude pair in degrees, known to be in range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Ok(Self { lat, lng })
        } else {
            Err(GameError::InvalidCoordinate { lat, lng })
        }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_m(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Great-circle distance in meters between two points given in degrees.
pub fn distance(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> Result<f64> {
    let a = Coordinate::new(lat_a, lng_a)?;
    let b = Coordinate::new(lat_b, lng_b)?;
    Ok(a.distance_to(&b))
}

fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Convert a guess distance into points.
///
/// Linear between 500 points at 10 m and 0 points at 250 m, clamped outside
/// that band. Fractional values round half-up, so 244 m (exactly 12.5)
/// scores 13.
pub fn score_from_distance(d: f64) -> Result<u32> {
    if d.is_nan() || d < 0.0 {
        return Err(GameError::InvalidDistance(d));
    }

    if d <= PERFECT_RADIUS_M {
        return Ok(MAX_POINTS);
    }
    if d >= ZERO_RADIUS_M {
        return Ok(0);
    }

    // same line as 500 * (1 - (d - 10) / 240), fewer inexact steps
    let span = ZERO_RADIUS_M - PERFECT_RADIUS_M;
    let points = (f64::from(MAX_POINTS) * (ZERO_RADIUS_M - d) / span).round();

    Ok(points as u32)
}
