//! Great-circle helpers
//!
//!  Spherical-earth distance, bearing and projection in nautical miles.

use serde::Serialize;

/// Mean earth radius in nautical miles
const EARTH_RADIUS_NM: f64 = 3440.065;

/// A point on the earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLong {
    #[serde(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Long")]
    pub lon: f64,
}

impl LatLong {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Rectangle handed to the stream for subscription scoping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub low_lat: f64,
    pub low_lon: f64,
    pub hi_lat: f64,
    pub hi_lon: f64,
}

/// Distance between two points in nautical miles (Haversine formula)
pub fn distance_nm(from: LatLong, to: LatLong) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_NM * c
}

/// Initial bearing from `from` towards `to`, in degrees [0, 360)
pub fn bearing_degrees(from: LatLong, to: LatLong) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();
    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;

    // -0.0 % 360 stays negative zero, and tiny negatives can round up to 360
    if bearing >= 360.0 { 0.0 } else { bearing.abs() }
}

/// Point reached by travelling `distance` nautical miles from `from` on `bearing`
pub fn project(from: LatLong, bearing: f64, distance: f64) -> LatLong {
    let lat1 = from.lat.to_radians();
    let lon1 = from.lon.to_radians();
    let brg = bearing.to_radians();
    let angular = distance / EARTH_RADIUS_NM;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * brg.cos()).asin();
    let lon2 = lon1
        + (brg.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    // Normalise longitude into [-180, 180)
    let lon2 = (lon2.to_degrees() + 540.0) % 360.0 - 180.0;
    LatLong::new(lat2.to_degrees(), lon2)
}

/// Box spanning `radius` nautical miles north, south, east and west of `center`
pub fn observation_box(center: LatLong, radius: f64) -> BoundingBox {
    let south = project(center, 180.0, radius);
    let north = project(center, 0.0, radius);
    let west = project(center, 270.0, radius);
    let east = project(center, 90.0, radius);

    BoundingBox {
        low_lat: south.lat,
        low_lon: west.lon,
        hi_lat: north.lat,
        hi_lon: east.lon,
    }
}
