//! Utility functions for coordinate conversions and spatial operations
//!
//! All clustering math happens on the *map plane*: spherical Web Mercator scaled
//! so that the whole world spans `[-1, 1]` on both axes. At zoom 0 the world is
//! [`WORLD_SIZE_POINTS`] screen points wide, and each zoom level doubles that.

use geo::Point;

/// Lower edge of the map plane on both axes
pub const MAP_PLANE_MIN: f64 = -1.0;
/// Upper edge of the map plane on both axes
pub const MAP_PLANE_MAX: f64 = 1.0;
/// Width of the map plane
pub const MAP_PLANE_WIDTH: f64 = MAP_PLANE_MAX - MAP_PLANE_MIN;

/// Width of the whole world in screen points at zoom 0
pub const WORLD_SIZE_POINTS: f64 = 256.0;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Precomputed constant: 1.0 / 180.0
const LON_TO_X_FACTOR: f64 = 1.0 / 180.0;

/// Precomputed constant: 180.0
const X_TO_LON_FACTOR: f64 = 180.0;

/// Project WGS84 (lat, lon) onto the map plane
///
/// # Arguments
/// * `lat` - Latitude in degrees, clamped to the Web Mercator range
/// * `lon` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Point<f64>` with x (easting) and y (northing), both in `[-1, 1]`
#[inline(always)]
pub fn wgs84_to_map_point(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;

    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / std::f64::consts::PI;

    // MAX_LATITUDE is rounded, keep the result inside the plane
    Point::new(
        x.clamp(MAP_PLANE_MIN, MAP_PLANE_MAX),
        y.clamp(MAP_PLANE_MIN, MAP_PLANE_MAX),
    )
}

/// Convert a map plane point back to WGS84 (lat, lon)
///
/// # Returns
/// A tuple of (latitude, longitude) in degrees
#[inline(always)]
pub fn map_point_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat = (2.0 * (y * std::f64::consts::PI).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    (lat, lon)
}

/// Size of one screen point, in map plane units, at the given zoom
#[inline(always)]
pub fn map_units_per_point(zoom: f64) -> f64 {
    MAP_PLANE_WIDTH / (WORLD_SIZE_POINTS * 2f64.powf(zoom))
}

/// Check if a point lies on the map plane
#[inline(always)]
pub fn is_valid_map_point(point: &Point<f64>) -> bool {
    let x = point.x();
    let y = point.y();
    (MAP_PLANE_MIN..=MAP_PLANE_MAX).contains(&x) && (MAP_PLANE_MIN..=MAP_PLANE_MAX).contains(&y)
}
