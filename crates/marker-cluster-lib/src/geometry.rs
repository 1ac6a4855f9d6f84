//! Geographic value types
//!
//! [`LatLng`] and [`LatLngBounds`] are validated on construction, so every
//! instance that reaches the engine is known to be well formed.

use crate::{ClusterError, Result, utils};
use geo::{Coord, Point, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LatLng {
    /// Create a coordinate, rejecting values outside `[-90, 90]` x `[-180, 180]`
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ClusterError::CoordinateOutOfRange {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees
    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Project onto the map plane
    #[inline]
    pub fn to_map_point(&self) -> Point<f64> {
        let point = utils::wgs84_to_map_point(self.latitude, self.longitude);
        debug_assert!(utils::is_valid_map_point(&point));
        point
    }

    /// Convert a map plane point back to a coordinate
    pub fn from_map_point(point: Point<f64>) -> Result<Self> {
        let (lat, lon) = utils::map_point_to_wgs84(point.x(), point.y());
        Self::new(lat, lon)
    }
}

impl TryFrom<Point<f64>> for LatLng {
    type Error = ClusterError;

    /// Interprets the point as `x = longitude`, `y = latitude`
    fn try_from(point: Point<f64>) -> Result<Self> {
        Self::new(point.y(), point.x())
    }
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        Point::new(value.longitude, value.latitude)
    }
}

/// A closed latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLngBounds {
    south_west: LatLng,
    north_east: LatLng,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LatLngBounds {
    /// Create bounds from its corners
    ///
    /// Fails when a corner is not a valid coordinate or when a minimum exceeds its maximum.
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Result<Self> {
        let south_west = LatLng::new(min_lat, min_lng)?;
        let north_east = LatLng::new(max_lat, max_lng)?;
        if min_lat > max_lat || min_lng > max_lng {
            return Err(ClusterError::InvalidBounds(format!(
                "minimum ({min_lat}, {min_lng}) exceeds maximum ({max_lat}, {max_lng})"
            )));
        }
        Ok(Self {
            south_west,
            north_east,
        })
    }

    /// South-west (minimum) corner
    #[inline]
    pub fn south_west(&self) -> LatLng {
        self.south_west
    }

    /// North-east (maximum) corner
    #[inline]
    pub fn north_east(&self) -> LatLng {
        self.north_east
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, point: &LatLng) -> bool {
        point.latitude() >= self.south_west.latitude()
            && point.latitude() <= self.north_east.latitude()
            && point.longitude() >= self.south_west.longitude()
            && point.longitude() <= self.north_east.longitude()
    }

    /// The same rectangle on the map plane
    pub fn to_map_rect(&self) -> Rect<f64> {
        let min = self.south_west.to_map_point();
        let max = self.north_east.to_map_point();
        Rect::new(min.0, max.0)
    }
}

/// Build a map plane rectangle, failing fast on malformed corners
///
/// `geo::Rect::new` silently reorders its corners, which would hide caller bugs.
pub fn checked_rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Rect<f64>> {
    let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
    if !finite || min_x > max_x || min_y > max_y {
        return Err(ClusterError::InvalidBounds(format!(
            "malformed rectangle ({min_x}, {min_y}) -> ({max_x}, {max_y})"
        )));
    }
    Ok(Rect::new(
        Coord { x: min_x, y: min_y },
        Coord { x: max_x, y: max_y },
    ))
}

/// Square of half-width `radius` centered on `center`
pub fn square_around(center: Point<f64>, radius: f64) -> Result<Rect<f64>> {
    checked_rect(
        center.x() - radius,
        center.y() - radius,
        center.x() + radius,
        center.y() + radius,
    )
}

/// Closed rectangle containment test
#[inline(always)]
pub fn rect_contains(rect: &Rect<f64>, point: Point<f64>) -> bool {
    let min = rect.min();
    let max = rect.max();
    point.x() >= min.x && point.x() <= max.x && point.y() >= min.y && point.y() <= max.y
}

/// Closed rectangle intersection test (touching edges intersect)
#[inline(always)]
pub fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && a.max().x >= b.min().x && a.min().y <= b.max().y && a.max().y >= b.min().y
}
