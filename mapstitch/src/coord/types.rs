//! Coordinate types shared across the rendering pipeline.

use std::fmt;

/// Lowest zoom level of the tile pyramid.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level the pipeline will ever request.
pub const MAX_ZOOM: u8 = 19;

/// Latitudes are clamped to this magnitude before the Mercator transform.
///
/// `ln(tan + sec)` diverges at the poles; anything poleward of the clamp
/// maps to the top or bottom tile row.
pub const LAT_CLAMP: f64 = 89.0;

/// Expansion applied to each axis of a degenerate (zero-span) bounding box.
pub const BBOX_EPSILON: f64 = 1e-5;

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees, north positive.
    pub lat: f64,
    /// Longitude in degrees, east positive.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a new geographic point.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Fractional tile-pyramid coordinates.
///
/// `x` and `y` are continuous, not rounded to integer tile indices, so a
/// point can be placed at sub-tile pixel precision. `x` grows eastward,
/// `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCoord {
    pub x: f64,
    pub y: f64,
    pub zoom: u8,
}

/// A geographic bounding box.
///
/// Invariant: `min_lat <= max_lat` and `min_lon <= max_lon`. Boxes built
/// through [`BoundingBox::from_points`] additionally guarantee a non-zero
/// span on both axes (degenerate axes are expanded by [`BBOX_EPSILON`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Computes the bounding box of a set of points.
    ///
    /// Returns `None` for an empty iterator. Axes with zero span are
    /// expanded by [`BBOX_EPSILON`] in both directions so downstream zoom
    /// arithmetic never divides by zero.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bbox = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        for p in points {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.max_lon = bbox.max_lon.max(p.lon);
        }
        Some(bbox.expanded_if_degenerate())
    }

    fn expanded_if_degenerate(mut self) -> Self {
        if self.min_lat == self.max_lat {
            self.min_lat -= BBOX_EPSILON;
            self.max_lat += BBOX_EPSILON;
        }
        if self.min_lon == self.max_lon {
            self.min_lon -= BBOX_EPSILON;
            self.max_lon += BBOX_EPSILON;
        }
        self
    }

    /// Longitude span in degrees.
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// The arithmetic midpoint of the longitude range.
    pub fn center_lon(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }
}

/// The integer tile-index window covering one rendered canvas.
///
/// The viewport center rarely falls on a tile boundary, so the window
/// carries the fractional `offset` needed to align tiles under the
/// center. Indices are unwrapped: `x_min` may be negative or beyond
/// `2^zoom` near the antimeridian, and callers wrap the x index before
/// fetching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileWindow {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
    /// Sub-tile offset of the window origin, in tile units, `[0, 1)`.
    pub offset: (f64, f64),
}

impl TileWindow {
    /// Builds the window of `tiles_x` by `tiles_y` tiles centered on the
    /// given point at the given zoom.
    pub fn centered(center: GeoPoint, zoom: u8, tiles_x: u32, tiles_y: u32) -> Self {
        let c = super::to_tile(center, zoom);
        let origin_x = c.x - f64::from(tiles_x) / 2.0;
        let origin_y = c.y - f64::from(tiles_y) / 2.0;
        let x_min = origin_x.floor() as i64;
        let y_min = origin_y.floor() as i64;
        Self {
            x_min,
            x_max: x_min + i64::from(tiles_x) - 1,
            y_min,
            y_max: y_min + i64::from(tiles_y) - 1,
            offset: (origin_x - x_min as f64, origin_y - y_min as f64),
        }
    }
}
