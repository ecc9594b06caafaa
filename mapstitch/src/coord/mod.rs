//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the Web Mercator tile pyramid used by slippy-map tile servers, plus
//! the tile-to-canvas-pixel mapping used when compositing and drawing.
//!
//! All functions here are pure: degrees in, fractional tile units or pixels
//! out, no I/O and no failure modes beyond the documented clamping.

mod types;

pub use types::{
    BoundingBox, GeoPoint, TileCoord, TileWindow, BBOX_EPSILON, LAT_CLAMP, MAX_ZOOM, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Number of tiles along one axis of the pyramid at a zoom level.
#[inline]
pub fn tile_count(zoom: u8) -> f64 {
    2.0_f64.powi(i32::from(zoom))
}

/// Converts a geographic point to fractional tile coordinates.
///
/// Longitude maps linearly: `x = (lon + 180) / 360 * 2^zoom`. Latitude uses
/// the spherical Web Mercator transform, with the input clamped to
/// [-89°, 89°] first so the `ln(tan + sec)` term never goes infinite;
/// poleward inputs land on the top or bottom tile row.
#[inline]
pub fn to_tile(point: GeoPoint, zoom: u8) -> TileCoord {
    let n = tile_count(zoom);
    let x = (point.lon + 180.0) / 360.0 * n;
    let lat_rad = point.lat.clamp(-LAT_CLAMP, LAT_CLAMP).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    TileCoord {
        x,
        y: y.clamp(0.0, n),
        zoom,
    }
}

/// Converts a geographic point to integer tile indices.
///
/// The row is clamped into `[0, 2^zoom - 1]`; the column is the plain
/// floor and may need wrapping by the caller near the antimeridian.
#[inline]
pub fn to_tile_int(point: GeoPoint, zoom: u8) -> (i64, i64) {
    let tile = to_tile(point, zoom);
    let max_row = (tile_count(zoom) as i64) - 1;
    (tile.x.floor() as i64, (tile.y.floor() as i64).clamp(0, max_row))
}

/// Converts fractional tile coordinates back to geographic coordinates.
///
/// For integer inputs this is the northwest corner of the tile.
#[inline]
pub fn to_geo(zoom: u8, x: f64, y: f64) -> GeoPoint {
    let n = tile_count(zoom);
    let lon = x / n * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    GeoPoint {
        lat: lat_rad.to_degrees(),
        lon,
    }
}

/// Maps a fractional tile coordinate into canvas pixel space.
///
/// `px = round((x - x_min - offset_x) * tile_w)`, analogously for y.
/// Rounding is to the nearest integer, ties away from zero. Results may be
/// negative or beyond the canvas for coordinates outside the window; the
/// drawing layer clips.
#[inline]
pub fn to_pixel(coord: TileCoord, window: &TileWindow, tile_w: u32, tile_h: u32) -> (i64, i64) {
    let px = (coord.x - window.x_min as f64 - window.offset.0) * f64::from(tile_w);
    let py = (coord.y - window.y_min as f64 - window.offset.1) * f64::from(tile_h);
    (px.round() as i64, py.round() as i64)
}
