//! Viewport planning
//!
//! Picks the zoom level and center point that frame a geographic bounding
//! box on the fixed-size output canvas, and parses/formats the
//! `#map=zoom/lat/lon` URL fragments used to request an explicit viewport.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::RenderConfig;
use crate::coord::{self, BoundingBox, GeoPoint};

/// Zoom at and above which Mercator distortion is negligible for
/// centering purposes, so the plain latitude midpoint is used.
const SIMPLE_CENTER_ZOOM: u8 = 10;

/// Errors from viewport fragment parsing.
#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    /// The input did not look like `#map=zoom/lat/lon`.
    #[error("invalid map fragment `{0}`, expected `#map=zoom/lat/lon`")]
    InvalidFragment(String),
}

/// The chosen render target: a zoom level and a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: u8,
    pub center: GeoPoint,
}

impl Viewport {
    /// Plans the viewport framing `bbox` on the canvas described by `config`.
    ///
    /// The zoom is the largest level at which both axes of the box fit
    /// inside the canvas tile grid minus the configured margins, capped at
    /// `config.max_zoom`. Always returns a valid zoom; degenerate boxes
    /// must already have been expanded by [`BoundingBox::from_points`].
    pub fn plan(bbox: BoundingBox, config: &RenderConfig) -> Self {
        let zoom_x = Self::zoom_for_lon_span(bbox.lon_span(), config);
        let zoom_y = Self::zoom_for_lat_span(&bbox, config);
        let zoom = zoom_x.min(zoom_y).min(config.max_zoom);

        let center_lon = bbox.center_lon();
        let center_lat = if zoom < SIMPLE_CENTER_ZOOM {
            // Over large areas the latitude midpoint sits visibly off
            // center; use the midpoint of the projected tile-row range.
            let top = coord::to_tile(GeoPoint::new(bbox.max_lat, center_lon), zoom);
            let bottom = coord::to_tile(GeoPoint::new(bbox.min_lat, center_lon), zoom);
            coord::to_geo(zoom, top.x, (top.y + bottom.y) / 2.0).lat
        } else {
            (bbox.min_lat + bbox.max_lat) / 2.0
        };

        let viewport = Self {
            zoom,
            center: GeoPoint::new(center_lat, center_lon),
        };
        debug!(zoom, lat = center_lat, lon = center_lon, "planned viewport");
        viewport
    }

    /// Largest zoom at which the longitude span fits the drawable columns.
    ///
    /// Closed form: the span occupies `span / 360 * 2^zoom` columns.
    fn zoom_for_lon_span(lon_span: f64, config: &RenderConfig) -> u8 {
        let usable = config.usable_tiles_x();
        let zoom = (usable * 360.0 / lon_span).log2().floor();
        if zoom.is_nan() || zoom < 0.0 {
            0
        } else {
            zoom.min(f64::from(coord::MAX_ZOOM)) as u8
        }
    }

    /// Largest zoom at which the latitude span fits the drawable rows.
    ///
    /// Tile-row height is non-linear in latitude, so this walks down from
    /// `max_zoom + 1` instead of using a closed form.
    fn zoom_for_lat_span(bbox: &BoundingBox, config: &RenderConfig) -> u8 {
        let usable = config.usable_tiles_y();
        let mut zoom = config.max_zoom.saturating_add(1).min(coord::MAX_ZOOM);
        loop {
            let top = coord::to_tile(GeoPoint::new(bbox.max_lat, bbox.min_lon), zoom);
            let bottom = coord::to_tile(GeoPoint::new(bbox.min_lat, bbox.min_lon), zoom);
            if bottom.y - top.y <= usable || zoom == 0 {
                return zoom;
            }
            zoom -= 1;
        }
    }

    /// Parses an OSM-style URL fragment such as `#map=19/33.45/126.49`.
    ///
    /// The fragment may be embedded at the end of a longer URL. Latitude
    /// and longitude are not range-checked here; the projection clamps.
    pub fn from_fragment(input: &str) -> Result<Self, ViewportError> {
        static FRAGMENT: OnceLock<Regex> = OnceLock::new();
        let re = FRAGMENT.get_or_init(|| {
            Regex::new(r"#map=([0-9]+)/([+-]?(?:[0-9]*\.)?[0-9]+)/([+-]?(?:[0-9]*\.)?[0-9]+)")
                .expect("fragment regex is valid")
        });
        let caps = re
            .captures(input)
            .ok_or_else(|| ViewportError::InvalidFragment(input.to_string()))?;
        let zoom: u8 = caps[1]
            .parse()
            .map_err(|_| ViewportError::InvalidFragment(input.to_string()))?;
        let lat: f64 = caps[2]
            .parse()
            .map_err(|_| ViewportError::InvalidFragment(input.to_string()))?;
        let lon: f64 = caps[3]
            .parse()
            .map_err(|_| ViewportError::InvalidFragment(input.to_string()))?;
        Ok(Self {
            zoom,
            center: GeoPoint::new(lat, lon),
        })
    }
}

impl fmt::Display for Viewport {
    /// Formats as the `#map=zoom/lat/lon` fragment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#map={}/{:?}/{:?}",
            self.zoom, self.center.lat, self.center.lon
        )
    }
}
