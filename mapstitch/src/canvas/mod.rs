//! Canvas abstraction for compositing and drawing
//!
//! The compositor and overlay renderer only need a handful of raster
//! operations, so they are written against the [`Canvas`] trait and can be
//! unit-tested against an in-memory recording implementation without any
//! image codec. [`PixmapCanvas`] is the production implementation.

mod pixmap;

pub use pixmap::PixmapCanvas;

use thiserror::Error;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Icon variants for point features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    /// An open item, drawn in red.
    Open,
    /// A resolved item, drawn in green.
    Resolved,
}

/// Errors from canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Requested canvas dimensions were zero or overflowed.
    #[error("invalid canvas size {0}x{1}")]
    InvalidSize(u32, u32),

    /// A tile's bytes could not be decoded as an image.
    #[error("failed to decode tile image: {0}")]
    Decode(String),

    /// PNG encoding of the finished canvas failed.
    #[error("failed to encode canvas: {0}")]
    Encode(String),
}

/// The drawing operations the pipeline needs.
///
/// Coordinates are canvas pixels and may fall outside the canvas;
/// implementations clip. All mutation is synchronous and infallible
/// except tile decoding.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Decodes `data` (PNG or JPEG) and pastes it with its top-left
    /// corner at `(x, y)`.
    fn paste_tile(&mut self, data: &[u8], x: i64, y: i64) -> Result<(), CanvasError>;

    /// Draws a connected line through `points` in order.
    fn draw_polyline(&mut self, points: &[(i64, i64)], color: Color, width: f32);

    /// Draws a filled circular marker.
    fn draw_marker(&mut self, center: (i64, i64), radius: f32, color: Color);

    /// Draws a pin icon whose tip touches `anchor`.
    fn draw_icon(&mut self, icon: MarkerIcon, anchor: (i64, i64));
}
