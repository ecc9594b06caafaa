//! Overlay rendering
//!
//! Draws the render queue on top of the composited tile mosaic: segments
//! become polylines (with per-vertex markers while the scene is small),
//! single points become markers, and point features become status pins.

pub mod color;

use tracing::debug;

use crate::canvas::{Canvas, Color, MarkerIcon};
use crate::config::RenderConfig;
use crate::coord::{self, TileWindow};
use crate::geometry::{RenderQueue, RenderSegment};
use crate::viewport::Viewport;

/// Default segment colors, cycled by segment index when no explicit color
/// is set.
pub const PALETTE: [Color; 8] = [
    Color::new(31, 119, 180),
    Color::new(255, 127, 14),
    Color::new(44, 160, 44),
    Color::new(214, 39, 40),
    Color::new(148, 103, 189),
    Color::new(140, 86, 75),
    Color::new(227, 119, 194),
    Color::new(127, 127, 127),
];

/// Vertex markers are dropped on segments with at least this many points.
const MAX_MARKER_POINTS: usize = 80;

/// Vertex markers are dropped entirely in scenes with more segments than
/// this; crowded scenes read better as bare lines.
const MAX_MARKER_SEGMENTS: usize = 40;

const LINE_WIDTH: f32 = 3.0;
const MARKER_RADIUS: f32 = 4.0;

/// Draws everything in `queue` onto `canvas`.
///
/// Projection goes through the tile window the compositor used, so
/// overlay pixels line up with the pasted tiles exactly. Points outside
/// the canvas are handed to the canvas as-is; it clips.
pub fn draw_queue(
    canvas: &mut impl Canvas,
    queue: &RenderQueue,
    viewport: &Viewport,
    window: &TileWindow,
    config: &RenderConfig,
) {
    let sparse = queue.segments.len() <= MAX_MARKER_SEGMENTS;
    for (index, segment) in queue.segments.iter().enumerate() {
        let color = segment
            .color
            .unwrap_or(PALETTE[index % PALETTE.len()]);
        draw_segment(canvas, segment, color, sparse, viewport, window, config);
    }

    for feature in &queue.features {
        let icon = if feature.resolved {
            MarkerIcon::Resolved
        } else {
            MarkerIcon::Open
        };
        canvas.draw_icon(icon, project(feature.point, viewport, window, config));
    }
    debug!(
        segments = queue.segments.len(),
        features = queue.features.len(),
        "overlay drawn"
    );
}

fn draw_segment(
    canvas: &mut impl Canvas,
    segment: &RenderSegment,
    color: Color,
    sparse_scene: bool,
    viewport: &Viewport,
    window: &TileWindow,
    config: &RenderConfig,
) {
    let pixels: Vec<(i64, i64)> = segment
        .points
        .iter()
        .map(|&p| project(p, viewport, window, config))
        .collect();

    match pixels.as_slice() {
        [] => {}
        [point] => canvas.draw_marker(*point, MARKER_RADIUS, color),
        line => {
            canvas.draw_polyline(line, color, LINE_WIDTH);
            if sparse_scene && segment.len() < MAX_MARKER_POINTS {
                for &point in line {
                    canvas.draw_marker(point, MARKER_RADIUS, color);
                }
            }
        }
    }
}

fn project(
    point: crate::coord::GeoPoint,
    viewport: &Viewport,
    window: &TileWindow,
    config: &RenderConfig,
) -> (i64, i64) {
    coord::to_pixel(
        coord::to_tile(point, viewport.zoom),
        window,
        config.tile_width,
        config.tile_height,
    )
}
