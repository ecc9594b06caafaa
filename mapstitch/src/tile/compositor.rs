//! Tile mosaic compositing
//!
//! Fetches every tile of a viewport's window concurrently and pastes the
//! ones that arrive onto the canvas. A tile that fails to fetch or decode
//! leaves a background-colored hole and a failure record; it never aborts
//! the render.

use futures::future::join_all;
use tracing::{debug, warn};

use super::TileSource;
use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::coord::{self, TileCoord, TileWindow};
use crate::error::RenderFailure;
use crate::viewport::Viewport;

/// Composites the tile mosaic for a viewport.
pub struct TileCompositor<S: TileSource> {
    source: S,
}

impl<S: TileSource> TileCompositor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fills `canvas` with the tiles covering `viewport`.
    ///
    /// The window is one tile wider and taller than the configured grid on
    /// the far edges only, not a full ring: the fractional center offset
    /// lies in `[0, 1)` and can only ever shift tiles up and left, so the
    /// strip it exposes is always on the right/bottom and a near-edge
    /// extra would never be visible. Columns wrap around the
    /// antimeridian; rows outside the pyramid are skipped.
    ///
    /// Returns the tile window (the overlay renderer projects through it)
    /// and one [`RenderFailure`] per tile that could not be drawn.
    pub async fn composite(
        &self,
        canvas: &mut impl Canvas,
        viewport: &Viewport,
        config: &RenderConfig,
    ) -> (TileWindow, Vec<RenderFailure>) {
        let zoom = viewport.zoom;
        let window = TileWindow::centered(viewport.center, zoom, config.tiles_x, config.tiles_y);
        let n = 1i64 << zoom;

        let mut jobs = Vec::new();
        for x in window.x_min..=window.x_max + 1 {
            let column = x.rem_euclid(n) as u32;
            for y in window.y_min.max(0)..=(window.y_max + 1).min(n - 1) {
                let row = y as u32;
                jobs.push(async move {
                    let bytes = self.source.fetch(zoom, column, row).await;
                    (x, y, self.source.label(zoom, column, row), bytes)
                });
            }
        }
        debug!(
            zoom,
            tiles = jobs.len(),
            x_min = window.x_min,
            y_min = window.y_min,
            "fetching tile window"
        );

        let mut failures = Vec::new();
        for (x, y, label, result) in join_all(jobs).await {
            let coord = TileCoord {
                x: x as f64,
                y: y as f64,
                zoom,
            };
            let (px, py) = coord::to_pixel(coord, &window, config.tile_width, config.tile_height);
            let pasted: Result<(), crate::error::RenderError> = match result {
                Ok(bytes) => canvas.paste_tile(&bytes, px, py).map_err(Into::into),
                Err(e) => Err(e.into()),
            };
            if let Err(error) = pasted {
                warn!(tile = %label, %error, "tile skipped");
                failures.push(RenderFailure::tile(label, error));
            }
        }
        (window, failures)
    }
}
