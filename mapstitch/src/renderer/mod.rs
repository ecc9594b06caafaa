//! The rendering pipeline
//!
//! [`MapRenderer`] ties the stages together: resolve element references
//! into segments, simplify them, plan a viewport around everything to be
//! drawn, composite the tile mosaic and draw the overlay. Failures of
//! individual elements or tiles are collected, not fatal; the caller gets
//! an image plus the list of what is missing from it.

use tracing::info;

use crate::canvas::{Color, PixmapCanvas};
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderFailure};
use crate::geometry::{
    simplify, ElementRef, GeometryClient, GeometryResolver, OverpassClient, PointFeature,
    RenderQueue, RenderSegment,
};
use crate::overlay;
use crate::tile::{HttpTileSource, TileCompositor, TileSource};
use crate::viewport::Viewport;

/// Renders map images from element references, explicit shapes and point
/// features.
pub struct MapRenderer<G: GeometryClient, S: TileSource> {
    resolver: GeometryResolver<G>,
    compositor: TileCompositor<S>,
    config: RenderConfig,
}

impl MapRenderer<OverpassClient, HttpTileSource> {
    /// Builds a renderer against the configured production services.
    pub fn from_config(config: RenderConfig) -> Result<Self, RenderError> {
        let geometry = OverpassClient::new(&config.overpass_url, &config.user_agent)?;
        let tiles = HttpTileSource::new(&config.tile_url, &config.user_agent)?;
        Ok(Self::new(geometry, tiles, config))
    }
}

impl<G: GeometryClient, S: TileSource> MapRenderer<G, S> {
    pub fn new(geometry: G, tiles: S, config: RenderConfig) -> Self {
        Self {
            resolver: GeometryResolver::new(geometry),
            compositor: TileCompositor::new(tiles),
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders a map framing the given elements, shapes and features.
    /// Every element takes its colors from the palette; see
    /// [`render_colored`](Self::render_colored) for explicit colors.
    pub async fn render_elements(
        &self,
        elements: &[ElementRef],
        shapes: Vec<RenderSegment>,
        features: Vec<PointFeature>,
    ) -> Result<(PixmapCanvas, Vec<RenderFailure>), RenderError> {
        let elements: Vec<(ElementRef, Option<Color>)> =
            elements.iter().map(|&e| (e, None)).collect();
        self.render_colored(&elements, shapes, features).await
    }

    /// Renders a map framing the given elements, shapes and features,
    /// with an optional explicit color per element (such as a user-typed
    /// color name run through [`overlay::color::parse_color`]).
    ///
    /// Resolved element geometry is simplified; explicit `shapes` are
    /// drawn exactly as given. Elements that fail to resolve become
    /// [`RenderFailure`] entries and the image is produced from the rest.
    ///
    /// # Errors
    ///
    /// [`RenderError::EmptyQueue`] when nothing resolved and no explicit
    /// shapes or features were given, since there is no area to frame.
    pub async fn render_colored(
        &self,
        elements: &[(ElementRef, Option<Color>)],
        shapes: Vec<RenderSegment>,
        features: Vec<PointFeature>,
    ) -> Result<(PixmapCanvas, Vec<RenderFailure>), RenderError> {
        let mut failures = Vec::new();
        let mut resolved = Vec::new();
        for &(element, color) in elements {
            match self.resolver.resolve(element, 0).await {
                Ok(segments) => match color {
                    Some(c) => resolved.extend(segments.into_iter().map(|s| s.with_color(c))),
                    None => resolved.extend(segments),
                },
                Err(e) => failures.push(RenderFailure::element(element, e)),
            }
        }

        let mut segments = simplify(resolved);
        segments.extend(shapes);
        let queue = RenderQueue { segments, features };

        let bbox = queue.bounding_box().ok_or(RenderError::EmptyQueue)?;
        let mut viewport = Viewport::plan(bbox, &self.config);
        if !queue.features.is_empty() {
            // Keep some surroundings visible around status pins.
            viewport.zoom = viewport.zoom.min(self.config.max_marker_zoom);
        }

        let (canvas, mut tile_failures) = self.render_queue(&viewport, &queue).await?;
        failures.append(&mut tile_failures);
        info!(
            %viewport,
            elements = elements.len(),
            failures = failures.len(),
            "rendered elements"
        );
        Ok((canvas, failures))
    }

    /// Renders the bare tile mosaic for an explicit viewport.
    pub async fn render_viewport(
        &self,
        viewport: &Viewport,
    ) -> Result<(PixmapCanvas, Vec<RenderFailure>), RenderError> {
        self.render_queue(viewport, &RenderQueue::new()).await
    }

    async fn render_queue(
        &self,
        viewport: &Viewport,
        queue: &RenderQueue,
    ) -> Result<(PixmapCanvas, Vec<RenderFailure>), RenderError> {
        let mut canvas =
            PixmapCanvas::new(self.config.canvas_width(), self.config.canvas_height())?;
        let (window, failures) = self
            .compositor
            .composite(&mut canvas, viewport, &self.config)
            .await;
        overlay::draw_queue(&mut canvas, queue, viewport, &window, &self.config);
        Ok((canvas, failures))
    }
}
