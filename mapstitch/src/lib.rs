//! # Mapstitch
//!
//! A map-rendering pipeline for slippy-map tile servers: give it OSM
//! element references, explicit shapes or a viewport, and it produces a
//! stitched tile mosaic with the requested geometry drawn on top.
//!
//! The stages are usable on their own:
//!
//! - [`coord`] converts between geographic coordinates, the Web Mercator
//!   tile pyramid and canvas pixels.
//! - [`viewport`] picks the zoom and center framing a bounding box, and
//!   parses `#map=zoom/lat/lon` fragments.
//! - [`geometry`] resolves element references through a geometry service,
//!   degrading query precision when the upstream times out, and
//!   simplifies oversized segments.
//! - [`tile`] fetches tiles concurrently and composites the mosaic,
//!   tolerating individual tile failures.
//! - [`overlay`] draws segments, markers and status pins.
//! - [`limiter`] is a sliding-window rate limiter for front-ends that
//!   expose the renderer to users.
//!
//! [`MapRenderer`] wires the stages together:
//!
//! ```no_run
//! use mapstitch::{MapRenderer, RenderConfig, Viewport};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = MapRenderer::from_config(RenderConfig::default())?;
//! let viewport = Viewport::from_fragment("#map=16/40.7128/-74.0060")?;
//! let (canvas, failures) = renderer.render_viewport(&viewport).await?;
//! std::fs::write("map.png", canvas.encode_png()?)?;
//! # Ok(())
//! # }
//! ```

pub mod canvas;
pub mod config;
pub mod coord;
pub mod error;
pub mod geometry;
pub mod limiter;
pub mod overlay;
pub mod renderer;
pub mod tile;
pub mod viewport;

pub use canvas::{Canvas, PixmapCanvas};
pub use config::{ConfigError, RenderConfig};
pub use error::{FailureKind, RenderError, RenderFailure};
pub use geometry::{ElementKind, ElementRef, PointFeature, RenderSegment};
pub use limiter::{RateLimitConfig, RateLimiter};
pub use renderer::MapRenderer;
pub use viewport::Viewport;
