//! Pipeline error types
//!
//! [`RenderError`] is the fatal error of a render request.
//! [`RenderFailure`] records a non-fatal, per-item failure (one element
//! that would not resolve, one tile that would not fetch); a request
//! collects these and still produces an image from whatever succeeded.

use std::fmt;

use thiserror::Error;

use crate::canvas::CanvasError;
use crate::geometry::{ElementRef, GeometryError};
use crate::tile::TileSourceError;

/// A fatal rendering error.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Tile(#[from] TileSourceError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// The caller's rate budget is exhausted.
    #[error("rate limit exceeded")]
    QuotaExceeded,

    /// Nothing resolved and nothing explicit was given to draw.
    #[error("nothing to render")]
    EmptyQueue,
}

/// What kind of work item a [`RenderFailure`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An element reference that could not be resolved.
    Element,
    /// A map tile that could not be fetched or pasted.
    MapTile,
}

/// One non-fatal failure collected during a render.
#[derive(Debug)]
pub struct RenderFailure {
    pub kind: FailureKind,
    /// What failed: an element reference or a tile label.
    pub subject: String,
    pub error: RenderError,
}

impl RenderFailure {
    pub fn element(element: ElementRef, error: GeometryError) -> Self {
        Self {
            kind: FailureKind::Element,
            subject: element.to_string(),
            error: error.into(),
        }
    }

    pub fn tile(label: impl Into<String>, error: impl Into<RenderError>) -> Self {
        Self {
            kind: FailureKind::MapTile,
            subject: label.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Element => write!(f, "element {}: {}", self.subject, self.error),
            FailureKind::MapTile => write!(f, "tile {}: {}", self.subject, self.error),
        }
    }
}
