//! Element geometry for the overlay
//!
//! Types describing the shapes a render request draws on top of the tile
//! mosaic, the [`GeometryClient`] abstraction over the external geodata
//! query service, and the resolver that expands element references into
//! renderable segments.

mod overpass;
mod resolver;
mod simplify;

pub use overpass::OverpassClient;
pub use resolver::GeometryResolver;
pub use simplify::simplify;

use std::fmt;

use thiserror::Error;

use crate::canvas::Color;
use crate::coord::{BoundingBox, GeoPoint};

/// The element kinds the geodata service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Node => write!(f, "node"),
            ElementKind::Way => write!(f, "way"),
            ElementKind::Relation => write!(f, "relation"),
        }
    }
}

/// A reference to one element of the geodata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: u64,
}

impl ElementRef {
    pub const fn new(kind: ElementKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// How much geometry a query should return.
///
/// The degradation ladder steps through these in order when the upstream
/// times out: full geometry, then just the bounding box, then only the
/// center point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Full,
    Bounds,
    Center,
}

impl Precision {
    /// The next cheaper tier, if any.
    pub fn degraded(self) -> Option<Self> {
        match self {
            Precision::Full => Some(Precision::Bounds),
            Precision::Bounds => Some(Precision::Center),
            Precision::Center => None,
        }
    }
}

/// Errors from the geometry query service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    /// The element does not exist upstream.
    #[error("element {0} was not found")]
    NotFound(ElementRef),

    /// The query exceeded the upstream time or quota budget. Retried
    /// internally via the degradation ladder before being surfaced.
    #[error("geometry query timed out")]
    Timeout,

    /// Transport failure or a malformed response.
    #[error("geometry service error: {0}")]
    Service(String),
}

/// Structured geometry returned by a [`GeometryClient`] query.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementGeometry {
    /// A single coordinate (nodes, or any element at center precision).
    Point(GeoPoint),
    /// An ordered coordinate sequence (ways).
    Line(Vec<GeoPoint>),
    /// Just the bounding box (bounds precision).
    Bounds(BoundingBox),
    /// A relation's members, in member order.
    Members(Vec<RelationMember>),
}

/// One member of a relation, as returned by the geometry service.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationMember {
    Node(GeoPoint),
    Way(Vec<GeoPoint>),
    /// A nested relation; carries only the reference and is resolved
    /// recursively by the [`GeometryResolver`].
    Relation(u64),
}

/// The external geodata query service.
///
/// Implementations must distinguish [`GeometryError::Timeout`] from
/// [`GeometryError::NotFound`]: the resolver retries the former through
/// the degradation ladder and surfaces the latter per element.
pub trait GeometryClient: Send + Sync {
    /// Queries one element at the given precision.
    fn query(
        &self,
        element: ElementRef,
        precision: Precision,
    ) -> impl std::future::Future<Output = Result<ElementGeometry, GeometryError>> + Send;
}

/// An ordered coordinate sequence to draw as a connected line, or as a
/// single marker when it holds one point.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSegment {
    /// Points in drawing order. Order is significant.
    pub points: Vec<GeoPoint>,
    /// Explicit color; `None` cycles the palette by segment index.
    pub color: Option<Color>,
}

impl RenderSegment {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self {
            points,
            color: None,
        }
    }

    /// A single-point segment, rendered as a marker only.
    pub fn from_point(point: GeoPoint) -> Self {
        Self::new(vec![point])
    }

    /// The closed five-point ring tracing a bounding box.
    pub fn from_bounds(bbox: BoundingBox) -> Self {
        Self::new(vec![
            GeoPoint::new(bbox.min_lat, bbox.min_lon),
            GeoPoint::new(bbox.min_lat, bbox.max_lon),
            GeoPoint::new(bbox.max_lat, bbox.max_lon),
            GeoPoint::new(bbox.max_lat, bbox.min_lon),
            GeoPoint::new(bbox.min_lat, bbox.min_lon),
        ])
    }

    /// Sets an explicit color, overriding the palette.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether this segment renders as a lone marker.
    pub fn is_point(&self) -> bool {
        self.points.len() == 1
    }
}

/// A status marker drawn as an icon, such as an open or resolved issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointFeature {
    pub point: GeoPoint,
    /// Selects the icon variant.
    pub resolved: bool,
}

/// Everything to be drawn for one request.
///
/// Owned exclusively by that request and discarded once the image is
/// produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderQueue {
    pub segments: Vec<RenderSegment>,
    pub features: Vec<PointFeature>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.features.is_empty()
    }

    /// All coordinates in the queue, for bounding-box computation.
    pub fn all_points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.segments
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .chain(self.features.iter().map(|f| f.point))
    }

    /// The bounding box of everything in the queue, `None` when empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.all_points())
    }
}
