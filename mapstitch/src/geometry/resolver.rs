//! Element reference resolution
//!
//! Expands an element reference into renderable segments by querying the
//! geometry service, recursively walking relation members, and degrading
//! query precision on upstream timeouts.

use tracing::warn;

use super::{
    ElementGeometry, ElementKind, ElementRef, GeometryClient, GeometryError, Precision,
    RelationMember, RenderSegment,
};

/// Relation nesting depth beyond which sub-relations are queried in
/// center-point mode only. Bounds total query cost for deeply nested
/// relations; shape fidelity is lost for those members but resolution
/// always terminates.
const CENTER_ONLY_DEPTH: u8 = 1;

/// Resolves element references into render segments.
///
/// Recursion over relation members is sequential: each nested query
/// depends on knowing the member is a relation, and sequential execution
/// keeps the per-tier retry bookkeeping simple.
pub struct GeometryResolver<C: GeometryClient> {
    client: C,
}

impl<C: GeometryClient> GeometryResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Resolves one element into segments. `depth` is 0 for a top-level
    /// reference and grows by one per nested relation.
    ///
    /// # Errors
    ///
    /// [`GeometryError::NotFound`] when the element does not exist, and
    /// [`GeometryError::Timeout`] only after every degradation tier has
    /// timed out in turn.
    pub async fn resolve(
        &self,
        element: ElementRef,
        depth: u8,
    ) -> Result<Vec<RenderSegment>, GeometryError> {
        let precision = match element.kind {
            ElementKind::Relation if depth > CENTER_ONLY_DEPTH => Precision::Center,
            _ => Precision::Full,
        };
        let geometry = self.query_degrading(element, precision).await?;
        self.segments_from(element, geometry, depth).await
    }

    /// Runs a query, stepping down the precision ladder on timeout.
    /// One attempt per tier, never more.
    async fn query_degrading(
        &self,
        element: ElementRef,
        precision: Precision,
    ) -> Result<ElementGeometry, GeometryError> {
        let mut tier = precision;
        loop {
            match self.client.query(element, tier).await {
                Ok(geometry) => return Ok(geometry),
                Err(GeometryError::Timeout) => match tier.degraded() {
                    Some(next) => {
                        warn!(element = %element, from = ?tier, to = ?next, "query timed out, degrading");
                        tier = next;
                    }
                    None => return Err(GeometryError::Timeout),
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn segments_from(
        &self,
        element: ElementRef,
        geometry: ElementGeometry,
        depth: u8,
    ) -> Result<Vec<RenderSegment>, GeometryError> {
        match geometry {
            ElementGeometry::Point(p) => Ok(vec![RenderSegment::from_point(p)]),
            ElementGeometry::Line(points) => Ok(vec![RenderSegment::new(points)]),
            ElementGeometry::Bounds(bbox) => Ok(vec![RenderSegment::from_bounds(bbox)]),
            ElementGeometry::Members(members) => {
                let mut segments = Vec::with_capacity(members.len());
                for member in members {
                    match member {
                        RelationMember::Node(p) => segments.push(RenderSegment::from_point(p)),
                        RelationMember::Way(points) => segments.push(RenderSegment::new(points)),
                        RelationMember::Relation(id) => {
                            let nested = ElementRef::new(ElementKind::Relation, id);
                            let resolved =
                                Box::pin(self.resolve(nested, depth + 1)).await.map_err(
                                    |e| match e {
                                        GeometryError::NotFound(_) => GeometryError::Service(
                                            format!("member {} of {} not found", nested, element),
                                        ),
                                        other => other,
                                    },
                                )?;
                            segments.extend(resolved);
                        }
                    }
                }
                Ok(segments)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{BoundingBox, GeoPoint};
    use parking_lot::Mutex;

    /// Scripted geometry client recording every query it receives.
    struct MockGeometryClient {
        respond: Box<dyn Fn(ElementRef, Precision) -> Result<ElementGeometry, GeometryError> + Send + Sync>,
        queries: Mutex<Vec<(ElementRef, Precision)>>,
    }

    impl MockGeometryClient {
        fn new(
            respond: impl Fn(ElementRef, Precision) -> Result<ElementGeometry, GeometryError>
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                respond: Box::new(respond),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl GeometryClient for MockGeometryClient {
        async fn query(
            &self,
            element: ElementRef,
            precision: Precision,
        ) -> Result<ElementGeometry, GeometryError> {
            self.queries.lock().push((element, precision));
            (self.respond)(element, precision)
        }
    }

    fn node(id: u64) -> ElementRef {
        ElementRef::new(ElementKind::Node, id)
    }

    fn relation(id: u64) -> ElementRef {
        ElementRef::new(ElementKind::Relation, id)
    }

    #[tokio::test]
    async fn test_node_resolves_to_single_point_segment() {
        let client = MockGeometryClient::new(|_, _| {
            Ok(ElementGeometry::Point(GeoPoint::new(51.5, -0.12)))
        });
        let resolver = GeometryResolver::new(client);

        let segments = resolver.resolve(node(1), 0).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_point());
        assert_eq!(segments[0].points[0], GeoPoint::new(51.5, -0.12));
    }

    #[tokio::test]
    async fn test_way_resolves_to_one_segment() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.1, 0.1),
            GeoPoint::new(0.2, 0.1),
        ];
        let expected = points.clone();
        let client = MockGeometryClient::new(move |_, _| Ok(ElementGeometry::Line(points.clone())));
        let resolver = GeometryResolver::new(client);

        let segments = resolver
            .resolve(ElementRef::new(ElementKind::Way, 7), 0)
            .await
            .unwrap();
        assert_eq!(segments, vec![RenderSegment::new(expected)]);
    }

    #[tokio::test]
    async fn test_relation_members_become_segments_in_order() {
        let client = MockGeometryClient::new(|elem, _| match elem.id {
            10 => Ok(ElementGeometry::Members(vec![
                RelationMember::Way(vec![GeoPoint::new(1.0, 1.0), GeoPoint::new(1.0, 2.0)]),
                RelationMember::Node(GeoPoint::new(3.0, 3.0)),
            ])),
            _ => Err(GeometryError::NotFound(elem)),
        });
        let resolver = GeometryResolver::new(client);

        let segments = resolver.resolve(relation(10), 0).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert!(segments[1].is_point());
    }

    #[tokio::test]
    async fn test_nested_relations_resolved_recursively() {
        let client = MockGeometryClient::new(|elem, precision| match elem.id {
            1 => Ok(ElementGeometry::Members(vec![RelationMember::Relation(2)])),
            2 => {
                assert_eq!(precision, Precision::Full);
                Ok(ElementGeometry::Members(vec![RelationMember::Node(
                    GeoPoint::new(9.0, 9.0),
                )]))
            }
            _ => Err(GeometryError::NotFound(elem)),
        });
        let resolver = GeometryResolver::new(client);

        let segments = resolver.resolve(relation(1), 0).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].points[0], GeoPoint::new(9.0, 9.0));
    }

    #[tokio::test]
    async fn test_deeply_nested_relations_queried_center_only() {
        let client = MockGeometryClient::new(|elem, precision| match elem.id {
            1 => Ok(ElementGeometry::Members(vec![RelationMember::Relation(2)])),
            2 => Ok(ElementGeometry::Members(vec![RelationMember::Relation(3)])),
            3 => {
                // depth 2 exceeds the center-only threshold
                assert_eq!(precision, Precision::Center);
                Ok(ElementGeometry::Point(GeoPoint::new(42.0, 13.0)))
            }
            _ => Err(GeometryError::NotFound(elem)),
        });
        let resolver = GeometryResolver::new(client);

        let segments = resolver.resolve(relation(1), 0).await.unwrap();
        assert_eq!(segments, vec![RenderSegment::from_point(GeoPoint::new(42.0, 13.0))]);
    }

    #[tokio::test]
    async fn test_timeout_degrades_full_to_bounds() {
        let bbox = BoundingBox {
            min_lat: 59.4,
            max_lat: 59.5,
            min_lon: 24.6,
            max_lon: 24.7,
        };
        let client = MockGeometryClient::new(move |_, precision| match precision {
            Precision::Full => Err(GeometryError::Timeout),
            Precision::Bounds => Ok(ElementGeometry::Bounds(bbox)),
            Precision::Center => panic!("ladder must stop at the first tier that answers"),
        });
        let resolver = GeometryResolver::new(client);

        let segments = resolver.resolve(relation(60189), 0).await.unwrap();
        assert_eq!(segments, vec![RenderSegment::from_bounds(bbox)]);
        assert_eq!(
            resolver.client.queries.lock().as_slice(),
            &[
                (relation(60189), Precision::Full),
                (relation(60189), Precision::Bounds)
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_falls_through_to_center() {
        let client = MockGeometryClient::new(|_, precision| match precision {
            Precision::Center => Ok(ElementGeometry::Point(GeoPoint::new(59.43, 24.75))),
            _ => Err(GeometryError::Timeout),
        });
        let resolver = GeometryResolver::new(client);

        let segments = resolver.resolve(relation(1), 0).await.unwrap();
        assert!(segments[0].is_point());
        assert_eq!(resolver.client.queries.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_after_all_tiers() {
        let client = MockGeometryClient::new(|_, _| Err(GeometryError::Timeout));
        let resolver = GeometryResolver::new(client);

        let result = resolver.resolve(relation(1), 0).await;
        assert_eq!(result, Err(GeometryError::Timeout));
        // Exactly one attempt per tier.
        assert_eq!(resolver.client.queries.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let client = MockGeometryClient::new(|elem, _| Err(GeometryError::NotFound(elem)));
        let resolver = GeometryResolver::new(client);

        let result = resolver.resolve(node(404), 0).await;
        assert_eq!(result, Err(GeometryError::NotFound(node(404))));
        assert_eq!(resolver.client.queries.lock().len(), 1);
    }
}
