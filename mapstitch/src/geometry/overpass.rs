//! Overpass geometry client
//!
//! Production [`GeometryClient`] speaking the Overpass API JSON dialect.
//! Query shapes mirror the three precision tiers: `out skel geom` for full
//! geometry, `out bb` for bounds, `out skel center` for the center point.
//!
//! The wire format stays private to this module; the resolver only ever
//! sees [`ElementGeometry`].

use serde::Deserialize;
use tracing::debug;

use super::{
    ElementGeometry, ElementKind, ElementRef, GeometryClient, GeometryError, Precision,
    RelationMember,
};
use crate::coord::{BoundingBox, GeoPoint};

/// Server-side query budget, seconds. Mirrored into the query prologue so
/// Overpass aborts before our transport timeout fires.
const QUERY_TIMEOUT_SECS: u64 = 45;

/// Geometry client backed by an Overpass API endpoint.
pub struct OverpassClient {
    http: reqwest::Client,
    url: String,
}

impl OverpassClient {
    /// Creates a client for the given interpreter endpoint, for example
    /// `https://overpass-api.de/api/interpreter`.
    pub fn new(url: impl Into<String>, user_agent: &str) -> Result<Self, GeometryError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(QUERY_TIMEOUT_SECS + 5))
            .build()
            .map_err(|e| GeometryError::Service(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    fn build_query(element: ElementRef, precision: Precision) -> String {
        let out = match precision {
            Precision::Full => "skel geom",
            Precision::Bounds => "bb",
            Precision::Center => "skel center",
        };
        format!(
            "[out:json][timeout:{}];{}(id:{});out {};",
            QUERY_TIMEOUT_SECS, element.kind, element.id, out
        )
    }
}

impl GeometryClient for OverpassClient {
    async fn query(
        &self,
        element: ElementRef,
        precision: Precision,
    ) -> Result<ElementGeometry, GeometryError> {
        let query = Self::build_query(element, precision);
        debug!(query = %query, "querying overpass");

        let response = self
            .http
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeometryError::Timeout
                } else {
                    GeometryError::Service(e.to_string())
                }
            })?;

        match response.status().as_u16() {
            // Too Many Requests / Gateway Timeout both mean the server is
            // out of budget for us right now; both degrade.
            429 | 504 => return Err(GeometryError::Timeout),
            s if !response.status().is_success() => {
                return Err(GeometryError::Service(format!("HTTP {} from overpass", s)))
            }
            _ => {}
        }

        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|e| GeometryError::Service(format!("malformed overpass response: {}", e)))?;
        parse_response(body, element, precision)
    }
}

fn parse_response(
    body: OverpassResponse,
    element: ElementRef,
    precision: Precision,
) -> Result<ElementGeometry, GeometryError> {
    if let Some(remark) = &body.remark {
        if remark.contains("timed out") || remark.contains("out of memory") {
            return Err(GeometryError::Timeout);
        }
    }
    // A single-id query returns at most one top-level element.
    let raw = body
        .elements
        .into_iter()
        .next()
        .ok_or(GeometryError::NotFound(element))?;

    match precision {
        Precision::Center => raw
            .center
            .map(GeoPoint::from)
            .or_else(|| raw.point())
            .map(ElementGeometry::Point)
            .ok_or_else(|| malformed(element, "missing center")),
        Precision::Bounds => match raw.bounds {
            Some(b) => Ok(ElementGeometry::Bounds(b.into())),
            // Nodes have no bounds block, just their coordinate.
            None => raw
                .point()
                .map(ElementGeometry::Point)
                .ok_or_else(|| malformed(element, "missing bounds")),
        },
        Precision::Full => match element.kind {
            ElementKind::Node => raw
                .point()
                .map(ElementGeometry::Point)
                .ok_or_else(|| malformed(element, "missing coordinates")),
            ElementKind::Way => Ok(ElementGeometry::Line(
                raw.geometry.unwrap_or_default().into_iter().map(Into::into).collect(),
            )),
            ElementKind::Relation => Ok(ElementGeometry::Members(
                raw.members
                    .into_iter()
                    .filter_map(RawMember::into_member)
                    .collect(),
            )),
        },
    }
}

fn malformed(element: ElementRef, what: &str) -> GeometryError {
    GeometryError::Service(format!("{} in overpass result for {}", what, element))
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    lat: Option<f64>,
    lon: Option<f64>,
    geometry: Option<Vec<RawLatLon>>,
    bounds: Option<RawBounds>,
    center: Option<RawLatLon>,
    #[serde(default)]
    members: Vec<RawMember>,
}

impl RawElement {
    fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawLatLon {
    lat: f64,
    lon: f64,
}

impl From<RawLatLon> for GeoPoint {
    fn from(raw: RawLatLon) -> Self {
        GeoPoint::new(raw.lat, raw.lon)
    }
}

#[derive(Debug, Deserialize)]
struct RawBounds {
    minlat: f64,
    minlon: f64,
    maxlat: f64,
    maxlon: f64,
}

impl From<RawBounds> for BoundingBox {
    fn from(raw: RawBounds) -> Self {
        BoundingBox {
            min_lat: raw.minlat,
            max_lat: raw.maxlat,
            min_lon: raw.minlon,
            max_lon: raw.maxlon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "ref")]
    id: u64,
    geometry: Option<Vec<RawLatLon>>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl RawMember {
    /// Converts a raw member, dropping kinds this pipeline cannot draw.
    fn into_member(self) -> Option<RelationMember> {
        match self.kind.as_str() {
            "node" => match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => Some(RelationMember::Node(GeoPoint::new(lat, lon))),
                _ => None,
            },
            "way" => Some(RelationMember::Way(
                self.geometry.unwrap_or_default().into_iter().map(Into::into).collect(),
            )),
            "relation" => Some(RelationMember::Relation(self.id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str, element: ElementRef, precision: Precision) -> Result<ElementGeometry, GeometryError> {
        let body: OverpassResponse = serde_json::from_str(json).expect("valid fixture");
        parse_response(body, element, precision)
    }

    fn way(id: u64) -> ElementRef {
        ElementRef::new(ElementKind::Way, id)
    }

    #[test]
    fn test_query_strings_per_tier() {
        let elem = ElementRef::new(ElementKind::Relation, 60189);
        assert_eq!(
            OverpassClient::build_query(elem, Precision::Full),
            "[out:json][timeout:45];relation(id:60189);out skel geom;"
        );
        assert_eq!(
            OverpassClient::build_query(elem, Precision::Bounds),
            "[out:json][timeout:45];relation(id:60189);out bb;"
        );
        assert_eq!(
            OverpassClient::build_query(elem, Precision::Center),
            "[out:json][timeout:45];relation(id:60189);out skel center;"
        );
    }

    #[test]
    fn test_parse_node() {
        let json = r#"{"elements":[{"type":"node","id":1,"lat":51.5,"lon":-0.12}]}"#;
        let geometry = parse(json, ElementRef::new(ElementKind::Node, 1), Precision::Full).unwrap();
        assert_eq!(geometry, ElementGeometry::Point(GeoPoint::new(51.5, -0.12)));
    }

    #[test]
    fn test_parse_way_geometry() {
        let json = r#"{"elements":[{"type":"way","id":7,
            "geometry":[{"lat":0.0,"lon":0.0},{"lat":0.1,"lon":0.2}]}]}"#;
        let geometry = parse(json, way(7), Precision::Full).unwrap();
        assert_eq!(
            geometry,
            ElementGeometry::Line(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.1, 0.2)])
        );
    }

    #[test]
    fn test_parse_relation_members() {
        let json = r#"{"elements":[{"type":"relation","id":10,"members":[
            {"type":"way","ref":20,"geometry":[{"lat":1.0,"lon":1.0},{"lat":1.0,"lon":2.0}]},
            {"type":"node","ref":30,"lat":3.0,"lon":3.0},
            {"type":"relation","ref":40}
        ]}]}"#;
        let geometry = parse(json, ElementRef::new(ElementKind::Relation, 10), Precision::Full).unwrap();
        assert_eq!(
            geometry,
            ElementGeometry::Members(vec![
                RelationMember::Way(vec![GeoPoint::new(1.0, 1.0), GeoPoint::new(1.0, 2.0)]),
                RelationMember::Node(GeoPoint::new(3.0, 3.0)),
                RelationMember::Relation(40),
            ])
        );
    }

    #[test]
    fn test_parse_bounds() {
        let json = r#"{"elements":[{"type":"relation","id":10,
            "bounds":{"minlat":59.4,"minlon":24.6,"maxlat":59.5,"maxlon":24.7}}]}"#;
        let geometry = parse(json, ElementRef::new(ElementKind::Relation, 10), Precision::Bounds).unwrap();
        assert_eq!(
            geometry,
            ElementGeometry::Bounds(BoundingBox {
                min_lat: 59.4,
                max_lat: 59.5,
                min_lon: 24.6,
                max_lon: 24.7,
            })
        );
    }

    #[test]
    fn test_parse_center() {
        let json = r#"{"elements":[{"type":"relation","id":10,"center":{"lat":59.43,"lon":24.75}}]}"#;
        let geometry = parse(json, ElementRef::new(ElementKind::Relation, 10), Precision::Center).unwrap();
        assert_eq!(geometry, ElementGeometry::Point(GeoPoint::new(59.43, 24.75)));
    }

    #[test]
    fn test_empty_elements_is_not_found() {
        let json = r#"{"elements":[]}"#;
        let result = parse(json, way(404), Precision::Full);
        assert_eq!(result, Err(GeometryError::NotFound(way(404))));
    }

    #[test]
    fn test_timed_out_remark_is_timeout() {
        let json = r#"{"elements":[],"remark":"runtime error: Query timed out in \"query\""}"#;
        let result = parse(json, way(1), Precision::Full);
        assert_eq!(result, Err(GeometryError::Timeout));
    }

    #[test]
    fn test_unknown_member_kinds_are_dropped() {
        let json = r#"{"elements":[{"type":"relation","id":10,"members":[
            {"type":"area","ref":99},
            {"type":"node","ref":30,"lat":3.0,"lon":3.0}
        ]}]}"#;
        let geometry = parse(json, ElementRef::new(ElementKind::Relation, 10), Precision::Full).unwrap();
        assert_eq!(
            geometry,
            ElementGeometry::Members(vec![RelationMember::Node(GeoPoint::new(3.0, 3.0))])
        );
    }
}
