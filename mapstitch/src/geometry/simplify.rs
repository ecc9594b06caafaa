//! Segment simplification
//!
//! Large ways can carry tens of thousands of nodes; drawing them all is
//! wasted effort at map scale. Segments below [`REDUCTION_THRESHOLD`]
//! points pass through untouched, larger ones are resampled down to
//! `floor(sqrt(n - 50)) + 50` points. The square-root decay keeps draw
//! cost sub-linear in input size while leaving small geometries exact.
//!
//! After reduction, segments that are exact duplicates of an earlier one
//! (same ordered point sequence) are dropped. Relation members commonly
//! share boundary ways, and drawing them twice only thickens lines.

use std::collections::HashSet;

use tracing::debug;

use super::RenderSegment;

/// Segments shorter than this are kept unchanged.
const REDUCTION_THRESHOLD: usize = 50;

/// Reduces point counts and removes duplicate segments.
///
/// The first and last point of every segment survive reduction; endpoints
/// visually anchor adjoining segments. Duplicate detection is structural
/// equality of the ordered point list, so two visually identical but
/// differently sampled segments are kept apart.
pub fn simplify(segments: Vec<RenderSegment>) -> Vec<RenderSegment> {
    let mut seen: HashSet<Vec<(u64, u64)>> = HashSet::with_capacity(segments.len());
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let reduced = reduce_points(segment);
        let key: Vec<(u64, u64)> = reduced
            .points
            .iter()
            .map(|p| (p.lat.to_bits(), p.lon.to_bits()))
            .collect();
        if seen.insert(key) {
            out.push(reduced);
        }
    }
    out
}

/// Resamples one segment down to its point budget.
fn reduce_points(segment: RenderSegment) -> RenderSegment {
    let n = segment.points.len();
    if n < REDUCTION_THRESHOLD {
        return segment;
    }

    let limit = ((n - REDUCTION_THRESHOLD) as f64).sqrt().floor() as usize + REDUCTION_THRESHOLD;
    let step = n as f64 / limit as f64;
    let mut points = Vec::with_capacity(limit + 1);
    let mut last_index = 0;
    for i in 0..limit {
        let index = (i as f64 * step) as usize;
        points.push(segment.points[index]);
        last_index = index;
    }
    if last_index != n - 1 {
        points.push(segment.points[n - 1]);
    }
    debug!(from = n, to = points.len(), "reduced segment");

    RenderSegment {
        points,
        color: segment.color,
    }
}
