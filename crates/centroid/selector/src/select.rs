//! Nearest-centroid selection.
//!
//! One left-to-right pass keeps a running minimum distance. A strictly
//! closer candidate evicts every earlier one in a single mask operation,
//! a farther one drops itself, and ties stay put.

use std::cmp::Ordering;

use tracing::trace;

use crate::error::SelectorResult;
use crate::types::{CentroidSet, Mask, Point, UNSEEN_DISTANCE};

/// Returns the eligible centroids at minimum Manhattan distance from `query`.
///
/// The result is always a subset of `mask`, and is empty only when `mask`
/// is empty.
pub fn select(mask: Mask, centroids: &CentroidSet, query: Point) -> Mask {
    let (selected, _) = centroids.iter().enumerate().fold(
        (mask, UNSEEN_DISTANCE),
        |(working, best), (index, centroid)| {
            if !working.is_eligible(index) {
                return (working, best);
            }
            let distance = query.manhattan(centroid);
            match distance.cmp(&best) {
                Ordering::Less => (working.retaining_from(index), distance),
                Ordering::Greater => (working.without(index), best),
                Ordering::Equal => (working, best),
            }
        },
    );
    trace!(input = %mask, %query, result = %selected, "selected nearest centroids");
    selected
}

/// Validates raw input shape, then runs [`select`].
pub fn select_raw(mask: i64, centroids: &[Point], query: Point) -> SelectorResult<Mask> {
    let mask = Mask::try_from(mask)?;
    let centroids = CentroidSet::try_from(centroids)?;
    Ok(select(mask, &centroids, query))
}
