//! Duplicate-aware position index.
//!
//! Used when sampling rigid surfaces or emitters: candidate positions are
//! admitted only if no already-accepted position lies within a rejection
//! radius. The index reuses [`UniformGrid`] with raw positions as payload,
//! so the duplicate scan only visits the 27-cell block around a candidate.

use crate::error::SpaceError;
use crate::grid::UniformGrid;

/// A grid-backed set of positions supporting minimum-spacing insertion.
#[derive(Debug, Clone)]
pub struct DistanceIndex {
    grid: UniformGrid<[f32; 3]>,
    accepted: usize,
}

impl DistanceIndex {
    /// Create an index over the given domain box.
    ///
    /// The rejection radius passed to [`DistanceIndex::insert_if_unique`]
    /// must not exceed `edge_length`, otherwise the 27-cell scan can miss
    /// stored positions beyond the adjacent cells. Fails with
    /// [`SpaceError::InvalidParameter`] under the same conditions as
    /// [`UniformGrid::new`].
    pub fn new(
        domain_max: [f32; 3],
        domain_min: [f32; 3],
        edge_length: f32,
    ) -> Result<Self, SpaceError> {
        let grid = UniformGrid::new(domain_max, domain_min, edge_length)?;
        Ok(Self { grid, accepted: 0 })
    }

    /// Number of accepted positions.
    pub fn len(&self) -> usize {
        self.accepted
    }

    /// True when no position has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.accepted == 0
    }

    /// Accept `position` unless an accepted position lies strictly within
    /// `sqrt(radius_squared)` of it.
    ///
    /// Returns `true` when such a position already existed and nothing was
    /// inserted, `false` when the position was accepted. The scan checks
    /// the containing bucket first and stops at the first position found
    /// within the radius.
    pub fn insert_if_unique(&mut self, position: [f32; 3], radius_squared: f32) -> bool {
        if self.has_neighbor_within(position, radius_squared) {
            return true;
        }
        self.grid.insert(position, position);
        self.accepted += 1;
        false
    }

    /// Every accepted position, in insertion-bucket order.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        let mut out = Vec::with_capacity(self.accepted);
        let boundary = self.grid.boundary();
        for x in 0..boundary.x {
            for y in 0..boundary.y {
                for z in 0..boundary.z {
                    let raw = self.grid.raw_index(x, y, z);
                    out.extend_from_slice(self.grid.bucket_at(raw));
                }
            }
        }
        out
    }

    /// Forget every accepted position, keeping the grid shape.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.accepted = 0;
    }

    fn has_neighbor_within(&self, position: [f32; 3], radius_squared: f32) -> bool {
        let bundle = self.grid.bundles_at(position);
        let buckets =
            std::iter::once(bundle.containing).chain(bundle.neighbors.iter().flatten().copied());
        for bucket in buckets {
            for other in bucket {
                if distance_squared_below(position, *other, radius_squared) {
                    return true;
                }
            }
        }
        false
    }
}

/// Accumulating squared-distance test with a per-axis early out: bail as
/// soon as the running sum reaches the threshold, skipping the remaining
/// axes. Strict comparison, so positions exactly the radius apart coexist.
#[inline]
fn distance_squared_below(a: [f32; 3], b: [f32; 3], threshold: f32) -> bool {
    let dx = a[0] - b[0];
    let mut acc = dx * dx;
    if acc >= threshold {
        return false;
    }
    let dy = a[1] - b[1];
    acc += dy * dy;
    if acc >= threshold {
        return false;
    }
    let dz = a[2] - b[2];
    acc += dz * dz;
    acc < threshold
}
