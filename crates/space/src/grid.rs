//! Uniform voxel grid over an axis-aligned domain.
//!
//! The grid buckets particles by cell so that a neighbor query only has to
//! scan the 3x3x3 block of cells around a position instead of every particle
//! in the simulation. Cell edge length is the interaction (kernel) radius,
//! which guarantees the 27-cell block covers all candidates.
//!
//! The grid is rebuilt once per step: `clear` then `fill`. Queries return
//! non-owning views into the bucket storage; the borrow ends before the next
//! rebuild can start.

use crate::bucket::{Bucket, ParticleReferral, NEIGHBOR_BUNDLE_COUNT};
use crate::error::SpaceError;
use crate::reflect::{ReflectedModality, ReflectionFlags};

/// Smallest accepted cell edge length. Anything below is rejected as
/// degenerate at construction.
pub const MIN_EDGE_LENGTH: f32 = 1.0e-8;

/// Cell counts of the grid on each axis. Strictly positive on all axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBoundary {
    /// Cell count along x.
    pub x: u32,
    /// Cell count along y.
    pub y: u32,
    /// Cell count along z.
    pub z: u32,
}

impl GridBoundary {
    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }
}

/// Which domain faces a cell touches, one placement per axis.
///
/// This is the boundary classification that decides which of the 26 neighbor
/// offsets stay in bounds: an offset is valid unless it steps below a
/// touched low face or above a touched high face. All 27 symmetric cases
/// (interior, 6 faces, 12 edges, 8 corners) are covered by the three
/// per-axis placements; a single-cell axis touches both faces at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionInDomain {
    at_low: [bool; 3],
    at_high: [bool; 3],
}

impl PositionInDomain {
    /// Classify a cell index against the grid boundary.
    pub fn classify(boundary: GridBoundary, coords: (u32, u32, u32)) -> Self {
        let last = [boundary.x - 1, boundary.y - 1, boundary.z - 1];
        let idx = [coords.0, coords.1, coords.2];
        Self {
            at_low: [idx[0] == 0, idx[1] == 0, idx[2] == 0],
            at_high: [idx[0] == last[0], idx[1] == last[1], idx[2] == last[2]],
        }
    }

    /// True when the offset keeps every axis inside `[0, boundary)`.
    #[inline]
    pub fn permits(&self, offset: (i32, i32, i32)) -> bool {
        let d = [offset.0, offset.1, offset.2];
        for axis in 0..3 {
            if (d[axis] < 0 && self.at_low[axis]) || (d[axis] > 0 && self.at_high[axis]) {
                return false;
            }
        }
        true
    }

    /// True when the cell touches no domain face at all.
    pub fn is_interior(&self) -> bool {
        !self.at_low.iter().chain(self.at_high.iter()).any(|&b| b)
    }
}

/// The result of one neighborhood query: the containing bucket plus up to 26
/// neighbor buckets.
///
/// `neighbors` is terminated by `None` when fewer than 26 slots are valid;
/// entries past the first `None` are never populated. `reflection` describes
/// which slots (if any) were wrapped to the opposite domain face; it is
/// empty for bounded queries.
#[derive(Debug)]
pub struct NeighborBundle<'g, T> {
    /// Contents of the cell containing the queried position. May include the
    /// queried particle itself.
    pub containing: &'g [T],
    /// Neighbor bucket contents, `None`-terminated.
    pub neighbors: [Option<&'g [T]>; NEIGHBOR_BUNDLE_COUNT],
    /// Per-slot reflection record for infinite-domain queries.
    pub reflection: ReflectedModality,
}

impl<T> NeighborBundle<'_, T> {
    /// Number of populated neighbor slots.
    pub fn neighbor_count(&self) -> usize {
        self.neighbors
            .iter()
            .position(Option::is_none)
            .unwrap_or(NEIGHBOR_BUNDLE_COUNT)
    }
}

/// Validate grid construction parameters shared by every grid flavour.
///
/// Returns the per-axis shift (most negative corner coordinate) and extent.
pub(crate) fn validate_domain(
    domain_max: [f32; 3],
    domain_min: [f32; 3],
    edge_length: f32,
) -> Result<([f32; 3], [f32; 3]), SpaceError> {
    if !edge_length.is_finite() || edge_length < MIN_EDGE_LENGTH {
        return Err(SpaceError::InvalidParameter(format!(
            "cell edge length {edge_length} is not a strictly positive finite value"
        )));
    }

    let mut shift = [0.0f32; 3];
    let mut extent = [0.0f32; 3];
    for axis in 0..3 {
        let lo = domain_min[axis].min(domain_max[axis]);
        let hi = domain_min[axis].max(domain_max[axis]);
        let diff = hi - lo;
        if !(diff > 0.0) {
            return Err(SpaceError::InvalidParameter(format!(
                "domain has no extent on axis {axis} (min {:?}, max {:?})",
                domain_min, domain_max
            )));
        }
        shift[axis] = lo;
        extent[axis] = diff;
    }
    Ok((shift, extent))
}

/// A 3-D array of buckets covering the domain at a fixed cell edge length.
///
/// Generic over the bucket payload: the simulation grids store
/// [`ParticleReferral`]s, the distance index stores raw positions.
#[derive(Debug, Clone)]
pub struct UniformGrid<T> {
    boundary: GridBoundary,
    /// Raw-index stride of the x coordinate (`boundary.y * boundary.z`).
    x_offset_coeff: u32,
    edge_length: f32,
    /// Most negative corner coordinate per axis; the grid's local origin.
    shift: [f32; 3],
    /// Domain extent per axis, used for mirror translations.
    extent: [f32; 3],
    buckets: Vec<Bucket<T>>,
    /// Incremented on every `clear`, for debug checks against stale views.
    generation: u64,
}

impl<T> UniformGrid<T> {
    /// Create a grid covering the box spanned by the two corners.
    ///
    /// Fails with [`SpaceError::InvalidParameter`] when `edge_length` is
    /// non-positive, NaN, or infinite, or when the domain is zero-sized on
    /// any axis.
    pub fn new(
        domain_max: [f32; 3],
        domain_min: [f32; 3],
        edge_length: f32,
    ) -> Result<Self, SpaceError> {
        let (shift, extent) = validate_domain(domain_max, domain_min, edge_length)?;

        let boundary = GridBoundary {
            x: (extent[0] / edge_length).ceil() as u32 + 1,
            y: (extent[1] / edge_length).ceil() as u32 + 1,
            z: (extent[2] / edge_length).ceil() as u32 + 1,
        };

        let mut buckets = Vec::new();
        buckets.resize_with(boundary.cell_count(), Bucket::default);

        Ok(Self {
            boundary,
            x_offset_coeff: boundary.y * boundary.z,
            edge_length,
            shift,
            extent,
            buckets,
            generation: 0,
        })
    }

    /// Cell counts per axis.
    pub fn boundary(&self) -> GridBoundary {
        self.boundary
    }

    /// The configured cell edge length.
    pub fn edge_length(&self) -> f32 {
        self.edge_length
    }

    /// Domain extent per axis.
    pub fn extent(&self) -> [f32; 3] {
        self.extent
    }

    /// Generation counter, incremented on every [`UniformGrid::clear`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }

    /// Map a position to its cell coordinates, clamped per axis.
    ///
    /// A position outside the domain is clamped to the nearest valid cell
    /// rather than rejected: the simulation may be locally unstable and a
    /// particle can momentarily leave the domain, which costs an approximate
    /// neighbor set but never a crash. This is the single cell-index code
    /// path used by both fill and query.
    pub fn cell_coords(&self, position: [f32; 3]) -> (u32, u32, u32) {
        let last = [
            self.boundary.x - 1,
            self.boundary.y - 1,
            self.boundary.z - 1,
        ];
        let mut coords = [0u32; 3];
        let mut clamped = false;
        for axis in 0..3 {
            let raw = ((position[axis] - self.shift[axis]) / self.edge_length).floor();
            if raw < 0.0 || raw > last[axis] as f32 {
                clamped = true;
            }
            coords[axis] = raw.max(0.0).min(last[axis] as f32) as u32;
        }
        if clamped {
            tracing::debug!(
                ?position,
                "position outside the partitioned domain, clamped to the nearest cell"
            );
        }
        (coords[0], coords[1], coords[2])
    }

    /// Flat bucket index for cell coordinates, x-major then y then z.
    #[inline]
    pub fn raw_index(&self, x: u32, y: u32, z: u32) -> usize {
        (x * self.x_offset_coeff + y * self.boundary.z + z) as usize
    }

    /// Contents of the bucket at a flat index from [`UniformGrid::raw_index`].
    pub fn bucket_at(&self, raw: usize) -> &[T] {
        self.buckets[raw].as_slice()
    }

    /// True when the position lies outside the configured domain box.
    pub fn is_outside(&self, position: [f32; 3]) -> bool {
        for axis in 0..3 {
            if position[axis] < self.shift[axis]
                || position[axis] > self.shift[axis] + self.extent[axis]
            {
                return true;
            }
        }
        false
    }

    /// Insert a value into the bucket containing `position`.
    pub fn insert(&mut self, position: [f32; 3], value: T) {
        let (x, y, z) = self.cell_coords(position);
        let index = self.raw_index(x, y, z);
        self.buckets[index].push(value);
    }

    /// Empty every bucket, keeping the grid shape and bucket capacity.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.generation += 1;
    }

    /// The bucket containing `position`, without its neighborhood.
    pub fn containing_bucket(&self, position: [f32; 3]) -> &[T] {
        let (x, y, z) = self.cell_coords(position);
        self.buckets[self.raw_index(x, y, z)].as_slice()
    }

    /// The containing bucket plus every in-bounds neighbor bucket.
    ///
    /// Offsets that would index outside `[0, boundary)` on any axis are
    /// omitted; the neighbor array is `None`-terminated. An interior cell
    /// yields all 26 slots, a corner cell only 7.
    pub fn bundles_at(&self, position: [f32; 3]) -> NeighborBundle<'_, T> {
        let coords = self.cell_coords(position);
        let placement = PositionInDomain::classify(self.boundary, coords);

        let mut neighbors = [None; NEIGHBOR_BUNDLE_COUNT];
        let mut slot = 0usize;
        self.for_each_offset(|offset| {
            if placement.permits(offset) {
                let x = (coords.0 as i32 + offset.0) as u32;
                let y = (coords.1 as i32 + offset.1) as u32;
                let z = (coords.2 as i32 + offset.2) as u32;
                neighbors[slot] = Some(self.buckets[self.raw_index(x, y, z)].as_slice());
                slot += 1;
            }
        });

        NeighborBundle {
            containing: self.buckets[self.raw_index(coords.0, coords.1, coords.2)].as_slice(),
            neighbors,
            reflection: ReflectedModality::none(self.extent),
        }
    }

    /// Infinite-domain variant of [`UniformGrid::bundles_at`].
    ///
    /// Out-of-bounds offsets are not dropped: each out-of-range axis wraps
    /// to the opposite side of the grid and the slot records the mirror in
    /// its reflection flags, one bit per wrapped axis. Every query therefore
    /// returns the full 26 slots, in-bounds slots first, wrapped slots
    /// after, so the reflection record only carries flags in its tail.
    ///
    /// Periodic callers keep positions inside the half-open domain box: a
    /// coordinate exactly on the far face belongs to the next period and
    /// must be stored at the near face, otherwise it lands in the grid's
    /// guard cell where no wrapped slot reaches it.
    pub fn bundles_at_wrapped(&self, position: [f32; 3]) -> NeighborBundle<'_, T> {
        let coords = self.cell_coords(position);
        let placement = PositionInDomain::classify(self.boundary, coords);

        let mut neighbors = [None; NEIGHBOR_BUNDLE_COUNT];
        let mut reflection = ReflectedModality::none(self.extent);
        let mut slot = 0usize;

        // In-bounds slots first, matching the bounded query's layout.
        self.for_each_offset(|offset| {
            if placement.permits(offset) {
                let x = (coords.0 as i32 + offset.0) as u32;
                let y = (coords.1 as i32 + offset.1) as u32;
                let z = (coords.2 as i32 + offset.2) as u32;
                neighbors[slot] = Some(self.buckets[self.raw_index(x, y, z)].as_slice());
                slot += 1;
            }
        });

        // Wrapped slots fill the remainder. Each out-of-range axis mirrors
        // independently, so edge and corner cells produce diagonal ghost
        // buckets whose flags compose two or three axes. The wrap period is
        // the cell count covering the domain extent (`boundary - 1`; the
        // +1 cell only catches positions on the far domain face), so the
        // ghost bucket is the one whose region the translation lands in.
        let last = [
            self.boundary.x - 1,
            self.boundary.y - 1,
            self.boundary.z - 1,
        ];
        self.for_each_offset(|offset| {
            if placement.permits(offset) {
                return;
            }
            let signed = [
                coords.0 as i32 + offset.0,
                coords.1 as i32 + offset.1,
                coords.2 as i32 + offset.2,
            ];
            let mut flags = ReflectionFlags::empty();
            let mut wrapped = [0u32; 3];
            for axis in 0..3 {
                let period = last[axis] as i32;
                if signed[axis] < 0 {
                    wrapped[axis] = (signed[axis] + period) as u32;
                    flags |= Self::from_high_flag(axis);
                } else if signed[axis] > last[axis] as i32 {
                    wrapped[axis] = (signed[axis] - period) as u32;
                    flags |= Self::from_low_flag(axis);
                } else {
                    wrapped[axis] = signed[axis] as u32;
                }
            }
            neighbors[slot] =
                Some(self.buckets[self.raw_index(wrapped[0], wrapped[1], wrapped[2])].as_slice());
            reflection.record(slot, flags);
            slot += 1;
        });

        NeighborBundle {
            containing: self.buckets[self.raw_index(coords.0, coords.1, coords.2)].as_slice(),
            neighbors,
            reflection,
        }
    }

    /// Visit the 26 neighbor offsets of the 3x3x3 cube in a fixed x-major
    /// order. Every neighbor-slot layout in this module depends on this
    /// order being stable.
    fn for_each_offset(&self, mut f: impl FnMut((i32, i32, i32))) {
        for dx in -1i32..=1 {
            for dy in -1i32..=1 {
                for dz in -1i32..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    f((dx, dy, dz));
                }
            }
        }
    }

    fn from_high_flag(axis: usize) -> ReflectionFlags {
        match axis {
            0 => ReflectionFlags::X_FROM_HIGH,
            1 => ReflectionFlags::Y_FROM_HIGH,
            _ => ReflectionFlags::Z_FROM_HIGH,
        }
    }

    fn from_low_flag(axis: usize) -> ReflectionFlags {
        match axis {
            0 => ReflectionFlags::X_FROM_LOW,
            1 => ReflectionFlags::Y_FROM_LOW,
            _ => ReflectionFlags::Z_FROM_LOW,
        }
    }
}

impl UniformGrid<ParticleReferral> {
    /// Append a referral for every position into its containing bucket.
    ///
    /// Does not clear first: successive fills from different systems
    /// accumulate into the same grid.
    pub fn fill(&mut self, positions: &[[f32; 3]], system_id: u32) {
        for (particle_index, position) in positions.iter().enumerate() {
            self.insert(*position, ParticleReferral::new(particle_index, system_id));
        }
    }
}
