//! Per-cell bucket storage.
//!
//! A bucket holds whatever the owning grid stores per cell: particle
//! referrals for the simulation grids, raw positions for the distance index.
//! Buckets are cleared between steps but never deallocated, so the capacity
//! built up during the first few steps is reused afterwards.

/// Initial capacity reserved per bucket.
///
/// Matches the expected occupancy of a cell whose edge equals the kernel
/// radius at typical particle spacings.
const INITIAL_BUCKET_CAPACITY: usize = 64;

/// Maximum number of neighbor buckets one query can return (the 3x3x3 block
/// around the containing cell, minus the containing cell itself).
pub const NEIGHBOR_BUNDLE_COUNT: usize = 26;

/// Identifies a particle without copying its data: the particle's index
/// inside its owning system, plus the id of that system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleReferral {
    /// Index of the particle inside its owning system's position array.
    pub particle_index: usize,
    /// Id of the owning particle system.
    pub system_id: u32,
}

impl ParticleReferral {
    /// Build a referral from an index and owning-system id.
    #[inline]
    pub fn new(particle_index: usize, system_id: u32) -> Self {
        Self {
            particle_index,
            system_id,
        }
    }
}

/// Growable contents of one grid cell.
#[derive(Debug, Clone)]
pub struct Bucket<T> {
    data: Vec<T>,
}

impl<T> Bucket<T> {
    /// Create an empty bucket with its working capacity pre-reserved.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(INITIAL_BUCKET_CAPACITY),
        }
    }

    /// Append one entry.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Empty the bucket, keeping its capacity for the next step.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The bucket contents as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Number of entries currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the bucket holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self::new()
    }
}
