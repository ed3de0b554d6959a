//! Reflected-modality bookkeeping for infinite (periodic) domains.
//!
//! When the domain is configured as unbounded, a query near a domain face
//! substitutes the bucket from the opposite face for each neighbor offset
//! that would fall outside the grid. Positions read from such a slot must be
//! translated by the domain extent on every mirrored axis before any
//! distance computation. This module records, per neighbor slot, which axes
//! were mirrored and in which direction.

use bitflags::bitflags;

use crate::bucket::NEIGHBOR_BUNDLE_COUNT;

bitflags! {
    /// Per-axis reflection flags for one neighbor slot.
    ///
    /// `*_FROM_HIGH` means the slot's bucket was read from the highmost cells
    /// of that axis because the queried cell sits on the low boundary; the
    /// ghost copy belongs just below the low face. `*_FROM_LOW` is the
    /// opposite case. Flags compose for edge and corner cells, one bit per
    /// mirrored axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReflectionFlags: u8 {
        /// Bucket read from the high end of x (query cell on the low face).
        const X_FROM_HIGH = 0b0000_0001;
        /// Bucket read from the low end of x (query cell on the high face).
        const X_FROM_LOW = 0b0000_0010;
        /// Bucket read from the high end of y.
        const Y_FROM_HIGH = 0b0000_0100;
        /// Bucket read from the low end of y.
        const Y_FROM_LOW = 0b0000_1000;
        /// Bucket read from the high end of z.
        const Z_FROM_HIGH = 0b0001_0000;
        /// Bucket read from the low end of z.
        const Z_FROM_LOW = 0b0010_0000;
    }
}

/// Per-query record of how each neighbor slot was reflected.
///
/// Produced fresh by every wrapped query; it does not outlive the bundle it
/// belongs to. Check [`ReflectedModality::summary`] first: when it is empty
/// no slot was reflected and the per-slot array holds nothing of interest.
#[derive(Debug, Clone, Copy)]
pub struct ReflectedModality {
    /// Union of all per-slot flags, for a cheap early skip.
    pub summary: ReflectionFlags,
    /// Flags for each of the up-to-26 neighbor slots, parallel to the
    /// bundle's neighbor array.
    pub slots: [ReflectionFlags; NEIGHBOR_BUNDLE_COUNT],
    /// Domain extent per axis, the magnitude of every mirror translation.
    pub domain_extent: [f32; 3],
}

impl ReflectedModality {
    /// Modality of a bounded query: nothing reflected.
    pub fn none(domain_extent: [f32; 3]) -> Self {
        Self {
            summary: ReflectionFlags::empty(),
            slots: [ReflectionFlags::empty(); NEIGHBOR_BUNDLE_COUNT],
            domain_extent,
        }
    }

    /// Record flags for one slot and fold them into the summary.
    pub(crate) fn record(&mut self, slot: usize, flags: ReflectionFlags) {
        self.slots[slot] = flags;
        self.summary |= flags;
    }

    /// The translation to add to every position read from `slot`.
    ///
    /// Signed toward the queried side: a bucket read from the high end of an
    /// axis is translated by minus the extent on that axis, so its ghost
    /// copies land just outside the low face next to the querying particle.
    pub fn translation(&self, slot: usize) -> [f32; 3] {
        let flags = self.slots[slot];
        let mut translation = [0.0f32; 3];
        if flags.contains(ReflectionFlags::X_FROM_HIGH) {
            translation[0] = -self.domain_extent[0];
        } else if flags.contains(ReflectionFlags::X_FROM_LOW) {
            translation[0] = self.domain_extent[0];
        }
        if flags.contains(ReflectionFlags::Y_FROM_HIGH) {
            translation[1] = -self.domain_extent[1];
        } else if flags.contains(ReflectionFlags::Y_FROM_LOW) {
            translation[1] = self.domain_extent[1];
        }
        if flags.contains(ReflectionFlags::Z_FROM_HIGH) {
            translation[2] = -self.domain_extent[2];
        } else if flags.contains(ReflectionFlags::Z_FROM_LOW) {
            translation[2] = self.domain_extent[2];
        }
        translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_modality_translates_to_zero() {
        let modality = ReflectedModality::none([10.0, 10.0, 10.0]);
        assert!(modality.summary.is_empty());
        assert_eq!(modality.translation(0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn single_axis_translation_is_signed_toward_query() {
        let mut modality = ReflectedModality::none([10.0, 20.0, 30.0]);
        modality.record(0, ReflectionFlags::X_FROM_HIGH);
        modality.record(1, ReflectionFlags::Y_FROM_LOW);
        assert_eq!(modality.translation(0), [-10.0, 0.0, 0.0]);
        assert_eq!(modality.translation(1), [0.0, 20.0, 0.0]);
        assert_eq!(
            modality.summary,
            ReflectionFlags::X_FROM_HIGH | ReflectionFlags::Y_FROM_LOW
        );
    }

    #[test]
    fn corner_translation_composes_all_flagged_axes() {
        let mut modality = ReflectedModality::none([10.0, 10.0, 10.0]);
        modality.record(
            5,
            ReflectionFlags::X_FROM_HIGH | ReflectionFlags::Y_FROM_HIGH | ReflectionFlags::Z_FROM_LOW,
        );
        assert_eq!(modality.translation(5), [-10.0, -10.0, 10.0]);
    }
}
