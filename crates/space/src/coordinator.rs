//! Per-category partition management.
//!
//! The simulation keeps one grid per particle category so a query can scan
//! fluid, dynamic-rigid, and static-rigid neighborhoods independently.
//! Static-rigid particles never move, so their grid is filled once and
//! survives the per-step clears of the dynamic categories.

use crate::bucket::ParticleReferral;
use crate::distance::DistanceIndex;
use crate::error::SpaceError;
use crate::grid::{validate_domain, NeighborBundle, UniformGrid};

/// The particle categories that get their own grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionCategory {
    /// Fluid particles, re-reordered every step.
    Fluid,
    /// Rigid-body particles that move, re-reordered every step.
    DynamicRigidBody,
    /// Rigid-body particles that never move, reordered once.
    StaticRigidBody,
}

impl PartitionCategory {
    /// All categories, in grid-slot order.
    pub const ALL: [PartitionCategory; 3] = [
        PartitionCategory::Fluid,
        PartitionCategory::DynamicRigidBody,
        PartitionCategory::StaticRigidBody,
    ];

    fn slot(self) -> usize {
        match self {
            PartitionCategory::Fluid => 0,
            PartitionCategory::DynamicRigidBody => 1,
            PartitionCategory::StaticRigidBody => 2,
        }
    }
}

impl std::fmt::Display for PartitionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PartitionCategory::Fluid => "fluid",
            PartitionCategory::DynamicRigidBody => "dynamic rigid body",
            PartitionCategory::StaticRigidBody => "static rigid body",
        };
        f.write_str(name)
    }
}

/// Owns one [`UniformGrid`] per category and dispatches queries to the
/// right one.
///
/// Writes are single-threaded: the step loop partitions and reorders, then
/// any number of readers may query until the next clear. No locks; the
/// borrow checker keeps queries from outliving a rebuild.
#[derive(Debug)]
pub struct PartitionCoordinator {
    grids: Option<[UniformGrid<ParticleReferral>; 3]>,
    domain_max: [f32; 3],
    domain_min: [f32; 3],
    partition_length: f32,
    infinite_domain: bool,
}

impl PartitionCoordinator {
    /// Validate and store the partitioning parameters. Grids are built by
    /// the first [`PartitionCoordinator::partition_space`] call.
    ///
    /// `partition_length` must equal the kernel support radius so the
    /// 27-cell query block covers every interaction candidate. With
    /// `infinite_domain` set, queries wrap across the domain faces instead
    /// of truncating at them.
    pub fn new(
        domain_max: [f32; 3],
        domain_min: [f32; 3],
        partition_length: f32,
        infinite_domain: bool,
    ) -> Result<Self, SpaceError> {
        validate_domain(domain_max, domain_min, partition_length)?;
        Ok(Self {
            grids: None,
            domain_max,
            domain_min,
            partition_length,
            infinite_domain,
        })
    }

    /// The configured cell edge length.
    pub fn partition_length(&self) -> f32 {
        self.partition_length
    }

    /// Whether queries wrap across the domain faces.
    pub fn is_infinite_domain(&self) -> bool {
        self.infinite_domain
    }

    /// (Re)create one empty grid per category at the current partition
    /// length. Discards every referral, static rigid bodies included.
    pub fn partition_space(&mut self) -> Result<(), SpaceError> {
        let make = || UniformGrid::new(self.domain_max, self.domain_min, self.partition_length);
        let grids = [make()?, make()?, make()?];
        tracing::info!(
            domain_min = ?self.domain_min,
            domain_max = ?self.domain_max,
            partition_length = self.partition_length,
            infinite_domain = self.infinite_domain,
            cells_per_grid = grids[0].cell_count(),
            "space partitions built"
        );
        self.grids = Some(grids);
        Ok(())
    }

    /// Bucket a particle system's positions into its category's grid.
    ///
    /// Successive calls for the same category accumulate, so several
    /// systems of one category share a grid and a single query sees them
    /// all. Fails with [`SpaceError::InvalidState`] before the first
    /// [`PartitionCoordinator::partition_space`].
    pub fn reorder(
        &mut self,
        positions: &[[f32; 3]],
        system_id: u32,
        category: PartitionCategory,
    ) -> Result<(), SpaceError> {
        let grids = self.grids.as_mut().ok_or_else(not_partitioned)?;
        grids[category.slot()].fill(positions, system_id);
        tracing::debug!(
            system_id,
            %category,
            particles = positions.len(),
            "reordered particle system"
        );
        Ok(())
    }

    /// The 27-cell neighborhood of `position` in the category's grid.
    ///
    /// Under an infinite domain the bundle always carries 26 neighbor
    /// slots, with wrapped slots flagged in its reflection record. Fails
    /// with [`SpaceError::InvalidState`] before the first
    /// [`PartitionCoordinator::partition_space`].
    pub fn bundles(
        &self,
        position: [f32; 3],
        category: PartitionCategory,
    ) -> Result<NeighborBundle<'_, ParticleReferral>, SpaceError> {
        let grids = self.grids.as_ref().ok_or_else(not_partitioned)?;
        let grid = &grids[category.slot()];
        Ok(if self.infinite_domain {
            grid.bundles_at_wrapped(position)
        } else {
            grid.bundles_at(position)
        })
    }

    /// Only the bucket containing `position`, without its neighborhood.
    pub fn containing_bundle(
        &self,
        position: [f32; 3],
        category: PartitionCategory,
    ) -> Result<&[ParticleReferral], SpaceError> {
        let grids = self.grids.as_ref().ok_or_else(not_partitioned)?;
        Ok(grids[category.slot()].containing_bucket(position))
    }

    /// Empty one category's grid. Does nothing before the first
    /// [`PartitionCoordinator::partition_space`].
    pub fn clear_reordering(&mut self, category: PartitionCategory) {
        if let Some(grids) = self.grids.as_mut() {
            grids[category.slot()].clear();
        }
    }

    /// Empty the fluid and dynamic-rigid grids for the next step. The
    /// static-rigid grid is untouched.
    pub fn clear_reordering_no_static(&mut self) {
        self.clear_reordering(PartitionCategory::Fluid);
        self.clear_reordering(PartitionCategory::DynamicRigidBody);
    }

    /// Change the cell edge length and rebuild every grid.
    ///
    /// All referrals are discarded, static rigid bodies included; every
    /// category must be reordered again before its queries are meaningful.
    pub fn set_partition_length(&mut self, partition_length: f32) -> Result<(), SpaceError> {
        validate_domain(self.domain_max, self.domain_min, partition_length)?;
        self.partition_length = partition_length;
        if self.grids.is_some() {
            self.partition_space()?;
        }
        Ok(())
    }

    /// True when the position lies outside the domain box. Under an
    /// infinite domain every position wraps to a neighborhood, so this only
    /// reports the box membership.
    pub fn is_outside_domain(&self, position: [f32; 3]) -> bool {
        for axis in 0..3 {
            let lo = self.domain_min[axis].min(self.domain_max[axis]);
            let hi = self.domain_min[axis].max(self.domain_max[axis]);
            if position[axis] < lo || position[axis] > hi {
                return true;
            }
        }
        false
    }

    /// Build a [`DistanceIndex`] for surface samplers, independent of the
    /// category grids.
    pub fn make_distance_index(
        domain_max: [f32; 3],
        domain_min: [f32; 3],
        edge_length: f32,
    ) -> Result<DistanceIndex, SpaceError> {
        DistanceIndex::new(domain_max, domain_min, edge_length)
    }
}

fn not_partitioned() -> SpaceError {
    SpaceError::InvalidState("the space has not been partitioned".to_owned())
}
