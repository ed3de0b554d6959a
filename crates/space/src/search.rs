//! Neighborhood refinement: from candidate buckets to actual neighbors.
//!
//! A [`NeighborBundle`](crate::grid::NeighborBundle) only narrows the search
//! to the 27-cell block; this module applies the exact distance criterion,
//! excludes the queried particle itself, applies mirror translations to
//! wrapped slots, and caches the kernel evaluation per accepted neighbor so
//! the solver never recomputes it.

use crate::bucket::ParticleReferral;
use crate::grid::NeighborBundle;

/// Squared distance at or below which two particles are considered
/// coincident and skipped. Guards the `1/r` in kernel gradients.
pub const MIN_DISTANCE_SQUARED: f32 = 1.0e-9;

/// Smoothing kernel evaluated once per accepted neighbor.
///
/// Implementations are pure; `displacement` points from the neighbor to the
/// queried particle and `distance` is its precomputed norm.
pub trait SmoothingKernel {
    /// Kernel value and gradient for one particle pair.
    fn evaluate(&self, displacement: [f32; 3], distance: f32) -> (f32, [f32; 3]);
}

/// Read-only view over one particle system's positions for the duration of
/// a search. Callers pass every system that was reordered into the queried
/// grids; referral resolution never goes through globals.
#[derive(Debug, Clone, Copy)]
pub struct SystemPositions<'a> {
    /// Identifier matching the `system_id` used at reorder time.
    pub system_id: u32,
    /// True for fluid systems, false for rigid-body systems.
    pub is_fluid: bool,
    /// Current particle positions, indexed by `particle_index`.
    pub positions: &'a [[f32; 3]],
}

/// One accepted neighbor with everything the solver needs cached.
#[derive(Debug, Clone, Copy)]
pub struct NeighborInfo {
    /// System the neighbor belongs to.
    pub system_id: u32,
    /// Index of the neighbor inside its system.
    pub particle_index: usize,
    /// Displacement from the neighbor's effective position to the queried
    /// particle. For wrapped slots this is computed against the mirrored
    /// position, so it stays short across the domain seam.
    pub displacement: [f32; 3],
    /// Squared norm of `displacement`.
    pub distance_squared: f32,
    /// Norm of `displacement`.
    pub distance: f32,
    /// Whether the neighbor's system is a fluid.
    pub is_fluid: bool,
    /// Kernel value for this pair.
    pub w: f32,
    /// Kernel gradient for this pair.
    pub grad_w: [f32; 3],
}

/// Exact distance criterion with a per-axis early out.
///
/// Returns the displacement `current - other` and its squared norm when the
/// pair interacts: strictly closer than the kernel radius and strictly
/// farther than [`MIN_DISTANCE_SQUARED`]. Each axis is checked against the
/// radius on its own before the full sum is formed, which discards most of
/// the 27-cell block's false candidates after one subtraction.
#[inline]
pub fn is_neighbor(
    current: [f32; 3],
    other: [f32; 3],
    radius_squared: f32,
) -> Option<([f32; 3], f32)> {
    let dx = current[0] - other[0];
    let xx = dx * dx;
    if xx >= radius_squared {
        return None;
    }
    let dy = current[1] - other[1];
    let yy = dy * dy;
    if yy >= radius_squared {
        return None;
    }
    let dz = current[2] - other[2];
    let zz = dz * dz;
    if zz >= radius_squared {
        return None;
    }
    let norm_squared = xx + yy + zz;
    if norm_squared >= radius_squared || norm_squared <= MIN_DISTANCE_SQUARED {
        return None;
    }
    Some(([dx, dy, dz], norm_squared))
}

/// Scan a bundle and append every accepted neighbor to `out`.
///
/// The containing bucket is scanned with self-exclusion on the
/// `(particle_index, system_id)` identity, never by position: coincident
/// particles from other systems are still candidates. Neighbor slots hold
/// other cells, so they skip the identity check; slots with reflection
/// flags have the slot translation added to each candidate position before
/// the distance test.
///
/// `out` is not cleared first, so one particle's searches across several
/// category grids can share a list.
pub fn search_neighborhood<K: SmoothingKernel>(
    current_system_id: u32,
    current_index: usize,
    current_position: [f32; 3],
    bundle: &NeighborBundle<'_, ParticleReferral>,
    systems: &[SystemPositions<'_>],
    radius_squared: f32,
    kernel: &K,
    out: &mut Vec<NeighborInfo>,
) {
    let mut resolver = SystemResolver::new(systems);

    for referral in bundle.containing {
        if referral.particle_index == current_index && referral.system_id == current_system_id {
            continue;
        }
        accept_candidate(
            current_position,
            *referral,
            [0.0; 3],
            radius_squared,
            kernel,
            &mut resolver,
            out,
        );
    }

    let reflected = !bundle.reflection.summary.is_empty();
    for (slot, bucket) in bundle.neighbors.iter().enumerate() {
        let Some(bucket) = bucket else { break };
        let translation = if reflected {
            bundle.reflection.translation(slot)
        } else {
            [0.0; 3]
        };
        for referral in *bucket {
            accept_candidate(
                current_position,
                *referral,
                translation,
                radius_squared,
                kernel,
                &mut resolver,
                out,
            );
        }
    }
}

fn accept_candidate<K: SmoothingKernel>(
    current_position: [f32; 3],
    referral: ParticleReferral,
    translation: [f32; 3],
    radius_squared: f32,
    kernel: &K,
    resolver: &mut SystemResolver<'_, '_>,
    out: &mut Vec<NeighborInfo>,
) {
    let Some(system) = resolver.resolve(referral.system_id) else {
        return;
    };
    let base = system.positions[referral.particle_index];
    let other = [
        base[0] + translation[0],
        base[1] + translation[1],
        base[2] + translation[2],
    ];
    if let Some((displacement, distance_squared)) =
        is_neighbor(current_position, other, radius_squared)
    {
        let distance = distance_squared.sqrt();
        let (w, grad_w) = kernel.evaluate(displacement, distance);
        out.push(NeighborInfo {
            system_id: referral.system_id,
            particle_index: referral.particle_index,
            displacement,
            distance_squared,
            distance,
            is_fluid: system.is_fluid,
            w,
            grad_w,
        });
    }
}

/// Referral-to-system lookup with a one-entry cache. Buckets group
/// referrals by insertion order, so runs of the same system are common and
/// the cache avoids rescanning the slice for each referral.
struct SystemResolver<'a, 'p> {
    systems: &'a [SystemPositions<'p>],
    last: Option<usize>,
}

impl<'a, 'p> SystemResolver<'a, 'p> {
    fn new(systems: &'a [SystemPositions<'p>]) -> Self {
        Self { systems, last: None }
    }

    fn resolve(&mut self, system_id: u32) -> Option<SystemPositions<'p>> {
        if let Some(index) = self.last {
            let cached = self.systems[index];
            if cached.system_id == system_id {
                return Some(cached);
            }
        }
        let index = self.systems.iter().position(|s| s.system_id == system_id)?;
        self.last = Some(index);
        Some(self.systems[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::UniformGrid;

    /// Flat kernel for tests: value 1, gradient along the displacement.
    struct UnitKernel;

    impl SmoothingKernel for UnitKernel {
        fn evaluate(&self, displacement: [f32; 3], _distance: f32) -> (f32, [f32; 3]) {
            (1.0, displacement)
        }
    }

    #[test]
    fn is_neighbor_accepts_within_radius() {
        let (displacement, d2) =
            is_neighbor([1.0, 1.0, 1.0], [1.3, 1.0, 1.0], 0.25).unwrap();
        assert_eq!(displacement, [-0.3, 0.0, 0.0]);
        assert!((d2 - 0.09).abs() < 1.0e-6);
    }

    #[test]
    fn is_neighbor_rejects_radius_and_coincidence() {
        // Exactly at the radius or beyond.
        assert!(is_neighbor([0.0; 3], [0.5, 0.0, 0.0], 0.25).is_none());
        assert!(is_neighbor([0.0; 3], [0.4, 0.4, 0.0], 0.25).is_none());
        // Same position.
        assert!(is_neighbor([2.0; 3], [2.0; 3], 0.25).is_none());
        // Per-axis early out agrees with the full test.
        assert!(is_neighbor([0.0; 3], [0.6, 0.0, 0.0], 0.25).is_none());
    }

    fn grid_with(positions: &[[f32; 3]], system_id: u32) -> UniformGrid<ParticleReferral> {
        let mut grid = UniformGrid::new([10.0; 3], [0.0; 3], 1.0).unwrap();
        grid.fill(positions, system_id);
        grid
    }

    #[test]
    fn excludes_self_by_identity_not_position() {
        let fluid = [[5.5, 5.5, 5.5], [5.6, 5.5, 5.5]];
        let rigid = [[5.5, 5.5, 5.5]];
        let mut grid = grid_with(&fluid, 0);
        grid.fill(&rigid, 1);

        let systems = [
            SystemPositions { system_id: 0, is_fluid: true, positions: &fluid },
            SystemPositions { system_id: 1, is_fluid: false, positions: &rigid },
        ];
        let bundle = grid.bundles_at(fluid[0]);
        let mut found = Vec::new();
        search_neighborhood(0, 0, fluid[0], &bundle, &systems, 1.0, &UnitKernel, &mut found);

        // The coincident rigid particle is skipped by the distance floor,
        // not by identity; the fluid particle itself is skipped by identity.
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].system_id, 0);
        assert_eq!(found[0].particle_index, 1);
        assert!(found[0].is_fluid);
    }

    #[test]
    fn near_coincident_other_system_particle_is_found() {
        let fluid = [[5.5, 5.5, 5.5]];
        let rigid = [[5.5001, 5.5, 5.5]];
        let mut grid = grid_with(&fluid, 0);
        grid.fill(&rigid, 1);

        let systems = [
            SystemPositions { system_id: 0, is_fluid: true, positions: &fluid },
            SystemPositions { system_id: 1, is_fluid: false, positions: &rigid },
        ];
        let bundle = grid.bundles_at(fluid[0]);
        let mut found = Vec::new();
        search_neighborhood(0, 0, fluid[0], &bundle, &systems, 1.0, &UnitKernel, &mut found);

        assert_eq!(found.len(), 1);
        assert!(!found[0].is_fluid);
    }

    #[test]
    fn neighbors_across_cells_pass_the_distance_test() {
        // 0.9 apart on x, in adjacent cells, radius 1.
        let fluid = [[5.95, 5.5, 5.5], [6.85, 5.5, 5.5], [8.5, 5.5, 5.5]];
        let grid = grid_with(&fluid, 0);
        let systems = [SystemPositions { system_id: 0, is_fluid: true, positions: &fluid }];

        let bundle = grid.bundles_at(fluid[0]);
        let mut found = Vec::new();
        search_neighborhood(0, 0, fluid[0], &bundle, &systems, 1.0, &UnitKernel, &mut found);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].particle_index, 1);
        assert!((found[0].distance - 0.9).abs() < 1.0e-5);
        assert_eq!(found[0].w, 1.0);
    }

    #[test]
    fn wrapped_slot_translation_shortens_the_seam_distance() {
        // Two particles 0.1 apart through the x seam of a [0, 10] domain.
        let fluid = [[0.05, 5.5, 5.5], [9.95, 5.5, 5.5]];
        let grid = grid_with(&fluid, 0);
        let systems = [SystemPositions { system_id: 0, is_fluid: true, positions: &fluid }];

        let bundle = grid.bundles_at_wrapped(fluid[0]);
        let mut found = Vec::new();
        search_neighborhood(0, 0, fluid[0], &bundle, &systems, 1.0, &UnitKernel, &mut found);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].particle_index, 1);
        assert!((found[0].distance - 0.1).abs() < 1.0e-4);
        assert!((found[0].displacement[0] - 0.1).abs() < 1.0e-4);
    }

    #[test]
    fn bounded_query_misses_the_seam_pair() {
        let fluid = [[0.05, 5.5, 5.5], [9.95, 5.5, 5.5]];
        let grid = grid_with(&fluid, 0);
        let systems = [SystemPositions { system_id: 0, is_fluid: true, positions: &fluid }];

        let bundle = grid.bundles_at(fluid[0]);
        let mut found = Vec::new();
        search_neighborhood(0, 0, fluid[0], &bundle, &systems, 1.0, &UnitKernel, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn unknown_system_referrals_are_skipped() {
        let fluid = [[5.5, 5.5, 5.5], [5.6, 5.5, 5.5]];
        let grid = grid_with(&fluid, 9);
        // Resolver has no system 9.
        let systems = [SystemPositions { system_id: 0, is_fluid: true, positions: &fluid }];

        let bundle = grid.bundles_at(fluid[0]);
        let mut found = Vec::new();
        search_neighborhood(0, 0, fluid[0], &bundle, &systems, 1.0, &UnitKernel, &mut found);
        assert!(found.is_empty());
    }
}
