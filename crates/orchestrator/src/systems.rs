//! Particle system containers.
//!
//! The partitioning core identifies particles by (index, system id) pairs
//! and resolves them through explicit position views; this module owns the
//! actual position storage those views borrow from.

use space::{PartitionCategory, SystemPositions};

/// One particle system: a category, an id, and its positions.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    /// Scene-unique id, matching referrals produced by the grids.
    pub id: u32,
    /// Which partition grid the system is reordered into.
    pub category: PartitionCategory,
    /// Current particle positions.
    pub positions: Vec<[f32; 3]>,
}

impl ParticleSystem {
    /// Build a system from its parts.
    pub fn new(id: u32, category: PartitionCategory, positions: Vec<[f32; 3]>) -> Self {
        Self { id, category, positions }
    }

    /// True for fluid systems.
    pub fn is_fluid(&self) -> bool {
        self.category == PartitionCategory::Fluid
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when the system holds no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// All particle systems of a scene, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct ParticleWorld {
    systems: Vec<ParticleSystem>,
}

impl ParticleWorld {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system, keeping the id order.
    pub fn add(&mut self, system: ParticleSystem) {
        let at = self
            .systems
            .partition_point(|s| s.id < system.id);
        self.systems.insert(at, system);
    }

    /// All systems in id order.
    pub fn systems(&self) -> &[ParticleSystem] {
        &self.systems
    }

    /// Mutable access for the integrator-facing side.
    pub fn systems_mut(&mut self) -> &mut [ParticleSystem] {
        &mut self.systems
    }

    /// Look up a system by id.
    pub fn get(&self, id: u32) -> Option<&ParticleSystem> {
        self.systems.iter().find(|s| s.id == id)
    }

    /// Total particle count across all systems.
    pub fn particle_count(&self) -> usize {
        self.systems.iter().map(|s| s.len()).sum()
    }

    /// The borrowed views handed to the neighbor search.
    pub fn position_views(&self) -> Vec<SystemPositions<'_>> {
        self.systems
            .iter()
            .map(|s| SystemPositions {
                system_id: s.id,
                is_fluid: s.is_fluid(),
                positions: &s.positions,
            })
            .collect()
    }
}

/// Fill an axis-aligned box with a uniform particle lattice.
pub fn seed_block(min: [f32; 3], max: [f32; 3], spacing: f32) -> Vec<[f32; 3]> {
    let counts: Vec<usize> = (0..3)
        .map(|axis| (((max[axis] - min[axis]) / spacing).floor() as usize).max(1))
        .collect();
    let mut positions = Vec::with_capacity(counts[0] * counts[1] * counts[2]);
    for ix in 0..counts[0] {
        for iy in 0..counts[1] {
            for iz in 0..counts[2] {
                positions.push([
                    min[0] + (ix as f32 + 0.5) * spacing,
                    min[1] + (iy as f32 + 0.5) * spacing,
                    min[2] + (iz as f32 + 0.5) * spacing,
                ]);
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_keeps_systems_ordered_by_id() {
        let mut world = ParticleWorld::new();
        world.add(ParticleSystem::new(5, PartitionCategory::Fluid, vec![]));
        world.add(ParticleSystem::new(1, PartitionCategory::StaticRigidBody, vec![]));
        world.add(ParticleSystem::new(3, PartitionCategory::Fluid, vec![]));
        let ids: Vec<u32> = world.systems().iter().map(|s| s.id).collect();
        assert_eq!(ids, [1, 3, 5]);
        assert!(world.get(3).is_some());
        assert!(world.get(4).is_none());
    }

    #[test]
    fn position_views_match_systems() {
        let mut world = ParticleWorld::new();
        world.add(ParticleSystem::new(
            0,
            PartitionCategory::Fluid,
            vec![[1.0; 3], [2.0; 3]],
        ));
        world.add(ParticleSystem::new(
            1,
            PartitionCategory::StaticRigidBody,
            vec![[3.0; 3]],
        ));
        let views = world.position_views();
        assert_eq!(views.len(), 2);
        assert!(views[0].is_fluid);
        assert!(!views[1].is_fluid);
        assert_eq!(views[0].positions.len(), 2);
        assert_eq!(world.particle_count(), 3);
    }

    #[test]
    fn seed_block_fills_the_box() {
        let positions = seed_block([0.0; 3], [1.0; 3], 0.25);
        assert_eq!(positions.len(), 4 * 4 * 4);
        for p in &positions {
            for axis in 0..3 {
                assert!(p[axis] > 0.0 && p[axis] < 1.0);
            }
        }
    }

    #[test]
    fn seed_block_of_thin_slab_still_yields_a_layer() {
        let positions = seed_block([0.0, 0.0, 0.0], [1.0, 0.1, 1.0], 0.25);
        assert_eq!(positions.len(), 4 * 1 * 4);
    }
}
