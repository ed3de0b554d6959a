//! The per-step space stage.
//!
//! Single writer over the partition coordinator: each step clears the
//! moving-category grids, refills them from current positions, publishes,
//! and then runs the per-particle neighbor searches in parallel over the
//! now read-only grids. Neighbor lists are handed back per particle and
//! must not be retained across the next step.

use rayon::prelude::*;

use crate::config::{RigidBodyKind, RigidShape, SceneConfig};
use crate::kernel::SceneKernel;
use crate::sampler::sample_box_surface;
use crate::systems::{seed_block, ParticleSystem, ParticleWorld};
use space::{
    search_neighborhood, NeighborInfo, PartitionCategory, PartitionCoordinator, SystemPositions,
};

/// Neighbor lists for one system, parallel to its position array.
#[derive(Debug, Clone)]
pub struct SystemNeighborhoods {
    /// The system the lists belong to.
    pub system_id: u32,
    /// One neighbor list per particle.
    pub lists: Vec<Vec<NeighborInfo>>,
}

/// Owns the coordinator, the particle world, and the kernel for one scene.
pub struct SpaceStage {
    coordinator: PartitionCoordinator,
    world: ParticleWorld,
    kernel: SceneKernel,
    radius_squared: f32,
    domain_min: [f32; 3],
    domain_max: [f32; 3],
}

impl SpaceStage {
    /// Build the stage from a validated scene: create the partitions,
    /// sample every rigid body, seed every fluid block, and reorder the
    /// static rigid bodies once.
    pub fn new(config: &SceneConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let mut coordinator = PartitionCoordinator::new(
            config.domain.max,
            config.domain.min,
            config.kernel_radius,
            config.infinite_domain,
        )?;
        coordinator.partition_space()?;

        let mut world = ParticleWorld::new();
        for block in &config.fluid_blocks {
            let positions = seed_block(block.min, block.max, block.particle_spacing);
            tracing::info!(id = block.id, particles = positions.len(), "seeded fluid block");
            world.add(ParticleSystem::new(
                block.id,
                PartitionCategory::Fluid,
                positions,
            ));
        }
        for body in &config.rigid_bodies {
            let RigidShape::Box { min, max } = &body.shape;
            let positions = sample_box_surface(*min, *max, body.sample_spacing)?;
            let category = match body.kind {
                RigidBodyKind::Static => PartitionCategory::StaticRigidBody,
                RigidBodyKind::Dynamic => PartitionCategory::DynamicRigidBody,
            };
            tracing::info!(id = body.id, particles = positions.len(), "sampled rigid body");
            world.add(ParticleSystem::new(body.id, category, positions));
        }

        if config.infinite_domain {
            wrap_world_into_domain(&mut world, config.domain.min, config.domain.max);
        }

        // Static layouts never change, so they are reordered exactly once.
        for system in world.systems() {
            if system.category == PartitionCategory::StaticRigidBody {
                coordinator.reorder(&system.positions, system.id, system.category)?;
            }
        }

        let kernel = SceneKernel::new(config.smoothing_kernel, config.kernel_radius);
        Ok(Self {
            coordinator,
            world,
            kernel,
            radius_squared: config.kernel_radius * config.kernel_radius,
            domain_min: config.domain.min,
            domain_max: config.domain.max,
        })
    }

    /// The particle world, for integrators that move particles between steps.
    pub fn world_mut(&mut self) -> &mut ParticleWorld {
        &mut self.world
    }

    /// Read-only access to the particle world.
    pub fn world(&self) -> &ParticleWorld {
        &self.world
    }

    /// The coordinator, for host-side domain checks.
    pub fn coordinator(&self) -> &PartitionCoordinator {
        &self.coordinator
    }

    /// Run one step: refill the moving grids from current positions, then
    /// compute every particle's neighbor list in parallel.
    pub fn step(&mut self) -> Result<Vec<SystemNeighborhoods>, Box<dyn std::error::Error>> {
        if self.coordinator.is_infinite_domain() {
            wrap_world_into_domain(&mut self.world, self.domain_min, self.domain_max);
        }

        self.coordinator.clear_reordering_no_static();
        for system in self.world.systems() {
            if system.category != PartitionCategory::StaticRigidBody {
                self.coordinator
                    .reorder(&system.positions, system.id, system.category)?;
            }
        }

        // Publish point: from here on the coordinator is only read.
        let coordinator = &self.coordinator;
        let kernel = &self.kernel;
        let radius_squared = self.radius_squared;
        let views = self.world.position_views();
        let views = views.as_slice();

        let mut results = Vec::with_capacity(self.world.systems().len());
        for system in self.world.systems() {
            let lists = system
                .positions
                .par_iter()
                .enumerate()
                .map(|(index, position)| {
                    particle_neighbors(
                        coordinator,
                        views,
                        kernel,
                        radius_squared,
                        system.id,
                        index,
                        *position,
                    )
                })
                .collect::<Result<Vec<_>, space::SpaceError>>()?;
            results.push(SystemNeighborhoods { system_id: system.id, lists });
        }
        Ok(results)
    }
}

/// Wrap every position into the half-open domain box. Under a periodic
/// domain a coordinate on the far face belongs to the next period, so it
/// maps back to the near face; without this, such a particle sits in the
/// grid's guard cell where no wrapped slot reaches it.
fn wrap_world_into_domain(world: &mut ParticleWorld, min: [f32; 3], max: [f32; 3]) {
    for system in world.systems_mut() {
        for position in &mut system.positions {
            for axis in 0..3 {
                let extent = max[axis] - min[axis];
                position[axis] = min[axis] + (position[axis] - min[axis]).rem_euclid(extent);
            }
        }
    }
}

/// One particle's search across every category grid sharing the domain.
fn particle_neighbors(
    coordinator: &PartitionCoordinator,
    views: &[SystemPositions<'_>],
    kernel: &SceneKernel,
    radius_squared: f32,
    system_id: u32,
    index: usize,
    position: [f32; 3],
) -> Result<Vec<NeighborInfo>, space::SpaceError> {
    let mut found = Vec::new();
    for category in PartitionCategory::ALL {
        let bundle = coordinator.bundles(position, category)?;
        search_neighborhood(
            system_id,
            index,
            position,
            &bundle,
            views,
            radius_squared,
            kernel,
            &mut found,
        );
    }
    Ok(found)
}
