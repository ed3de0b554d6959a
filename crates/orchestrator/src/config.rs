//! Scene configuration parsing and validation

use serde::{Deserialize, Serialize};
use std::fs;

/// Main scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Human-readable scene name
    pub name: String,
    /// Simulation domain bounds
    pub domain: DomainBounds,
    /// Kernel interaction radius (meters); also the grid cell edge length
    pub kernel_radius: f32,
    /// Wrap neighbor queries across the domain faces
    #[serde(default)]
    pub infinite_domain: bool,
    /// Smoothing kernel used for neighbor records
    #[serde(default)]
    pub smoothing_kernel: SmoothingKernelKind,
    /// Fluid bodies seeded at startup
    #[serde(default)]
    pub fluid_blocks: Vec<FluidBlockConfig>,
    /// Rigid bodies sampled at startup
    #[serde(default)]
    pub rigid_bodies: Vec<RigidBodyConfig>,
}

/// Domain bounding box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainBounds {
    /// Minimum corner [x, y, z]
    pub min: [f32; 3],
    /// Maximum corner [x, y, z]
    pub max: [f32; 3],
}

/// Smoothing kernel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SmoothingKernelKind {
    /// Cubic B-spline kernel
    #[default]
    CubicSpline,
    /// Wendland C2 kernel
    WendlandC2,
}

/// An axis-aligned block of fluid particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidBlockConfig {
    /// System id, unique across the scene
    pub id: u32,
    /// Minimum corner of the block
    pub min: [f32; 3],
    /// Maximum corner of the block
    pub max: [f32; 3],
    /// Initial inter-particle distance (meters)
    pub particle_spacing: f32,
}

/// Whether a rigid body moves during the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidBodyKind {
    /// Never moves; its partition survives per-step clears
    Static,
    /// Moves; re-partitioned every step
    Dynamic,
}

/// Rigid body surface shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RigidShape {
    /// Axis-aligned box, sampled on all six faces
    Box {
        /// Minimum corner
        min: [f32; 3],
        /// Maximum corner
        max: [f32; 3],
    },
}

/// A rigid body sampled into boundary particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyConfig {
    /// System id, unique across the scene
    pub id: u32,
    /// Static or dynamic
    pub kind: RigidBodyKind,
    /// Surface geometry
    pub shape: RigidShape,
    /// Surface sample spacing (meters)
    pub sample_spacing: f32,
}

impl SceneConfig {
    /// Load a scene from a JSON file
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scene file {}: {}", path, e))?;

        let config: SceneConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse scene JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the scene
    pub fn validate(&self) -> Result<(), String> {
        for axis in 0..3 {
            if self.domain.min[axis] >= self.domain.max[axis] {
                return Err(format!(
                    "Domain min must be less than max on axis {}",
                    axis
                ));
            }
        }

        if self.kernel_radius <= 0.0 || !self.kernel_radius.is_finite() {
            return Err("Kernel radius must be positive and finite".to_string());
        }

        let mut ids: Vec<u32> = self
            .fluid_blocks
            .iter()
            .map(|b| b.id)
            .chain(self.rigid_bodies.iter().map(|r| r.id))
            .collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        if ids.len() != before {
            return Err("System ids must be unique across the scene".to_string());
        }

        for block in &self.fluid_blocks {
            if block.particle_spacing <= 0.0 {
                return Err(format!(
                    "Fluid block {} particle spacing must be positive",
                    block.id
                ));
            }
            for axis in 0..3 {
                if block.min[axis] >= block.max[axis] {
                    return Err(format!(
                        "Fluid block {} min must be less than max on axis {}",
                        block.id, axis
                    ));
                }
                if block.min[axis] < self.domain.min[axis]
                    || block.max[axis] > self.domain.max[axis]
                {
                    return Err(format!(
                        "Fluid block {} must lie inside the domain",
                        block.id
                    ));
                }
            }
        }

        for body in &self.rigid_bodies {
            if body.sample_spacing <= 0.0 {
                return Err(format!(
                    "Rigid body {} sample spacing must be positive",
                    body.id
                ));
            }
            let RigidShape::Box { min, max } = &body.shape;
            for axis in 0..3 {
                if min[axis] >= max[axis] {
                    return Err(format!(
                        "Rigid body {} min must be less than max on axis {}",
                        body.id, axis
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SceneConfig {
        SceneConfig {
            name: "test".to_string(),
            domain: DomainBounds { min: [0.0; 3], max: [10.0; 3] },
            kernel_radius: 0.2,
            infinite_domain: false,
            smoothing_kernel: SmoothingKernelKind::CubicSpline,
            fluid_blocks: vec![FluidBlockConfig {
                id: 0,
                min: [1.0; 3],
                max: [2.0; 3],
                particle_spacing: 0.1,
            }],
            rigid_bodies: vec![RigidBodyConfig {
                id: 1,
                kind: RigidBodyKind::Static,
                shape: RigidShape::Box { min: [0.5; 3], max: [9.5; 3] },
                sample_spacing: 0.1,
            }],
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn inverted_domain_fails() {
        let mut config = base_config();
        config.domain.max[1] = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_kernel_radius_fails() {
        let mut config = base_config();
        config.kernel_radius = 0.0;
        assert!(config.validate().is_err());
        config.kernel_radius = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_system_ids_fail() {
        let mut config = base_config();
        config.rigid_bodies[0].id = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn fluid_block_outside_domain_fails() {
        let mut config = base_config();
        config.fluid_blocks[0].max = [12.0; 3];
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let json = r#"{
            "name": "minimal",
            "domain": { "min": [0, 0, 0], "max": [1, 1, 1] },
            "kernel_radius": 0.1
        }"#;
        let config: SceneConfig = serde_json::from_str(json).unwrap();
        assert!(!config.infinite_domain);
        assert_eq!(config.smoothing_kernel, SmoothingKernelKind::CubicSpline);
        assert!(config.fluid_blocks.is_empty());
        assert!(config.validate().is_ok());
    }
}
