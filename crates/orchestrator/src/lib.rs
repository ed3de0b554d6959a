//! Orchestration Layer
//!
//! This crate drives the spatial-partitioning core for a whole scene:
//! - JSON scene configuration (domain, kernel, fluid blocks, rigid bodies)
//! - Particle system containers and position views
//! - Rigid-body surface sampling through the distance index
//! - Smoothing kernel implementations injected into the neighbor search
//! - The per-step space stage: reorder, publish, query in parallel

#![warn(missing_docs)]

pub mod config;
pub mod kernel;
pub mod sampler;
pub mod stage;
pub mod systems;

pub use config::SceneConfig;
pub use kernel::SceneKernel;
pub use stage::{SpaceStage, SystemNeighborhoods};
pub use systems::{ParticleSystem, ParticleWorld};
