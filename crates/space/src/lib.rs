//! SPH Spatial Partitioning & Neighbor Search
//!
//! This crate provides the spatial-partitioning core for Smoothed Particle
//! Hydrodynamics (SPH) simulation: a uniform voxel grid that buckets
//! particles by cell so that per-particle neighbor queries only scan the
//! 27-cell block around a position instead of the whole simulation.
//!
//! # Modules
//! - [`bucket`] -- Per-cell particle storage and the `ParticleReferral` id pair.
//! - [`grid`] -- The uniform grid, cell-index arithmetic, and bundle queries.
//! - [`reflect`] -- Periodic-wrap bookkeeping for infinite domains.
//! - [`distance`] -- Minimum-spacing position index for surface sampling.
//! - [`coordinator`] -- One grid per particle category, reorder/query entry points.
//! - [`search`] -- Exact distance filtering and kernel-value caching.
//! - [`error`] -- The crate error type.

#![warn(missing_docs)]

pub mod bucket;
pub mod coordinator;
pub mod distance;
pub mod error;
pub mod grid;
pub mod reflect;
pub mod search;

pub use bucket::{Bucket, ParticleReferral, NEIGHBOR_BUNDLE_COUNT};
pub use coordinator::{PartitionCategory, PartitionCoordinator};
pub use distance::DistanceIndex;
pub use error::SpaceError;
pub use grid::{GridBoundary, NeighborBundle, PositionInDomain, UniformGrid};
pub use reflect::{ReflectedModality, ReflectionFlags};
pub use search::{
    is_neighbor, search_neighborhood, NeighborInfo, SmoothingKernel, SystemPositions,
};
