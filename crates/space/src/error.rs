//! Error taxonomy for the spatial partitioning core.

use std::fmt;

/// Errors produced by grid construction and coordinator misuse.
///
/// There are only two classes: construction with malformed parameters
/// (fatal -- the simulation cannot proceed without a valid partition), and
/// calling into a partition that was never created (a programming error in
/// the host, not a recoverable condition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceError {
    /// A construction parameter was rejected (non-positive, NaN, or infinite
    /// cell length, or a zero-sized domain axis).
    InvalidParameter(String),
    /// An operation was attempted on a category that was never partitioned.
    InvalidState(String),
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            SpaceError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl std::error::Error for SpaceError {}
