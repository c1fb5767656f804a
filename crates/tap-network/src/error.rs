//! Network-subsystem error type.

use thiserror::Error;

/// Errors produced by `tap-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("missing metadata tag {0:?}")]
    MissingMetadata(&'static str),

    #[error("arc {arc} has non-positive capacity {capacity}")]
    NonPositiveCapacity { arc: usize, capacity: f64 },

    #[error("node {node} out of range 1..={max} at line {line}")]
    NodeOutOfRange { node: i64, max: usize, line: usize },

    #[error("negative demand {demand} for origin {origin} destination {dest}")]
    NegativeDemand { origin: usize, dest: usize, demand: f64 },

    #[error("trip file declares {trips} zones but link file declares {links}")]
    ZoneCountMismatch { links: usize, trips: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
