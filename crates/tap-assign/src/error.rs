//! Assignment-subsystem error type.

use thiserror::Error;

use tap_core::{CoreError, NodeId};

/// Errors produced by `tap-assign`.
#[derive(Debug, Error)]
pub enum AssignError {
    /// The reasonable-link subgraph failed its topological sort.  Strictly
    /// increasing labels make this impossible; hitting it means an upstream
    /// logic bug.
    #[error("bush for origin {origin} contains a cycle")]
    CyclicBush { origin: NodeId },

    #[error("network has {network} zones but demand matrix has {demand}")]
    ZoneCountMismatch { network: usize, demand: usize },

    #[error(transparent)]
    Config(#[from] CoreError),
}

pub type AssignResult<T> = Result<T, AssignError>;
