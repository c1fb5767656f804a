//! `tap-core` — foundational types for the `tap-sue` traffic assignment
//! workspace.
//!
//! This crate is a dependency of every other `tap-*` crate.  It intentionally
//! has no `tap-*` dependencies and only `thiserror` externally.
//!
//! # What lives here
//!
//! | Module     | Contents                                  |
//! |------------|-------------------------------------------|
//! | [`ids`]    | `NodeId`, `ArcId`                         |
//! | [`config`] | `SolverConfig`                            |
//! | [`error`]  | `CoreError`, `CoreResult`                 |

pub mod config;
pub mod error;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SolverConfig;
pub use error::{CoreError, CoreResult};
pub use ids::{ArcId, NodeId};
