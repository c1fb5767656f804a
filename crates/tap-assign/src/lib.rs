//! `tap-assign` — logit-based stochastic user equilibrium assignment.
//!
//! The engine couples Dial's STOCH network loading with the Method of
//! Successive Averages.  For each origin, route choice is restricted to an
//! acyclic "reasonable-link" bush (links moving strictly farther from the
//! origin under free-flow costs) and demand is spread over it analytically
//! with logit weights, so no paths are ever enumerated.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`label`] | full-network Dijkstra node labeling                        |
//! | [`bush`]  | per-origin reasonable-link bushes and topological orders   |
//! | [`dial`]  | scratch bundle, bush shortest paths, two-sweep loading     |
//! | [`msa`]   | `SueSolver`: target aggregation and the averaging loop     |
//! | [`error`] | `AssignError`, `AssignResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Per-origin loadings run on Rayon's thread pool.           |

pub mod bush;
pub mod dial;
pub mod error;
pub mod label;
pub mod msa;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bush::{Bush, build_bushes};
pub use dial::{Scratch, bush_shortest_path, dial_flows};
pub use error::{AssignError, AssignResult};
pub use label::shortest_path_labels;
pub use msa::{SolveStats, SueSolver, avg_flow_diff};
