//! `tap-network` — road network model, congestion costs, and TNTP input.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`network`] | `Network` (SoA + CSR adjacency), `NetworkBuilder`         |
//! | [`bpr`]     | `BprKind` cost selector and evaluation                    |
//! | [`demand`]  | `DemandMatrix` (dense zone × zone)                        |
//! | [`tntp`]    | TNTP link-file and trip-file loaders                      |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                        |

pub mod bpr;
pub mod demand;
pub mod error;
pub mod network;
pub mod tntp;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bpr::BprKind;
pub use demand::DemandMatrix;
pub use error::{NetworkError, NetworkResult};
pub use network::{ArcSpec, Network, NetworkBuilder};
