//! BPR congestion cost evaluation.
//!
//! The Bureau of Public Roads function `t·(1 + α·(v/c)^β)` dominates the
//! solver's inner loops, so the β exponent is resolved to a [`BprKind`]
//! variant once at network build time.  Evaluation then dispatches on the
//! variant instead of calling `powf` for the two overwhelmingly common
//! exponents (β = 1 and β = 4 in the TNTP benchmark sets).

/// Cost-function variant bound to an arc at build time from its β exponent.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BprKind {
    /// β = 1: `fixed + fft·(1 + α·v/c)`.
    Linear,
    /// β = 4: `fixed + fft·(1 + α·(v/c)⁴)`, squared twice.
    Quartic,
    /// Any other β, via `powf`.
    Power,
}

impl BprKind {
    /// Select the evaluation variant for an arc's β exponent.
    pub fn from_beta(beta: f64) -> Self {
        if beta == 1.0 {
            BprKind::Linear
        } else if beta == 4.0 {
            BprKind::Quartic
        } else {
            BprKind::Power
        }
    }

    /// Evaluate the congested travel cost of one arc.
    ///
    /// The `Power` form returns the free-flow cost for `flow <= 0`, guarding
    /// `0^0` and negative bases.
    #[inline]
    pub fn eval(
        self,
        fixed_cost: f64,
        free_flow_time: f64,
        alpha: f64,
        beta: f64,
        capacity: f64,
        flow: f64,
    ) -> f64 {
        match self {
            BprKind::Linear => {
                fixed_cost + free_flow_time * (1.0 + alpha * flow / capacity)
            }
            BprKind::Quartic => {
                let ratio = flow / capacity;
                let sq = ratio * ratio;
                fixed_cost + free_flow_time * (1.0 + alpha * sq * sq)
            }
            BprKind::Power => {
                if flow <= 0.0 {
                    fixed_cost + free_flow_time
                } else {
                    fixed_cost + free_flow_time * (1.0 + alpha * (flow / capacity).powf(beta))
                }
            }
        }
    }
}
