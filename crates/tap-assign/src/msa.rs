//! The `SueSolver` and its averaging loop.
//!
//! # Iteration shape
//!
//! Each pass re-prices every arc from the current flows, loads every origin
//! onto its bush, sums those loadings into an auxiliary target, and moves
//! the flows a fixed fraction λ of the way toward it.  The loop stops on
//! convergence of the average link-flow gap, on the iteration cap, or on
//! the wall-clock budget — the latter two end the run normally with the
//! current iterate.

use std::time::{Duration, Instant};

use tap_core::SolverConfig;
use tap_network::{DemandMatrix, Network};

use crate::bush::{Bush, build_bushes};
use crate::dial::{Scratch, dial_flows};
use crate::error::{AssignError, AssignResult};

// ── SolveStats ────────────────────────────────────────────────────────────────

/// Outcome of a [`SueSolver::solve`] run.
#[derive(Clone, Debug)]
pub struct SolveStats {
    /// Completed averaging steps.
    pub iterations: u32,
    /// Average absolute link-flow gap at termination.
    pub avg_flow_diff: f64,
    /// Wall time spent in the loop.
    pub elapsed: Duration,
    /// Whether the gap fell below the configured tolerance.
    pub converged: bool,
}

// ── SueSolver ─────────────────────────────────────────────────────────────────

/// Stochastic user equilibrium solver: owns the network, the demand, the
/// per-origin bushes, and one loading scratch bundle.
///
/// Construction runs the iteration-0 loading (all origins under free-flow
/// costs), so the network's flows are a valid logit loading before
/// [`solve`](Self::solve) is ever called.
#[derive(Debug)]
pub struct SueSolver {
    /// The network; `flow` and `cost` carry the current iterate.
    pub network: Network,

    /// OD trip table, fixed for the run.
    pub demand: DemandMatrix,

    /// Run parameters, validated at construction.
    pub config: SolverConfig,

    /// One bush per origin zone, fixed for the run.
    pub bushes: Vec<Bush>,

    scratch: Scratch,
    target: Vec<f64>,
}

impl SueSolver {
    /// Validate the inputs, build every origin's bush under free-flow
    /// costs, and run the initial loading.
    pub fn new(
        mut network: Network,
        demand: DemandMatrix,
        config: SolverConfig,
    ) -> AssignResult<Self> {
        config.validate()?;
        if demand.num_zones() != network.num_zones {
            return Err(AssignError::ZoneCountMismatch {
                network: network.num_zones,
                demand: demand.num_zones(),
            });
        }

        let bushes = build_bushes(&mut network, &demand, config.min_link_cost)?;
        let scratch = Scratch::for_network(&network);
        let target = vec![0.0; network.arc_count()];

        let mut solver = Self {
            network,
            demand,
            config,
            bushes,
            scratch,
            target,
        };

        // Iteration-0 loading: the bush build left free-flow costs on the
        // arcs, so this is the uncongested logit loading.
        solver.compute_target();
        solver.network.flow.copy_from_slice(&solver.target);
        Ok(solver)
    }

    /// Run the averaging loop to termination.
    pub fn solve(&mut self) -> SolveStats {
        let start = Instant::now();
        let mut iteration = 0u32;

        loop {
            self.network.update_costs();
            self.compute_target();

            let diff = avg_flow_diff(&self.network.flow, &self.target);
            let elapsed = start.elapsed();
            log::info!(
                "iteration {iteration}: avg link-flow gap {diff:.6}, {:.1} s elapsed",
                elapsed.as_secs_f64()
            );

            let converged = diff < self.config.flow_tolerance;
            if converged
                || elapsed.as_secs_f64() > self.config.max_time_secs
                || iteration >= self.config.max_iterations
            {
                return SolveStats {
                    iterations: iteration,
                    avg_flow_diff: diff,
                    elapsed,
                    converged,
                };
            }

            let lambda = self.config.lambda;
            for (flow, target) in self.network.flow.iter_mut().zip(&self.target) {
                *flow += lambda * (*target - *flow);
            }
            iteration += 1;
        }
    }

    /// Sum per-origin Dial loadings into the auxiliary target under the
    /// network's current costs.
    ///
    /// Origins with no outbound demand are skipped — their loading is
    /// identically zero.
    pub fn compute_target(&mut self) {
        #[cfg(not(feature = "parallel"))]
        {
            // Sequential: one shared scratch, aggregated between origins.
            self.target.fill(0.0);
            for bush in &self.bushes {
                if self.demand.total_from(bush.origin.index()) <= 0.0 {
                    continue;
                }
                dial_flows(
                    bush,
                    &self.network,
                    &self.demand,
                    self.config.theta,
                    &mut self.scratch,
                );
                for (target, flow) in self.target.iter_mut().zip(&self.scratch.flow) {
                    *target += *flow;
                }
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Parallel: one scratch bundle per task, summed by reduction.
            let network = &self.network;
            let demand = &self.demand;
            let theta = self.config.theta;

            let summed = self
                .bushes
                .par_iter()
                .filter(|bush| demand.total_from(bush.origin.index()) > 0.0)
                .map(|bush| {
                    let mut scratch = Scratch::for_network(network);
                    dial_flows(bush, network, demand, theta, &mut scratch);
                    scratch.flow
                })
                .reduce(
                    || vec![0.0; network.arc_count()],
                    |mut acc, flow| {
                        for (a, f) in acc.iter_mut().zip(&flow) {
                            *a += *f;
                        }
                        acc
                    },
                );
            self.target.copy_from_slice(&summed);
        }
    }

    /// The auxiliary target from the most recent `compute_target` call.
    pub fn target(&self) -> &[f64] {
        &self.target
    }
}

// ── Convergence measure ───────────────────────────────────────────────────────

/// Average absolute difference between two link-flow vectors.
///
/// Zero exactly when the vectors are equal.
pub fn avg_flow_diff(flow: &[f64], target: &[f64]) -> f64 {
    if flow.is_empty() {
        return 0.0;
    }
    let sum: f64 = flow
        .iter()
        .zip(target)
        .map(|(f, t)| (f - t).abs())
        .sum();
    sum / flow.len() as f64
}
