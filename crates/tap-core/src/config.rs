//! Solver configuration.
//!
//! # Design
//!
//! One plain struct carries every tunable of the assignment run.  The two
//! behavioural parameters (`theta`, `lambda`) have no sensible defaults and
//! come from the command line; the remaining knobs default to values that
//! work on the standard TNTP benchmark networks.

use crate::error::{CoreError, CoreResult};

/// Top-level configuration for a stochastic user equilibrium run.
///
/// Build with [`SolverConfig::new`] and override fields as needed:
///
/// ```
/// use tap_core::SolverConfig;
///
/// let cfg = SolverConfig { max_iterations: 200, ..SolverConfig::new(1.0, 0.25) };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Logit dispersion θ.  Higher values concentrate route choice on the
    /// cheapest routes; must be strictly positive.
    pub theta: f64,

    /// MSA step size λ in (0, 1].  Each iteration moves the link flows
    /// `lambda` of the way toward the auxiliary target.
    pub lambda: f64,

    /// Iteration cap.  Default: 100.
    pub max_iterations: u32,

    /// Wall-clock budget in seconds, checked between iterations.
    /// Default: 3600.
    pub max_time_secs: f64,

    /// Convergence threshold on the average absolute link-flow gap.
    /// Default: 1e-3.
    pub flow_tolerance: f64,

    /// Floor applied to free-flow arc costs when building bushes, keeping
    /// every cost strictly positive.  Default: 1e-6.
    pub min_link_cost: f64,
}

impl SolverConfig {
    /// Create a configuration with the given behavioural parameters and
    /// default limits.
    pub fn new(theta: f64, lambda: f64) -> Self {
        Self {
            theta,
            lambda,
            max_iterations: 100,
            max_time_secs: 3600.0,
            flow_tolerance: 1e-3,
            min_link_cost: 1e-6,
        }
    }

    /// Check every field for range validity.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.theta > 0.0) {
            return Err(CoreError::Config(format!(
                "theta must be > 0, got {}",
                self.theta
            )));
        }
        if !(self.lambda > 0.0 && self.lambda <= 1.0) {
            return Err(CoreError::Config(format!(
                "lambda must be in (0, 1], got {}",
                self.lambda
            )));
        }
        if !(self.flow_tolerance > 0.0) {
            return Err(CoreError::Config(format!(
                "flow tolerance must be > 0, got {}",
                self.flow_tolerance
            )));
        }
        if !(self.min_link_cost > 0.0) {
            return Err(CoreError::Config(format!(
                "minimum link cost must be > 0, got {}",
                self.min_link_cost
            )));
        }
        if !(self.max_time_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "time budget must be > 0, got {}",
                self.max_time_secs
            )));
        }
        Ok(())
    }
}
