//! Origin–destination demand matrix.
//!
//! Dense row-major `num_zones × num_zones` storage.  TNTP demand matrices
//! are dense in practice (most OD pairs carry trips), so a dense `Vec<f64>`
//! beats any sparse map on both memory locality and lookup cost.

use crate::error::{NetworkError, NetworkResult};

/// Dense OD demand matrix, indexed by 0-based zone numbers.
#[derive(Clone, Debug)]
pub struct DemandMatrix {
    num_zones: usize,
    trips: Vec<f64>,
}

impl DemandMatrix {
    /// All-zero matrix for `num_zones` zones.
    pub fn new(num_zones: usize) -> Self {
        Self {
            num_zones,
            trips: vec![0.0; num_zones * num_zones],
        }
    }

    pub fn num_zones(&self) -> usize {
        self.num_zones
    }

    /// Trips from zone `origin` to zone `dest`.
    #[inline]
    pub fn demand(&self, origin: usize, dest: usize) -> f64 {
        self.trips[origin * self.num_zones + dest]
    }

    /// Set the demand of one OD pair.  Negative values are rejected.
    pub fn set(&mut self, origin: usize, dest: usize, demand: f64) -> NetworkResult<()> {
        if demand < 0.0 {
            return Err(NetworkError::NegativeDemand {
                origin,
                dest,
                demand,
            });
        }
        self.trips[origin * self.num_zones + dest] = demand;
        Ok(())
    }

    /// Total trips departing zone `origin`.
    #[inline]
    pub fn total_from(&self, origin: usize) -> f64 {
        let row = &self.trips[origin * self.num_zones..(origin + 1) * self.num_zones];
        row.iter().sum()
    }

    /// Row of demands out of `origin`, indexed by destination zone.
    #[inline]
    pub fn row(&self, origin: usize) -> &[f64] {
        &self.trips[origin * self.num_zones..(origin + 1) * self.num_zones]
    }

    /// Total trips over all OD pairs.
    pub fn total(&self) -> f64 {
        self.trips.iter().sum()
    }
}
