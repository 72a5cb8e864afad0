use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clustering::{Clusterer, KneeLocator};
use crate::domain::DailyTable;
use crate::error::{Error, Result};

pub const DEFAULT_KMIN: usize = 4;
pub const DEFAULT_KMAX: usize = 30;

/// Outcome of an elbow sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCountResult {
    /// (k, inertia) for every k in [kmin, kmax)
    pub curve: Vec<(usize, f64)>,
    /// Detected elbow
    pub n_clusters: usize,
    /// The elbow sits within two of `kmax`; a wider sweep may move it
    pub near_kmax: bool,
}

impl ClusterCountResult {
    pub fn inertia_values(&self) -> Vec<f64> {
        self.curve.iter().map(|(_, i)| *i).collect()
    }
}

/// Picks a representative-day count from the inertia elbow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterCountSelector {
    pub kmin: usize,
    pub kmax: usize,
    pub seed: u64,
}

impl ClusterCountSelector {
    /// `kmax` falls back to 30 with a warning when unset
    pub fn new(kmin: Option<usize>, kmax: Option<usize>, seed: u64) -> Self {
        let kmax = kmax.unwrap_or_else(|| {
            warn!("kmax was not set - using a default value of {}", DEFAULT_KMAX);
            DEFAULT_KMAX
        });
        Self {
            kmin: kmin.unwrap_or(DEFAULT_KMIN),
            kmax,
            seed,
        }
    }

    fn validate(&self, daily: &DailyTable) -> Result<()> {
        if self.kmin == 0 {
            return Err(Error::config("kmin must be >= 1"));
        }
        // The knee detector needs at least three points
        if self.kmax < self.kmin + 3 {
            return Err(Error::config(format!(
                "kmax ({}) must be at least kmin + 3 ({})",
                self.kmax,
                self.kmin + 3
            )));
        }
        if self.kmax - 1 > daily.n_days() {
            return Err(Error::shape(format!(
                "cannot fit up to {} clusters on {} days of data",
                self.kmax - 1,
                daily.n_days()
            )));
        }
        Ok(())
    }

    /// Sweep k over [kmin, kmax) and return the elbow of the inertia curve.
    ///
    /// The RNG is seeded once before the sweep. Fails with
    /// [`Error::NoElbow`] when the curve has no detectable knee.
    pub fn select(&self, daily: &DailyTable, clusterer: &dyn Clusterer) -> Result<ClusterCountResult> {
        self.validate(daily)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut curve = Vec::with_capacity(self.kmax - self.kmin);
        for k in self.kmin..self.kmax {
            let partition = clusterer.fit(daily.samples(), k, &mut rng)?;
            curve.push((k, partition.inertia));
        }

        let x: Vec<f64> = curve.iter().map(|(k, _)| *k as f64).collect();
        let y: Vec<f64> = curve.iter().map(|(_, i)| *i).collect();
        let n_clusters = KneeLocator::default()
            .knee_index(&x, &y)
            .map(|i| curve[i].0)
            .ok_or(Error::NoElbow {
                kmin: self.kmin,
                kmax: self.kmax,
            })?;

        info!(n_clusters, kmin = self.kmin, kmax = self.kmax, "optimal number of clusters");
        let near_kmax = self.is_near_kmax(n_clusters);
        if near_kmax {
            warn!(
                n_clusters,
                kmax = self.kmax,
                "Optimal number of clusters is close to kmax. Consider increasing kmax."
            );
        }

        Ok(ClusterCountResult {
            curve,
            n_clusters,
            near_kmax,
        })
    }

    fn is_near_kmax(&self, n_clusters: usize) -> bool {
        n_clusters + 2 >= self.kmax
    }
}
