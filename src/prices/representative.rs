use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

use crate::clustering::Clusterer;
use crate::domain::{DailyTable, RawSeries, RepresentativeDaySet};
use crate::error::Result;

/// Centroid values below this are treated as clustering noise
pub const CENTROID_ZERO_THRESHOLD: f64 = 1e-4;

/// Groups the days of a price series into representative days
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepresentativeDayClusterer {
    pub horizon_length: usize,
    pub seed: u64,
}

impl RepresentativeDayClusterer {
    pub fn new(horizon_length: usize, seed: u64) -> Self {
        Self {
            horizon_length,
            seed,
        }
    }

    /// Fit `n_clusters` centers over the daily profiles of `series`.
    ///
    /// The daily table is rebuilt from `series` on every call. Cluster ids
    /// follow the centroid order of the fit, starting at 1, and each weight
    /// is the number of days the fit labeled with that cluster.
    pub fn cluster(
        &self,
        series: &RawSeries,
        n_clusters: usize,
        clusterer: &dyn Clusterer,
    ) -> Result<RepresentativeDaySet> {
        let daily = DailyTable::from_series(series, self.horizon_length)?;
        self.cluster_daily(&daily, n_clusters, clusterer)
    }

    pub fn cluster_daily(
        &self,
        daily: &DailyTable,
        n_clusters: usize,
        clusterer: &dyn Clusterer,
    ) -> Result<RepresentativeDaySet> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let partition = clusterer.fit(daily.samples(), n_clusters, &mut rng)?;
        let counts = partition.counts();

        let mut profiles = BTreeMap::new();
        let mut weights = BTreeMap::new();
        for (i, (centroid, count)) in partition.centroids.into_iter().zip(counts).enumerate() {
            let profile = centroid
                .into_iter()
                .map(|v| if v < CENTROID_ZERO_THRESHOLD { 0.0 } else { v })
                .collect();
            profiles.insert(i + 1, profile);
            weights.insert(i + 1, count);
        }

        debug!(
            n_clusters,
            n_days = daily.n_days(),
            weights = ?weights,
            "clustered representative days"
        );
        Ok(RepresentativeDaySet { profiles, weights })
    }
}
