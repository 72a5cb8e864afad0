//! Clustering
//!
//! Representative-day selection needs two collaborators:
//! - a k-means fit returning centroids, hard labels and inertia
//! - a knee detector over the (k, inertia) curve
//!
//! k-means runs on SmartCore and draws every restart seed from the
//! caller's seeded RNG, so repeated runs with the same seed and data agree.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod kmeans;
pub mod knee;

pub use kmeans::KMeans;
pub use knee::{Curve, Direction, KneeLocator};

/// Result of partitioning samples into clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// One center per cluster, in label order
    pub centroids: Vec<Vec<f64>>,
    /// Cluster label of every sample
    pub labels: Vec<usize>,
    /// Sum of squared distances of samples to their assigned center
    pub inertia: f64,
}

impl Partition {
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Number of samples assigned to each cluster
    pub fn counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.centroids.len()];
        for &label in &self.labels {
            if let Some(c) = counts.get_mut(label) {
                *c += 1;
            }
        }
        counts
    }
}

/// A k-means style partitioner.
///
/// `samples` are rows of equal length; the fit must return exactly
/// `n_clusters` centroids and one label per sample.
pub trait Clusterer {
    fn fit(&self, samples: &[Vec<f64>], n_clusters: usize, rng: &mut StdRng) -> Result<Partition>;
}

/// Check that `samples` can be split into `n_clusters` groups.
///
/// Returns the number of features per sample.
pub(crate) fn validate_samples(samples: &[Vec<f64>], n_clusters: usize) -> Result<usize> {
    if n_clusters == 0 {
        return Err(Error::config("n_clusters must be >= 1"));
    }
    if samples.is_empty() {
        return Err(Error::shape("cannot cluster an empty sample set"));
    }
    if n_clusters > samples.len() {
        return Err(Error::shape(format!(
            "n_clusters={} exceeds the number of samples ({})",
            n_clusters,
            samples.len()
        )));
    }

    let n_features = samples[0].len();
    if n_features == 0 {
        return Err(Error::shape("samples have no features"));
    }
    if samples.iter().any(|s| s.len() != n_features) {
        return Err(Error::shape("all samples must have the same length"));
    }
    if samples.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::shape("samples contain non-finite values"));
    }
    Ok(n_features)
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Inertia of a labeling against given centroids
pub fn inertia(samples: &[Vec<f64>], centroids: &[Vec<f64>], labels: &[usize]) -> f64 {
    samples
        .iter()
        .zip(labels)
        .filter_map(|(s, &l)| centroids.get(l).map(|c| squared_distance(s, c)))
        .sum()
}
