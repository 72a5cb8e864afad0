//! k-means over SmartCore
//!
//! Every restart fits SmartCore's k-means with a seed drawn from the
//! caller's RNG and the lowest-inertia restart wins. Centers are rebuilt as
//! the mean of each cluster's members so that centroids, labels and
//! inertia come from the same hard assignment.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smartcore::cluster::kmeans::{KMeans as SmartcoreKMeans, KMeansParameters};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::trace;

use super::{inertia, validate_samples, Clusterer, Partition};
use crate::error::{Error, Result};

/// k-means partitioner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    /// Independent restarts; the lowest-inertia run wins
    pub n_init: usize,
    /// Lloyd iterations per restart
    pub max_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iter: 300,
        }
    }
}

impl KMeans {
    pub fn new(n_init: usize, max_iter: usize) -> Self {
        Self {
            n_init: n_init.max(1),
            max_iter: max_iter.max(1),
        }
    }

    fn run_once(&self, x: &DenseMatrix<f64>, samples: &[Vec<f64>], k: usize, seed: u64) -> Result<Partition> {
        let params = KMeansParameters {
            seed: Some(seed),
            ..KMeansParameters::default()
        }
        .with_k(k)
        .with_max_iter(self.max_iter);

        let model: SmartcoreKMeans<f64, usize, DenseMatrix<f64>, Vec<usize>> = SmartcoreKMeans::fit(x, params)
            .map_err(|e| Error::Clustering(format!("SmartCore k-means fit failed: {:?}", e)))?;
        let labels: Vec<usize> = model
            .predict(x)
            .map_err(|e| Error::Clustering(format!("SmartCore k-means predict failed: {:?}", e)))?;

        if labels.len() != samples.len() || labels.iter().any(|&l| l >= k) {
            return Err(Error::Clustering(
                "SmartCore returned labels outside the requested cluster range".to_string(),
            ));
        }

        let centroids = member_means(samples, &labels, k);
        let inertia = inertia(samples, &centroids, &labels);
        Ok(Partition {
            centroids,
            labels,
            inertia,
        })
    }
}

impl Clusterer for KMeans {
    fn fit(&self, samples: &[Vec<f64>], n_clusters: usize, rng: &mut StdRng) -> Result<Partition> {
        let n_features = validate_samples(samples, n_clusters)?;

        // SmartCore needs k >= 2; one cluster is the column mean
        if n_clusters == 1 {
            let labels = vec![0; samples.len()];
            let centroids = member_means(samples, &labels, 1);
            let inertia = inertia(samples, &centroids, &labels);
            return Ok(Partition {
                centroids,
                labels,
                inertia,
            });
        }

        let flat: Vec<f64> = samples.iter().flatten().copied().collect();
        let x = DenseMatrix::new(samples.len(), n_features, flat, false);

        let mut best: Option<Partition> = None;
        for restart in 0..self.n_init.max(1) {
            let seed: u64 = rng.gen();
            let run = self.run_once(&x, samples, n_clusters, seed)?;
            trace!(restart, seed, inertia = run.inertia, "k-means restart");
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.ok_or_else(|| Error::Clustering("k-means ran no restarts".to_string()))
    }
}

/// Mean of each cluster's members; an empty cluster gets the global mean
fn member_means(samples: &[Vec<f64>], labels: &[usize], k: usize) -> Vec<Vec<f64>> {
    let n_features = samples.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; n_features]; k];
    let mut counts = vec![0usize; k];
    let mut global = vec![0.0; n_features];

    for (s, &l) in samples.iter().zip(labels) {
        counts[l] += 1;
        for (j, v) in s.iter().enumerate() {
            sums[l][j] += v;
            global[j] += v;
        }
    }
    let n = samples.len() as f64;
    let global: Vec<f64> = global.into_iter().map(|v| v / n).collect();

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                global.clone()
            } else {
                sum.into_iter().map(|v| v / count as f64).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::squared_distance;
    use rand::SeedableRng;

    fn three_groups() -> Vec<Vec<f64>> {
        let mut samples = Vec::new();
        for i in 0..4 {
            let eps = i as f64 * 0.01;
            samples.push(vec![0.0 + eps, 0.0, 1.0]);
            samples.push(vec![10.0, 10.0 + eps, 11.0]);
            samples.push(vec![-20.0, 5.0, -20.0 + eps]);
        }
        samples
    }

    fn spread_points() -> Vec<Vec<f64>> {
        (0..30)
            .map(|i| {
                let x = i as f64;
                vec![(x * 1.7).sin() * 10.0, (x * 0.9).cos() * 10.0 + x * 0.3]
            })
            .collect()
    }

    #[test]
    fn test_member_means() {
        let samples = vec![vec![0.0, 2.0], vec![2.0, 4.0], vec![10.0, 10.0]];
        let means = member_means(&samples, &[0, 0, 1], 3);
        assert_eq!(means[0], vec![1.0, 3.0]);
        assert_eq!(means[1], vec![10.0, 10.0]);
        assert_eq!(means[2], vec![4.0, 16.0 / 3.0]);
    }

    #[test]
    fn test_separates_obvious_groups() {
        let samples = three_groups();
        let mut rng = StdRng::seed_from_u64(20);
        let p = KMeans::default().fit(&samples, 3, &mut rng).unwrap();

        assert_eq!(p.n_clusters(), 3);
        assert_eq!(p.labels.len(), samples.len());
        let mut counts = p.counts();
        counts.sort_unstable();
        assert_eq!(counts, vec![4, 4, 4]);
        // Rows i, i+3, i+6, i+9 come from the same group
        for offset in 0..3 {
            let label = p.labels[offset];
            for r in (offset..samples.len()).step_by(3) {
                assert_eq!(p.labels[r], label);
            }
        }
        assert!(p.inertia < 0.01);
    }

    #[test]
    fn test_single_cluster_is_column_mean() {
        let samples = vec![vec![1.0, 10.0], vec![3.0, 20.0], vec![5.0, 30.0]];
        let mut rng = StdRng::seed_from_u64(1);
        let p = KMeans::default().fit(&samples, 1, &mut rng).unwrap();
        assert_eq!(p.centroids, vec![vec![3.0, 20.0]]);
        assert_eq!(p.labels, vec![0, 0, 0]);
        assert!((p.inertia - (4.0 + 100.0) * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_samples_single_cluster() {
        let samples = vec![vec![3.0, 4.0, 5.0]; 10];
        let mut rng = StdRng::seed_from_u64(1);
        let p = KMeans::default().fit(&samples, 1, &mut rng).unwrap();
        assert_eq!(p.centroids, vec![vec![3.0, 4.0, 5.0]]);
        assert_eq!(p.counts(), vec![10]);
        assert_eq!(p.inertia, 0.0);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let samples = spread_points();
        let a = KMeans::default()
            .fit(&samples, 4, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = KMeans::default()
            .fit(&samples, 4, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restarts_follow_caller_rng() {
        // The seed of every restart is drawn from the caller's generator
        let samples = spread_points();
        let km = KMeans::new(1, 100);
        let x = DenseMatrix::new(samples.len(), 2, samples.iter().flatten().copied().collect(), false);
        for seed in [1u64, 999] {
            let expected_seed: u64 = StdRng::seed_from_u64(seed).gen();
            let direct = km.run_once(&x, &samples, 4, expected_seed).unwrap();
            let fitted = km.fit(&samples, 4, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(direct, fitted);
        }
    }

    #[test]
    fn test_more_restarts_never_worse() {
        let samples = spread_points();
        let one = KMeans::new(1, 100)
            .fit(&samples, 5, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let many = KMeans::new(8, 100)
            .fit(&samples, 5, &mut StdRng::seed_from_u64(7))
            .unwrap();
        // The first restart of both runs uses the same seed
        assert!(many.inertia <= one.inertia + 1e-9);
    }

    #[test]
    fn test_labels_point_to_nearest_centroid() {
        let samples = three_groups();
        let mut rng = StdRng::seed_from_u64(3);
        let p = KMeans::default().fit(&samples, 2, &mut rng).unwrap();
        assert_eq!(p.counts().iter().sum::<u32>(), 12);
        // Three tight groups in two clusters: the merged pair shares one center
        for (s, &l) in samples.iter().zip(&p.labels) {
            let d = squared_distance(s, &p.centroids[l]);
            for c in &p.centroids {
                assert!(d <= squared_distance(s, c) + 1e-9);
            }
        }
    }
}
