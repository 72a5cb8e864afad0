//! Kneedle knee/elbow detection (Satopää et al., 2011).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curve {
    Convex,
    Concave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// Offline knee detector.
///
/// Returns the first knee found, or `None` when the difference curve has no
/// local maximum or never drops below a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KneeLocator {
    pub curve: Curve,
    pub direction: Direction,
    /// Sensitivity `S`; larger values are more conservative
    pub sensitivity: f64,
}

impl Default for KneeLocator {
    /// Configuration for an inertia curve: convex and decreasing
    fn default() -> Self {
        Self {
            curve: Curve::Convex,
            direction: Direction::Decreasing,
            sensitivity: 1.0,
        }
    }
}

impl KneeLocator {
    pub fn new(curve: Curve, direction: Direction) -> Self {
        Self {
            curve,
            direction,
            sensitivity: 1.0,
        }
    }

    /// Position of the knee in `x`
    pub fn knee_index(&self, x: &[f64], y: &[f64]) -> Option<usize> {
        let n = x.len();
        if n < 3 || y.len() != n {
            return None;
        }

        let x_norm = normalize(x)?;
        let y_norm = self.transform_y(normalize(y)?);

        let diff: Vec<f64> = y_norm.iter().zip(&x_norm).map(|(yv, xv)| yv - xv).collect();
        let maxima = local_extrema(&diff, |a, b| a >= b);
        let minima = local_extrema(&diff, |a, b| a <= b);
        let first_max = *maxima.first()?;

        let mean_step = x_norm.windows(2).map(|w| w[1] - w[0]).sum::<f64>() / (n - 1) as f64;
        let thresholds: Vec<f64> = maxima
            .iter()
            .map(|&i| diff[i] - self.sensitivity * mean_step.abs())
            .collect();

        let mut threshold = 0.0;
        let mut threshold_index = 0;
        let mut next_max = 0;
        for i in first_max..n - 1 {
            if maxima.contains(&i) {
                threshold = thresholds[next_max];
                threshold_index = i;
                next_max += 1;
            }
            if minima.contains(&i) {
                threshold = 0.0;
            }
            if diff[i + 1] < threshold {
                return Some(self.map_index(threshold_index, n));
            }
        }
        None
    }

    /// Knee value of `x`
    pub fn knee(&self, x: &[f64], y: &[f64]) -> Option<f64> {
        self.knee_index(x, y).map(|i| x[i])
    }

    fn transform_y(&self, y: Vec<f64>) -> Vec<f64> {
        let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        match (self.direction, self.curve) {
            (Direction::Decreasing, Curve::Concave) => y.into_iter().rev().collect(),
            (Direction::Decreasing, Curve::Convex) => y.into_iter().map(|v| max - v).collect(),
            (Direction::Increasing, Curve::Convex) => y.into_iter().rev().map(|v| max - v).collect(),
            (Direction::Increasing, Curve::Concave) => y,
        }
    }

    fn map_index(&self, threshold_index: usize, n: usize) -> usize {
        match (self.curve, self.direction) {
            (Curve::Convex, Direction::Decreasing) | (Curve::Concave, Direction::Increasing) => {
                threshold_index
            }
            (Curve::Convex, Direction::Increasing) | (Curve::Concave, Direction::Decreasing) => {
                n - 1 - threshold_index
            }
        }
    }
}

fn normalize(v: &[f64]) -> Option<Vec<f64>> {
    let min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return None;
    }
    Some(v.iter().map(|x| (x - min) / span).collect())
}

/// Indices where `cmp(v[i], neighbor)` holds for both neighbors; edges
/// compare against themselves.
fn local_extrema(v: &[f64], cmp: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let last = v.len().saturating_sub(1);
    (0..v.len())
        .filter(|&i| {
            let left = v[i.saturating_sub(1)];
            let right = v[(i + 1).min(last)];
            cmp(v[i], left) && cmp(v[i], right)
        })
        .collect()
}
