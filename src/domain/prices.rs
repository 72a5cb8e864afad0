use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of one model period: hour within the horizon, plus the
/// representative day and year when those sets exist.
///
/// Ordering is year, then day, then time, which is the order periods are
/// realized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: Option<i32>,
    pub day: Option<usize>,
    pub time: usize,
}

impl PeriodKey {
    pub fn new(time: usize, day: Option<usize>, year: Option<i32>) -> Self {
        Self { year, day, time }
    }

    /// Key of the day this period belongs to, if days are modeled
    pub fn day_key(&self) -> Option<DayKey> {
        self.day.map(|day| DayKey {
            year: self.year,
            day,
        })
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.time)?;
        if let Some(d) = self.day {
            write!(f, ",{}", d)?;
        }
        if let Some(y) = self.year {
            write!(f, ",{}", y)?;
        }
        write!(f, "]")
    }
}

/// Index of a representative day, optionally within a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey {
    pub year: Option<i32>,
    pub day: usize,
}

/// Time, day and year index sets of a price-taker model.
///
/// Downstream builders iterate these sets instead of assuming a key arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSets {
    pub time: Vec<usize>,
    pub days: Option<Vec<usize>>,
    pub years: Option<Vec<i32>>,
}

impl IndexSets {
    pub fn n_time_points(&self) -> usize {
        self.time.len()
    }

    pub fn uses_representative_days(&self) -> bool {
        self.days.is_some()
    }

    pub fn is_multi_year(&self) -> bool {
        self.years.is_some()
    }

    /// All period keys in realization order (year, day, time)
    pub fn period_keys(&self) -> Vec<PeriodKey> {
        let years: Vec<Option<i32>> = match &self.years {
            Some(ys) => ys.iter().copied().map(Some).collect(),
            None => vec![None],
        };
        let days: Vec<Option<usize>> = match &self.days {
            Some(ds) => ds.iter().copied().map(Some).collect(),
            None => vec![None],
        };

        let mut keys = Vec::with_capacity(years.len() * days.len() * self.time.len());
        for &year in &years {
            for &day in &days {
                for &time in &self.time {
                    keys.push(PeriodKey::new(time, day, year));
                }
            }
        }
        keys
    }
}

/// Clustered price profiles with their occurrence weights.
///
/// Cluster ids run from 1 to `n_clusters()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeDaySet {
    pub profiles: BTreeMap<usize, Vec<f64>>,
    pub weights: BTreeMap<usize, u32>,
}

impl RepresentativeDaySet {
    pub fn n_clusters(&self) -> usize {
        self.profiles.len()
    }

    pub fn total_weight(&self) -> u32 {
        self.weights.values().sum()
    }

    /// Price of hour `time` (1-based) on cluster `cluster`
    pub fn price(&self, cluster: usize, time: usize) -> Option<f64> {
        let profile = self.profiles.get(&cluster)?;
        time.checked_sub(1).and_then(|i| profile.get(i)).copied()
    }
}

/// Price and weight parameters handed to the optimization model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceParameterSet {
    sets: IndexSets,
    prices: BTreeMap<PeriodKey, f64>,
    weights: BTreeMap<DayKey, u32>,
}

impl PriceParameterSet {
    pub(crate) fn new(
        sets: IndexSets,
        prices: BTreeMap<PeriodKey, f64>,
        weights: BTreeMap<DayKey, u32>,
    ) -> Self {
        Self {
            sets,
            prices,
            weights,
        }
    }

    pub fn sets(&self) -> &IndexSets {
        &self.sets
    }

    pub fn n_time_points(&self) -> usize {
        self.sets.n_time_points()
    }

    pub fn price(&self, key: &PeriodKey) -> Option<f64> {
        self.prices.get(key).copied()
    }

    pub fn weight(&self, key: &DayKey) -> Option<u32> {
        self.weights.get(key).copied()
    }

    /// Occurrence weight of the day a period belongs to; 1 without days
    pub fn period_weight(&self, key: &PeriodKey) -> f64 {
        key.day_key()
            .and_then(|dk| self.weight(&dk))
            .map(f64::from)
            .unwrap_or(1.0)
    }

    pub fn prices(&self) -> &BTreeMap<PeriodKey, f64> {
        &self.prices
    }

    pub fn weights(&self) -> &BTreeMap<DayKey, u32> {
        &self.weights
    }
}
