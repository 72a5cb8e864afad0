//! Price-parameter loading
//!
//! Turns a price table into the index sets and price/weight mappings of the
//! optimization model. Four layouts are supported:
//!
//! | columns      | `n_clusters` | price key          | weight key  |
//! |--------------|--------------|--------------------|-------------|
//! | single       | none         | `[t]`              | -           |
//! | single       | some         | `[t, d]`           | `[d]`       |
//! | one per year | none         | `[t, y]`           | -           |
//! | one per year | some         | `[t, d, y]`        | `[d, y]`    |
//!
//! Representative-day layouts use hours `1..=horizon_length`.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::{PriceTable, RepresentativeDayClusterer};
use crate::clustering::Clusterer;
use crate::domain::{DayKey, IndexSets, PeriodKey, PriceParameterSet, RepresentativeDaySet};
use crate::error::{Error, Result};

/// Which price columns to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelector {
    /// One price signal
    Single(String),
    /// One column per year; every label must be a year number
    Years(Vec<String>),
}

impl Default for ColumnSelector {
    fn default() -> Self {
        ColumnSelector::Single("price".to_string())
    }
}

impl ColumnSelector {
    /// Year labels paired with their column names
    fn years(&self) -> Result<Option<Vec<(i32, &str)>>> {
        match self {
            ColumnSelector::Single(_) => Ok(None),
            ColumnSelector::Years(labels) => {
                if labels.is_empty() {
                    return Err(Error::config("year column list is empty"));
                }
                let years = labels
                    .iter()
                    .map(|l| {
                        l.trim()
                            .parse::<i32>()
                            .map(|y| (y, l.as_str()))
                            .map_err(|_| Error::config(format!("column '{}' is not a year label", l)))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let repeated: Vec<i32> = years.iter().map(|(y, _)| *y).duplicates().collect();
                if !repeated.is_empty() {
                    return Err(Error::config(format!("year columns repeat {:?}", repeated)));
                }
                Ok(Some(years))
            }
        }
    }
}

/// Builds [`PriceParameterSet`]s from a price table
pub struct PriceLoader<'a> {
    horizon_length: usize,
    seed: u64,
    clusterer: &'a dyn Clusterer,
}

impl<'a> PriceLoader<'a> {
    pub fn new(horizon_length: usize, seed: u64, clusterer: &'a dyn Clusterer) -> Self {
        Self {
            horizon_length,
            seed,
            clusterer,
        }
    }

    /// Load the selected columns.
    ///
    /// `horizon_override` replaces the loader's horizon length for the
    /// representative-day layouts. All inputs are checked and every column
    /// is clustered before the result is assembled.
    pub fn load(
        &self,
        table: &PriceTable,
        columns: &ColumnSelector,
        n_clusters: Option<usize>,
        horizon_override: Option<usize>,
    ) -> Result<PriceParameterSet> {
        let horizon = horizon_override.unwrap_or(self.horizon_length);
        if horizon == 0 {
            return Err(Error::config("horizon_length must be > 0, but 0 is provided"));
        }
        if n_clusters == Some(0) {
            return Err(Error::config("n_clusters must be >= 1"));
        }
        if table.is_empty() {
            return Err(Error::shape("price table has no rows"));
        }

        let params = match (columns.years()?, n_clusters) {
            (Some(years), Some(k)) => self.years_representative(table, &years, k, horizon)?,
            (Some(years), None) => Self::years_full(table, &years)?,
            (None, Some(k)) => self.single_representative(table, columns, k, horizon)?,
            (None, None) => Self::single_full(table, columns)?,
        };

        let sets = params.sets();
        info!(
            n_time_points = sets.n_time_points(),
            n_days = sets.days.as_ref().map(Vec::len),
            years = ?sets.years,
            "loaded price parameters"
        );
        Ok(params)
    }

    fn representative(
        &self,
        table: &PriceTable,
        column: &str,
        n_clusters: usize,
        horizon: usize,
    ) -> Result<RepresentativeDaySet> {
        let series = table.series(column)?;
        RepresentativeDayClusterer::new(horizon, self.seed).cluster(&series, n_clusters, self.clusterer)
    }

    fn years_representative(
        &self,
        table: &PriceTable,
        years: &[(i32, &str)],
        n_clusters: usize,
        horizon: usize,
    ) -> Result<PriceParameterSet> {
        let clustered = years
            .iter()
            .map(|&(year, column)| -> Result<(i32, RepresentativeDaySet)> {
                Ok((year, self.representative(table, column, n_clusters, horizon)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let sets = IndexSets {
            time: (1..=horizon).collect(),
            days: Some((1..=n_clusters).collect()),
            years: Some(years.iter().map(|(y, _)| *y).collect()),
        };

        let mut prices = BTreeMap::new();
        let mut weights = BTreeMap::new();
        for (year, set) in &clustered {
            fill_representative(&sets, set, Some(*year), &mut prices, &mut weights)?;
        }
        Ok(PriceParameterSet::new(sets, prices, weights))
    }

    fn years_full(table: &PriceTable, years: &[(i32, &str)]) -> Result<PriceParameterSet> {
        let sets = IndexSets {
            time: (1..=table.len()).collect(),
            days: None,
            years: Some(years.iter().map(|(y, _)| *y).collect()),
        };

        let mut prices = BTreeMap::new();
        for &(year, column) in years {
            let series = table.series(column)?;
            for (i, &v) in series.values.iter().enumerate() {
                prices.insert(PeriodKey::new(i + 1, None, Some(year)), v);
            }
        }
        Ok(PriceParameterSet::new(sets, prices, BTreeMap::new()))
    }

    fn single_representative(
        &self,
        table: &PriceTable,
        columns: &ColumnSelector,
        n_clusters: usize,
        horizon: usize,
    ) -> Result<PriceParameterSet> {
        let set = self.representative(table, single_column(table, columns)?, n_clusters, horizon)?;
        let sets = IndexSets {
            time: (1..=horizon).collect(),
            days: Some((1..=n_clusters).collect()),
            years: None,
        };

        let mut prices = BTreeMap::new();
        let mut weights = BTreeMap::new();
        fill_representative(&sets, &set, None, &mut prices, &mut weights)?;
        Ok(PriceParameterSet::new(sets, prices, weights))
    }

    fn single_full(table: &PriceTable, columns: &ColumnSelector) -> Result<PriceParameterSet> {
        let series = table.series(single_column(table, columns)?)?;
        let sets = IndexSets {
            time: (1..=series.len()).collect(),
            days: None,
            years: None,
        };
        let prices = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (PeriodKey::new(i + 1, None, None), v))
            .collect();
        Ok(PriceParameterSet::new(sets, prices, BTreeMap::new()))
    }
}

/// Single-column name; an empty name picks the first price column
fn single_column<'t>(table: &'t PriceTable, columns: &'t ColumnSelector) -> Result<&'t str> {
    match columns {
        ColumnSelector::Single(name) if name.is_empty() => table
            .column_names()
            .first()
            .map(String::as_str)
            .ok_or_else(|| Error::shape("price table has no price columns")),
        ColumnSelector::Single(name) => Ok(name.as_str()),
        ColumnSelector::Years(_) => Err(Error::config("expected a single price column")),
    }
}

fn fill_representative(
    sets: &IndexSets,
    set: &RepresentativeDaySet,
    year: Option<i32>,
    prices: &mut BTreeMap<PeriodKey, f64>,
    weights: &mut BTreeMap<DayKey, u32>,
) -> Result<()> {
    let days = sets.days.as_deref().unwrap_or_default();
    for &day in days {
        let weight = set
            .weights
            .get(&day)
            .copied()
            .ok_or_else(|| Error::Clustering(format!("no weight for representative day {}", day)))?;
        weights.insert(DayKey { year, day }, weight);
        for &time in &sets.time {
            let price = set.price(day, time).ok_or_else(|| {
                Error::Clustering(format!("representative day {} has no hour {}", day, time))
            })?;
            prices.insert(PeriodKey::new(time, Some(day), year), price);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::KMeans;
    use rstest::rstest;

    /// Four days of two alternating shapes, hourly, with one column per year
    fn table() -> PriceTable {
        let mut csv = String::from("Time,Scenario,price,2022,2023\n");
        for i in 0..96 {
            let hour = i % 24;
            let day = i / 24;
            let base = if day % 2 == 0 { 10.0 } else { 50.0 };
            csv.push_str(&format!(
                "2022-01-{:02} {:02}:00,base,{},{},{}\n",
                day + 1,
                hour,
                base + hour as f64,
                base * 2.0,
                base * 3.0
            ));
        }
        PriceTable::from_csv_reader(csv.as_bytes()).unwrap()
    }

    fn years() -> ColumnSelector {
        ColumnSelector::Years(vec!["2022".into(), "2023".into()])
    }

    #[rstest]
    #[case::single_full(ColumnSelector::Single("price".into()), None, 96, false, false)]
    #[case::single_rep(ColumnSelector::Single("price".into()), Some(2), 24, true, false)]
    #[case::years_full(years(), None, 96, false, true)]
    #[case::years_rep(years(), Some(2), 24, true, true)]
    fn test_layouts(
        #[case] columns: ColumnSelector,
        #[case] n_clusters: Option<usize>,
        #[case] n_time: usize,
        #[case] has_days: bool,
        #[case] has_years: bool,
    ) {
        let km = KMeans::default();
        let params = PriceLoader::new(24, 20, &km)
            .load(&table(), &columns, n_clusters, None)
            .unwrap();

        let sets = params.sets();
        assert_eq!(sets.n_time_points(), n_time);
        assert_eq!(sets.uses_representative_days(), has_days);
        assert_eq!(sets.is_multi_year(), has_years);
        assert_eq!(params.prices().len(), sets.period_keys().len());
        assert_eq!(params.weights().is_empty(), !has_days);
    }

    #[test]
    fn test_years_representative_keys() {
        let km = KMeans::default();
        let params = PriceLoader::new(24, 20, &km)
            .load(&table(), &years(), Some(2), None)
            .unwrap();

        for year in [2022, 2023] {
            let total: u32 = (1..=2)
                .filter_map(|d| params.weight(&DayKey { year: Some(year), day: d }))
                .sum();
            assert_eq!(total, 4);
        }
        // Last hour is present for every day and year
        assert!(params.price(&PeriodKey::new(24, Some(2), Some(2023))).is_some());
        assert!(params.price(&PeriodKey::new(25, Some(1), Some(2022))).is_none());
    }

    #[test]
    fn test_full_year_prices_follow_rows() {
        let km = KMeans::default();
        let params = PriceLoader::new(24, 20, &km)
            .load(&table(), &ColumnSelector::Single("price".into()), None, None)
            .unwrap();
        assert_eq!(params.price(&PeriodKey::new(1, None, None)), Some(10.0));
        assert_eq!(params.price(&PeriodKey::new(26, None, None)), Some(51.0));
    }

    #[test]
    fn test_reload_is_identical() {
        let km = KMeans::default();
        let loader = PriceLoader::new(24, 3, &km);
        let a = loader.load(&table(), &years(), Some(2), None).unwrap();
        let b = loader.load(&table(), &years(), Some(2), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_horizon_override() {
        let km = KMeans::default();
        let params = PriceLoader::new(24, 20, &km)
            .load(&table(), &ColumnSelector::Single("price".into()), Some(2), Some(12))
            .unwrap();
        assert_eq!(params.n_time_points(), 12);
        let total: u32 = params.weights().values().sum();
        assert_eq!(total, 8);
    }

    #[rstest]
    #[case(ColumnSelector::Years(vec!["2022".into(), "next".into()]), Some(2), None)]
    #[case(ColumnSelector::Years(vec![]), None, None)]
    #[case(ColumnSelector::Years(vec!["2022".into(), "2022".into()]), None, None)]
    #[case(ColumnSelector::Years(vec!["2022".into(), "2023".into(), " 2022".into()]), Some(2), None)]
    #[case(ColumnSelector::Single("price".into()), Some(0), None)]
    #[case(ColumnSelector::Single("price".into()), Some(2), Some(0))]
    fn test_configuration_errors(
        #[case] columns: ColumnSelector,
        #[case] n_clusters: Option<usize>,
        #[case] horizon: Option<usize>,
    ) {
        let km = KMeans::default();
        let err = PriceLoader::new(24, 20, &km)
            .load(&table(), &columns, n_clusters, horizon)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err}");
    }

    #[test]
    fn test_unknown_column() {
        let km = KMeans::default();
        let err = PriceLoader::new(24, 20, &km)
            .load(&table(), &ColumnSelector::Years(vec!["2031".into()]), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownOption { .. }));
    }

    #[test]
    fn test_selector_deserializes_untagged() {
        let single: ColumnSelector = serde_json::from_str("\"price\"").unwrap();
        assert_eq!(single, ColumnSelector::Single("price".into()));
        let multi: ColumnSelector = serde_json::from_str("[\"2022\",\"2023\"]").unwrap();
        assert_eq!(multi, years());
    }
}
