use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Default number of samples per day (hourly prices)
pub const DEFAULT_HORIZON_LENGTH: usize = 24;

/// Chronological price samples for one scenario column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub name: String,
    /// Parsed sample timestamps, `None` where the time label was not a date
    pub timestamps: Vec<Option<NaiveDateTime>>,
    pub values: Vec<f64>,
}

impl RawSeries {
    /// Series without time labels
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        let timestamps = vec![None; values.len()];
        Self {
            name: name.into(),
            timestamps,
            values,
        }
    }

    /// Series with one time label per sample.
    ///
    /// Parsed timestamps must be non-decreasing.
    pub fn with_timestamps(
        name: impl Into<String>,
        timestamps: Vec<Option<NaiveDateTime>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if timestamps.len() != values.len() {
            return Err(Error::shape(format!(
                "series '{}' has {} timestamps for {} values",
                name,
                timestamps.len(),
                values.len()
            )));
        }

        let mut last: Option<NaiveDateTime> = None;
        for (i, ts) in timestamps.iter().enumerate() {
            if let Some(ts) = ts {
                if matches!(last, Some(prev) if *ts < prev) {
                    return Err(Error::shape(format!(
                        "series '{}' is not chronological at row {}",
                        name,
                        i + 1
                    )));
                }
                last = Some(*ts);
            }
        }

        Ok(Self {
            name,
            timestamps,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Prices pivoted into one column per day.
///
/// Day indices run from 1 to `n_days()`. Every column holds exactly
/// `horizon_length` values in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTable {
    horizon_length: usize,
    days: Vec<Vec<f64>>,
}

impl DailyTable {
    /// Split `values` into consecutive windows of `horizon_length` samples.
    ///
    /// A trailing partial window is discarded.
    pub fn from_values(values: &[f64], horizon_length: usize) -> Result<Self> {
        if horizon_length == 0 {
            return Err(Error::config("horizon_length must be > 0, but 0 is provided"));
        }

        let days: Vec<Vec<f64>> = values
            .chunks_exact(horizon_length)
            .map(<[f64]>::to_vec)
            .collect();

        let dropped = values.len() % horizon_length;
        if dropped > 0 {
            debug!(
                dropped,
                horizon_length,
                "discarding incomplete trailing day"
            );
        }

        Ok(Self {
            horizon_length,
            days,
        })
    }

    pub fn from_series(series: &RawSeries, horizon_length: usize) -> Result<Self> {
        Self::from_values(&series.values, horizon_length)
    }

    pub fn horizon_length(&self) -> usize {
        self.horizon_length
    }

    pub fn n_days(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Profile of day `day` (1-based)
    pub fn day(&self, day: usize) -> Option<&[f64]> {
        day.checked_sub(1)
            .and_then(|i| self.days.get(i))
            .map(Vec::as_slice)
    }

    pub fn day_indices(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.days.len()
    }

    /// Day profiles as clustering samples: one row per day, one feature per hour
    pub fn samples(&self) -> &[Vec<f64>] {
        &self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ts(h: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
    }

    #[test]
    fn test_two_full_days() {
        let values: Vec<f64> = (0..48).map(|v| v as f64).collect();
        let table = DailyTable::from_values(&values, 24).unwrap();

        assert_eq!(table.n_days(), 2);
        assert_eq!(table.day_indices(), 1..=2);
        assert_eq!(table.day(1).unwrap(), &values[..24]);
        assert_eq!(table.day(2).unwrap(), &values[24..]);
        assert!(table.day(0).is_none());
        assert!(table.day(3).is_none());
    }

    #[test]
    fn test_trailing_partial_day_dropped() {
        let values = vec![1.0; 30];
        let table = DailyTable::from_values(&values, 24).unwrap();
        assert_eq!(table.n_days(), 1);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let err = DailyTable::from_values(&[1.0, 2.0], 0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_timestamps_must_be_chronological() {
        let ok = RawSeries::with_timestamps("p", vec![ts(1), None, ts(2)], vec![1.0, 2.0, 3.0]);
        assert!(ok.is_ok());

        let err = RawSeries::with_timestamps("p", vec![ts(3), ts(2)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::DataShape(_)));

        let err = RawSeries::with_timestamps("p", vec![ts(3)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::DataShape(_)));
    }

    proptest! {
        #[test]
        fn prop_reshape_keeps_whole_days(
            values in proptest::collection::vec(-100.0f64..500.0, 0..200),
            h in 1usize..30,
        ) {
            let table = DailyTable::from_values(&values, h).unwrap();
            prop_assert_eq!(table.n_days(), values.len() / h);
            for (i, day) in table.samples().iter().enumerate() {
                prop_assert_eq!(day.len(), h);
                prop_assert_eq!(day.as_slice(), &values[i * h..(i + 1) * h]);
            }
        }
    }
}
