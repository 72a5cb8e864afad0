use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::domain::RawSeries;
use crate::error::{Error, Result};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Tabular price source.
///
/// Layout: one time/date column, one scenario label column, then one numeric
/// column per price series (a single price signal or one column per year).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    time_labels: Vec<String>,
    timestamps: Vec<Option<NaiveDateTime>>,
    scenarios: Vec<String>,
    column_names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceTable {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_csv_reader(file)?;
        info!(
            path = %path.display(),
            rows = table.len(),
            columns = ?table.column_names,
            "loaded price table"
        );
        Ok(table)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.len() < 3 {
            return Err(Error::shape(format!(
                "price table needs a time column, a scenario column and at least one price column; found {} columns",
                headers.len()
            )));
        }
        let column_names: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

        let mut time_labels = Vec::new();
        let mut scenarios = Vec::new();
        let mut columns = vec![Vec::new(); column_names.len()];

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(Error::shape(format!(
                    "row {} has {} fields, expected {}",
                    row + 1,
                    record.len(),
                    headers.len()
                )));
            }
            time_labels.push(record[0].to_string());
            scenarios.push(record[1].to_string());
            for (j, column) in columns.iter_mut().enumerate() {
                let field = &record[j + 2];
                let value: f64 = field.parse().map_err(|_| {
                    Error::shape(format!(
                        "row {}, column '{}': '{}' is not a number",
                        row + 1,
                        column_names[j],
                        field
                    ))
                })?;
                column.push(value);
            }
        }

        let timestamps = time_labels.iter().map(|l| parse_timestamp(l)).collect();

        Ok(Self {
            time_labels,
            timestamps,
            scenarios,
            column_names,
            columns,
        })
    }

    /// Rows whose scenario label equals `scenario`
    pub fn filter_scenario(&self, scenario: &str) -> Result<Self> {
        let keep: Vec<usize> = self
            .scenarios
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_str() == scenario)
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(Error::unknown("scenario", scenario));
        }

        let pick = |v: &[String]| keep.iter().map(|&i| v[i].clone()).collect::<Vec<_>>();
        Ok(Self {
            time_labels: pick(&self.time_labels),
            timestamps: keep.iter().map(|&i| self.timestamps[i]).collect(),
            scenarios: pick(&self.scenarios),
            column_names: self.column_names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| keep.iter().map(|&i| c[i]).collect())
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.time_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_labels.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn time_labels(&self) -> &[String] {
        &self.time_labels
    }

    /// Price column `name` as a chronological series
    pub fn series(&self, name: &str) -> Result<RawSeries> {
        let idx = self
            .column_names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::unknown("price column", name))?;
        RawSeries::with_timestamps(name, self.timestamps.clone(), self.columns[idx].clone())
    }
}

fn parse_timestamp(label: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(label, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Time,Scenario,2022,2023
2022-01-01 00:00,base,10.0,11.0
2022-01-01 01:00,base,12.5,13.0
2022-01-01 02:00,high,20.0,21.0
";

    #[test]
    fn test_reads_columns() {
        let table = PriceTable::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), &["2022".to_string(), "2023".to_string()]);

        let s = table.series("2023").unwrap();
        assert_eq!(s.values, vec![11.0, 13.0, 21.0]);
        assert!(s.timestamps[0].is_some());
    }

    #[test]
    fn test_filter_scenario() {
        let table = PriceTable::from_csv_reader(CSV.as_bytes()).unwrap();
        let base = table.filter_scenario("base").unwrap();
        assert_eq!(base.len(), 2);
        assert_eq!(base.series("2022").unwrap().values, vec![10.0, 12.5]);

        assert!(matches!(
            table.filter_scenario("low"),
            Err(Error::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_non_chronological_rows_rejected() {
        let table = PriceTable::from_csv_reader(
            "t,s,p\n2022-01-01 02:00,a,1\n2022-01-01 01:00,a,2\n".as_bytes(),
        )
        .unwrap();
        assert!(matches!(table.series("p"), Err(Error::DataShape(_))));
    }

    #[test]
    fn test_non_numeric_price() {
        let err = PriceTable::from_csv_reader("t,s,p\n1,a,abc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::DataShape(_)));
    }

    #[test]
    fn test_missing_column() {
        let table = PriceTable::from_csv_reader("t,s,p\n1,a,3\n".as_bytes()).unwrap();
        assert!(matches!(table.series("q"), Err(Error::UnknownOption { .. })));
    }

    #[test]
    fn test_too_few_columns() {
        let err = PriceTable::from_csv_reader("t,p\n1,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::DataShape(_)));
    }
}
