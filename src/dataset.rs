use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Cell values treated as missing, in addition to the empty cell.
const MISSING_MARKERS: [&str; 5] = ["NA", "N/A", "NaN", "nan", "null"];

pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Parse a non-missing cell as a finite number.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Tabular records read from a delimited text file. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

/// Rows sharing one value of the grouping column.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    /// Number of records carrying the label, including missing measurements.
    pub rows: usize,
    pub values: Vec<f64>,
}

impl Group {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            rows: values.len(),
            values,
        }
    }
}

/// Borrow each group's sample, in group order.
pub fn samples(groups: &[Group]) -> Vec<&[f64]> {
    groups.iter().map(|g| g.values.as_slice()).collect()
}

impl Dataset {
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, delimiter)
    }

    pub fn from_reader<R: io::Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(String::from).collect();
        let records = reader
            .records()
            .map(|r| r.map(|record| record.iter().map(String::from).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;

        tracing::debug!(records = records.len(), "loaded dataset");
        Ok(Self { headers, records })
    }

    /// Build a dataset from in-memory rows. Every record must have one cell
    /// per header.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Result<Self> {
        if let Some((i, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(Error::RaggedRecord {
                record: i + 1,
                expected: headers.len(),
                found: record.len(),
            });
        }
        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Distinct non-missing values of `column` in order of first occurrence.
    pub fn unique(&self, column: &str) -> Result<Vec<String>> {
        let idx = self.column_index(column)?;
        let mut seen = Vec::new();
        for record in &self.records {
            let cell = &record[idx];
            if !is_missing(cell) && !seen.contains(cell) {
                seen.push(cell.clone());
            }
        }
        Ok(seen)
    }

    /// Partition the measurement column by the grouping column.
    ///
    /// Groups appear in order of first occurrence of their label. Records
    /// with a missing label are skipped; missing measurements are dropped
    /// from the sample but still count towards the group's rows.
    pub fn groups(&self, group_column: &str, value_column: &str) -> Result<Vec<Group>> {
        let gi = self.column_index(group_column)?;
        let vi = self.column_index(value_column)?;
        if self.records.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut dropped = 0usize;
        for (i, record) in self.records.iter().enumerate() {
            let label = &record[gi];
            if is_missing(label) {
                tracing::debug!(record = i + 1, "skipping record with missing group label");
                continue;
            }
            let pos = match groups.iter().position(|g| &g.label == label) {
                Some(pos) => pos,
                None => {
                    groups.push(Group {
                        label: label.clone(),
                        rows: 0,
                        values: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[pos];
            group.rows += 1;

            let cell = &record[vi];
            if is_missing(cell) {
                dropped += 1;
                continue;
            }
            let value = parse_numeric(cell).ok_or_else(|| Error::NonNumeric {
                column: value_column.to_string(),
                record: i + 1,
                value: cell.clone(),
            })?;
            group.values.push(value);
        }

        if dropped > 0 {
            tracing::debug!(dropped, column = value_column, "dropped missing measurements");
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
variant,revenue,device
B,12.5,mobile
A,10.0,desktop
B,13.0,desktop
C,,mobile
A,11.0,mobile
C,9.5,NA
";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), b',').unwrap()
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        let groups = dataset().groups("variant", "revenue").unwrap();
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
        assert_eq!(groups[0].values, vec![12.5, 13.0]);
        assert_eq!(groups[1].values, vec![10.0, 11.0]);
    }

    #[test]
    fn missing_measurements_are_dropped_but_counted() {
        let groups = dataset().groups("variant", "revenue").unwrap();
        assert_eq!(groups[2].rows, 2);
        assert_eq!(groups[2].values, vec![9.5]);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let err = dataset().groups("variant", "profit").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "profit"));
    }

    #[test]
    fn non_numeric_measurement_is_an_error() {
        let err = dataset().groups("revenue", "device").unwrap_err();
        match err {
            Error::NonNumeric { column, record, value } => {
                assert_eq!(column, "device");
                assert_eq!(record, 1);
                assert_eq!(value, "mobile");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn semicolon_delimited_input() {
        let ds = Dataset::from_reader("g;v\nx;1\ny;2\n".as_bytes(), b';').unwrap();
        assert_eq!(ds.headers(), ["g", "v"]);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn header_only_dataset_is_empty() {
        let ds = Dataset::from_reader("g,v\n".as_bytes(), b',').unwrap();
        assert!(matches!(ds.groups("g", "v"), Err(Error::EmptyDataset)));
    }

    #[test]
    fn unique_skips_missing_values() {
        assert_eq!(dataset().unique("device").unwrap(), vec!["mobile", "desktop"]);
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn in_memory_records_are_grouped() {
        let ds = Dataset::from_records(
            strings(&["variant", "revenue"]),
            vec![strings(&["A", "1.0"]), strings(&["B", "2.0"]), strings(&["A", "3.0"])],
        )
        .unwrap();
        let groups = ds.groups("variant", "revenue").unwrap();
        assert_eq!(groups[0].values, vec![1.0, 3.0]);
        assert_eq!(groups[1].values, vec![2.0]);
    }

    #[test]
    fn short_in_memory_record_is_rejected() {
        let err = Dataset::from_records(
            strings(&["variant", "revenue"]),
            vec![strings(&["A", "1.0"]), strings(&["B"])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedRecord {
                record: 2,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn ragged_rows_are_a_csv_error() {
        let err = Dataset::from_reader("g,v\nx,1,extra\n".as_bytes(), b',').unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }
}
