use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::dataset::{Dataset, is_missing, parse_numeric};
use crate::error::Result;

/// How many of the most frequent values are listed per categorical column.
pub const TOP_VALUES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing_percent: f64,
    /// Most frequent values, categorical columns only.
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    fn new(column: &str, s: stats::Summary) -> Self {
        Self {
            column: column.to_string(),
            count: s.count,
            mean: s.mean,
            std: s.std,
            min: s.min,
            q1: s.q1,
            median: s.median,
            q3: s.q3,
            max: s.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: String,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProfile {
    pub label: String,
    pub rows: usize,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

/// Overview of a dataset before any test is chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exploration {
    pub rows: usize,
    pub columns: usize,
    pub duplicates: usize,
    pub profiles: Vec<ColumnProfile>,
    pub groups: Vec<GroupProfile>,
}

impl Exploration {
    /// Columns with at least one missing cell.
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.profiles.iter().filter(|p| p.missing_percent > 0.0)
    }
}

pub fn explore(dataset: &Dataset, group_column: &str) -> Result<Exploration> {
    let group_idx = dataset.column_index(group_column)?;
    let records = dataset.records();

    let mut seen = HashSet::new();
    let duplicates = records.iter().filter(|r| !seen.insert(r.as_slice())).count();

    let kinds: Vec<ColumnKind> = (0..dataset.column_count())
        .map(|i| column_kind(records.iter().map(|r| r[i].as_str())))
        .collect();

    let profiles = dataset
        .headers()
        .iter()
        .zip(&kinds)
        .enumerate()
        .map(|(i, (name, &kind))| {
            let cells = move || records.iter().map(move |r| r[i].as_str());
            let missing = cells().filter(|c| is_missing(c)).count();
            ColumnProfile {
                name: name.clone(),
                kind,
                missing_percent: percent(missing, records.len()),
                top_values: match kind {
                    ColumnKind::Categorical => value_counts(cells()).into_iter().take(TOP_VALUES).collect(),
                    ColumnKind::Numeric => Vec::new(),
                },
            }
        })
        .collect();

    let groups = dataset
        .unique(group_column)?
        .into_iter()
        .map(|label| {
            let members: Vec<&Vec<String>> = records.iter().filter(|r| r[group_idx] == label).collect();
            group_profile(dataset, &kinds, group_idx, label, &members)
        })
        .collect();

    tracing::debug!(rows = records.len(), duplicates, "explored dataset");
    Ok(Exploration {
        rows: dataset.len(),
        columns: dataset.column_count(),
        duplicates,
        profiles,
        groups,
    })
}

fn group_profile(
    dataset: &Dataset,
    kinds: &[ColumnKind],
    group_idx: usize,
    label: String,
    members: &[&Vec<String>],
) -> GroupProfile {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for (i, (name, kind)) in dataset.headers().iter().zip(kinds).enumerate() {
        if i == group_idx {
            continue;
        }
        let cells = members.iter().map(|r| r[i].as_str());
        match kind {
            ColumnKind::Numeric => {
                let values: Vec<f64> = cells.filter(|c| !is_missing(c)).filter_map(parse_numeric).collect();
                // An all-missing column has nothing to describe for this group.
                if let Ok(summary) = stats::describe(&values) {
                    numeric.push(NumericSummary::new(name, summary));
                }
            }
            ColumnKind::Categorical => {
                let counts = value_counts(cells);
                if let Some(top) = counts.first() {
                    categorical.push(CategoricalSummary {
                        column: name.clone(),
                        count: counts.iter().map(|v| v.count).sum(),
                        unique: counts.len(),
                        top: top.value.clone(),
                        freq: top.count,
                    });
                }
            }
        }
    }

    GroupProfile {
        label,
        rows: members.len(),
        numeric,
        categorical,
    }
}

/// Numeric when every non-missing cell parses as a finite number.
fn column_kind<'a>(mut cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    if cells.all(|c| is_missing(c) || parse_numeric(c).is_some()) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Non-missing values by descending count; ties keep first-occurrence order.
fn value_counts<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();
    for cell in cells.filter(|c| !is_missing(c)) {
        match index.get(cell) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(cell, counts.len());
                counts.push(ValueCount {
                    value: cell.to_string(),
                    count: 1,
                });
            }
        }
    }
    counts.into_iter().sorted_by(|a, b| b.count.cmp(&a.count)).collect()
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
