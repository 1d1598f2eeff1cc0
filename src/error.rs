use std::path::PathBuf;

use thiserror::Error;

use crate::verdict::TestKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("while reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid config file '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("while writing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("column '{column}', record {record}: '{value}' is not numeric")]
    NonNumeric {
        column: String,
        record: usize,
        value: String,
    },
    #[error("record {record} has {found} fields, expected {expected}")]
    RaggedRecord {
        record: usize,
        expected: usize,
        found: usize,
    },
    #[error("dataset has no records")]
    EmptyDataset,
    #[error("at least {needed} groups required, found {found}")]
    TooFewGroups { needed: usize, found: usize },
    #[error("{test} test failed: {source}")]
    Test {
        test: TestKind,
        #[source]
        source: stats::StatsError,
    },
    #[error("{test} test failed for group '{group}': {source}")]
    GroupTest {
        test: TestKind,
        group: String,
        #[source]
        source: stats::StatsError,
    },
}

impl Error {
    pub(crate) fn test(test: TestKind) -> impl FnOnce(stats::StatsError) -> Error {
        move |source| Error::Test { test, source }
    }

    pub(crate) fn group_test(test: TestKind, group: &str) -> impl FnOnce(stats::StatsError) -> Error + '_ {
        move |source| Error::GroupTest {
            test,
            group: group.to_string(),
            source,
        }
    }
}
