use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("at least {needed} observations required, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("at least {needed} groups required, got {got}")]
    TooFewGroups { needed: usize, got: usize },
    #[error("at most {max} observations supported, got {got}")]
    TooManyObservations { max: usize, got: usize },
    #[error("sample has zero variance; the test statistic is undefined")]
    ZeroVariance,
    #[error("sample contains NaN or infinite values")]
    NonFinite,
    #[error("while evaluating distribution: {0}")]
    Distribution(String),
}

impl StatsError {
    pub(crate) fn distribution(e: statrs::StatsError) -> Self {
        StatsError::Distribution(e.to_string())
    }
}
