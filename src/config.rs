use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::homogeneity::LeveneCenter;
use crate::normality::Aggregation;
use crate::pipeline::Strategy;
use crate::verdict::Significance;

/// Settings shared by every test in the decision chain.
///
/// # Example
/// ```
/// use groupcmp::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.alpha, 0.05);
/// assert_eq!(config.large_sample_threshold, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Significance level; the null is rejected iff `p < alpha`.
    pub alpha: f64,

    /// Groups with more observations than this use Kolmogorov-Smirnov,
    /// the rest Shapiro-Wilk.
    pub large_sample_threshold: usize,

    /// How per-group normality verdicts collapse into one decision.
    pub aggregation: Aggregation,

    /// Whether the homogeneity outcome selects the difference tests.
    pub strategy: Strategy,

    pub levene_center: LeveneCenter,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: Significance::DEFAULT_ALPHA,
            large_sample_threshold: 30,
            aggregation: Aggregation::default(),
            strategy: Strategy::default(),
            levene_center: LeveneCenter::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalysisConfig = toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.significance()?;
        Ok(())
    }

    pub fn significance(&self) -> Result<Significance> {
        Significance::new(self.alpha)
    }
}
