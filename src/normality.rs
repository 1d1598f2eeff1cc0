use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::dataset::Group;
use crate::error::{Error, Result};
use crate::verdict::{TestKind, TestVerdict};

/// How per-group normality verdicts collapse into the single decision that
/// selects the homogeneity test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
    /// Normal only if every group is normal.
    #[default]
    AllGroups,
    /// Use the verdict of the last group processed.
    LastGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalityTest {
    ShapiroWilk,
    KolmogorovSmirnov,
}

impl NormalityTest {
    /// Kolmogorov-Smirnov when the sample has more than `threshold`
    /// observations, Shapiro-Wilk otherwise.
    pub fn select(sample_size: usize, threshold: usize) -> Self {
        if sample_size > threshold {
            NormalityTest::KolmogorovSmirnov
        } else {
            NormalityTest::ShapiroWilk
        }
    }

    pub fn kind(self) -> TestKind {
        match self {
            NormalityTest::ShapiroWilk => TestKind::ShapiroWilk,
            NormalityTest::KolmogorovSmirnov => TestKind::KolmogorovSmirnov,
        }
    }

    pub fn run(self, sample: &[f64]) -> stats::Result<stats::TestOutcome> {
        match self {
            NormalityTest::ShapiroWilk => stats::shapiro_wilk(sample),
            NormalityTest::KolmogorovSmirnov => stats::ks_normal_fitted(sample),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNormality {
    pub label: String,
    pub size: usize,
    pub verdict: TestVerdict,
}

impl GroupNormality {
    pub fn is_normal(&self) -> bool {
        !self.verdict.null_rejected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityReport {
    pub groups: Vec<GroupNormality>,
    pub aggregation: Aggregation,
    /// Every group passed.
    pub all_normal: bool,
    /// Decision handed to the homogeneity selector.
    pub normal: bool,
}

pub fn check_group(group: &Group, config: &AnalysisConfig) -> Result<GroupNormality> {
    let significance = config.significance()?;
    let size = group.values.len();
    let test = NormalityTest::select(size, config.large_sample_threshold);
    tracing::debug!(group = %group.label, size, test = %test.kind(), "selected normality test");

    let outcome = test
        .run(&group.values)
        .map_err(Error::group_test(test.kind(), &group.label))?;

    Ok(GroupNormality {
        label: group.label.clone(),
        size,
        verdict: TestVerdict::new(test.kind(), outcome, significance),
    })
}

pub fn check_groups(groups: &[Group], config: &AnalysisConfig) -> Result<NormalityReport> {
    if groups.is_empty() {
        return Err(Error::TooFewGroups {
            needed: 1,
            found: 0,
        });
    }

    let results = groups
        .iter()
        .map(|g| check_group(g, config))
        .collect::<Result<Vec<_>>>()?;

    let all_normal = results.iter().all(GroupNormality::is_normal);
    let normal = match config.aggregation {
        Aggregation::AllGroups => all_normal,
        Aggregation::LastGroup => results.last().is_some_and(GroupNormality::is_normal),
    };
    if normal != all_normal {
        tracing::warn!(
            "last group is normal but not every group is; homogeneity test chosen from the last group only"
        );
    }

    Ok(NormalityReport {
        groups: results,
        aggregation: config.aggregation,
        all_normal,
        normal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_scores(n: usize, center: f64) -> Vec<f64> {
        use statrs::distribution::{ContinuousCDF, Normal};
        let normal = Normal::new(center, 1.0).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    fn skewed(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.4).exp()).collect()
    }

    #[test]
    fn boundary_between_shapiro_and_ks() {
        assert_eq!(NormalityTest::select(30, 30), NormalityTest::ShapiroWilk);
        assert_eq!(NormalityTest::select(31, 30), NormalityTest::KolmogorovSmirnov);
        assert_eq!(NormalityTest::select(3, 30), NormalityTest::ShapiroWilk);
    }

    #[test]
    fn group_of_31_runs_ks_and_30_runs_shapiro() {
        let config = AnalysisConfig::default();
        let large = check_group(&Group::new("large", normal_scores(31, 0.0)), &config).unwrap();
        let small = check_group(&Group::new("small", normal_scores(30, 0.0)), &config).unwrap();
        assert_eq!(large.verdict.test, TestKind::KolmogorovSmirnov);
        assert_eq!(small.verdict.test, TestKind::ShapiroWilk);
        assert!(large.is_normal() && small.is_normal());
    }

    #[test]
    fn threshold_is_configurable() {
        let config = AnalysisConfig {
            large_sample_threshold: 10,
            ..AnalysisConfig::default()
        };
        let r = check_group(&Group::new("g", normal_scores(11, 0.0)), &config).unwrap();
        assert_eq!(r.verdict.test, TestKind::KolmogorovSmirnov);
    }

    #[test]
    fn all_groups_aggregation_requires_every_group() {
        let groups = vec![
            Group::new("skewed", skewed(20)),
            Group::new("normal", normal_scores(20, 5.0)),
        ];
        let report = check_groups(&groups, &AnalysisConfig::default()).unwrap();
        assert!(!report.groups[0].is_normal());
        assert!(report.groups[1].is_normal());
        assert!(!report.all_normal);
        assert!(!report.normal);
    }

    #[test]
    fn last_group_aggregation_keeps_only_last_verdict() {
        let groups = vec![
            Group::new("skewed", skewed(20)),
            Group::new("normal", normal_scores(20, 5.0)),
        ];
        let config = AnalysisConfig {
            aggregation: Aggregation::LastGroup,
            ..AnalysisConfig::default()
        };
        let report = check_groups(&groups, &config).unwrap();
        assert!(!report.all_normal);
        assert!(report.normal);
    }

    #[test]
    fn too_small_group_names_the_group() {
        let groups = vec![Group::new("tiny", vec![1.0, 2.0])];
        let err = check_groups(&groups, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::GroupTest { test: TestKind::ShapiroWilk, ref group, .. } if group == "tiny"
        ));
    }

    #[test]
    fn no_groups_is_an_error() {
        assert!(matches!(
            check_groups(&[], &AnalysisConfig::default()),
            Err(Error::TooFewGroups { needed: 1, found: 0 })
        ));
    }
}
