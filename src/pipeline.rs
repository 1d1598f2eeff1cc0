use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::dataset::Group;
use crate::difference::{self, PairwiseResult, TestFamily};
use crate::error::{Error, Result};
use crate::homogeneity::{self, HomogeneityTest};
use crate::normality::{self, NormalityReport};
use crate::verdict::TestVerdict;

/// What the orchestrator does once the recommended family is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Run the omnibus and pairwise tests of the recommended family.
    #[default]
    Gated,
    /// Report the recommendation without running any difference test.
    Advisory,
    /// Run ANOVA and Welch's t whatever the recommendation.
    Parametric,
}

impl Strategy {
    fn family(self, recommendation: TestFamily) -> Option<TestFamily> {
        match self {
            Strategy::Gated => Some(recommendation),
            Strategy::Advisory => None,
            Strategy::Parametric => Some(TestFamily::Parametric),
        }
    }
}

/// Every verdict produced by one run of the decision chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub normality: NormalityReport,
    pub homogeneity: TestVerdict,
    pub recommendation: TestFamily,
    /// Family whose difference tests actually ran.
    pub executed: Option<TestFamily>,
    pub omnibus: Option<TestVerdict>,
    pub pairwise: Vec<PairwiseResult>,
}

impl Analysis {
    pub fn homogeneous(&self) -> bool {
        !self.homogeneity.null_rejected
    }

    /// The executed tests disagree with the assumptions checked upstream.
    pub fn overrides_recommendation(&self) -> bool {
        self.executed.is_some_and(|f| f != self.recommendation)
    }
}

/// Run normality, homogeneity and, depending on the strategy, the
/// difference tests over `groups`.
pub fn analyze(groups: &[Group], config: &AnalysisConfig) -> Result<Analysis> {
    if groups.len() < 2 {
        return Err(Error::TooFewGroups {
            needed: 2,
            found: groups.len(),
        });
    }
    config.validate()?;

    let normality = normality::check_groups(groups, config)?;
    let test = HomogeneityTest::select(normality.normal);
    tracing::info!(normal = normality.normal, test = %test.kind(), "selected homogeneity test");

    let homogeneity = homogeneity::check(groups, test, config)?;
    let homogeneous = !homogeneity.null_rejected;
    let recommendation = TestFamily::recommend(normality.normal, homogeneous);
    tracing::info!(homogeneous, ?recommendation, strategy = ?config.strategy, "recommended test family");

    let executed = config.strategy.family(recommendation);
    let (omnibus, pairwise) = match executed {
        Some(family) => {
            if family != recommendation {
                tracing::warn!(
                    ?recommendation,
                    "running parametric tests although their assumptions were not met"
                );
            }
            (
                Some(difference::omnibus(groups, family, config)?),
                difference::pairwise(groups, family, config)?,
            )
        }
        None => (None, Vec::new()),
    };

    Ok(Analysis {
        normality,
        homogeneity,
        recommendation,
        executed,
        omnibus,
        pairwise,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normality::Aggregation;
    use crate::verdict::TestKind;

    fn normal_scores(n: usize, center: f64, scale: f64) -> Vec<f64> {
        use statrs::distribution::{ContinuousCDF, Normal};
        let normal = Normal::new(center, scale).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    fn skewed(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.4).exp()).collect()
    }

    fn normal_groups() -> Vec<Group> {
        vec![
            Group::new("a", normal_scores(20, 10.0, 1.0)),
            Group::new("b", normal_scores(20, 10.5, 1.0)),
            Group::new("c", normal_scores(20, 14.0, 1.0)),
        ]
    }

    #[test]
    fn normal_homogeneous_groups_run_parametric_chain() {
        let analysis = analyze(&normal_groups(), &AnalysisConfig::default()).unwrap();
        assert!(analysis.normality.normal);
        assert_eq!(analysis.homogeneity.test, TestKind::Bartlett);
        assert!(analysis.homogeneous());
        assert_eq!(analysis.recommendation, TestFamily::Parametric);
        assert_eq!(analysis.executed, Some(TestFamily::Parametric));
        assert_eq!(analysis.omnibus.unwrap().test, TestKind::Anova);
        assert!(analysis.omnibus.unwrap().null_rejected);
        assert_eq!(analysis.pairwise.len(), 3);
        assert!(analysis.pairwise.iter().all(|p| p.verdict.test == TestKind::WelchT));
    }

    #[test]
    fn non_normal_group_switches_to_levene_and_rank_tests() {
        let groups = vec![
            Group::new("skewed", skewed(20)),
            Group::new("normal", normal_scores(20, 5.0, 1.0)),
        ];
        let analysis = analyze(&groups, &AnalysisConfig::default()).unwrap();
        assert!(!analysis.normality.normal);
        assert_eq!(analysis.homogeneity.test, TestKind::Levene);
        assert_eq!(analysis.recommendation, TestFamily::NonParametric);
        assert_eq!(analysis.omnibus.unwrap().test, TestKind::KruskalWallis);
        assert_eq!(analysis.pairwise[0].verdict.test, TestKind::MannWhitneyU);
    }

    #[test]
    fn last_group_aggregation_changes_homogeneity_test() {
        let groups = vec![
            Group::new("skewed", skewed(20)),
            Group::new("normal", normal_scores(20, 5.0, 1.0)),
        ];
        let config = AnalysisConfig {
            aggregation: Aggregation::LastGroup,
            strategy: Strategy::Advisory,
            ..AnalysisConfig::default()
        };
        let analysis = analyze(&groups, &config).unwrap();
        assert_eq!(analysis.homogeneity.test, TestKind::Bartlett);
    }

    #[test]
    fn advisory_strategy_runs_no_difference_test() {
        let config = AnalysisConfig {
            strategy: Strategy::Advisory,
            ..AnalysisConfig::default()
        };
        let analysis = analyze(&normal_groups(), &config).unwrap();
        assert_eq!(analysis.recommendation, TestFamily::Parametric);
        assert_eq!(analysis.executed, None);
        assert!(analysis.omnibus.is_none());
        assert!(analysis.pairwise.is_empty());
    }

    #[test]
    fn parametric_strategy_overrides_recommendation() {
        let groups = vec![
            Group::new("skewed", skewed(20)),
            Group::new("normal", normal_scores(20, 5.0, 1.0)),
        ];
        let config = AnalysisConfig {
            strategy: Strategy::Parametric,
            ..AnalysisConfig::default()
        };
        let analysis = analyze(&groups, &config).unwrap();
        assert_eq!(analysis.recommendation, TestFamily::NonParametric);
        assert_eq!(analysis.executed, Some(TestFamily::Parametric));
        assert!(analysis.overrides_recommendation());
        assert_eq!(analysis.omnibus.unwrap().test, TestKind::Anova);
    }

    #[test]
    fn heterogeneous_variances_recommend_non_parametric() {
        let groups = vec![
            Group::new("narrow", normal_scores(20, 10.0, 0.1)),
            Group::new("wide", normal_scores(20, 10.0, 5.0)),
        ];
        let analysis = analyze(&groups, &AnalysisConfig::default()).unwrap();
        assert!(analysis.normality.normal);
        assert_eq!(analysis.homogeneity.test, TestKind::Bartlett);
        assert!(!analysis.homogeneous());
        assert_eq!(analysis.recommendation, TestFamily::NonParametric);
    }

    #[test]
    fn single_group_is_rejected() {
        let groups = vec![Group::new("only", normal_scores(10, 0.0, 1.0))];
        assert!(matches!(
            analyze(&groups, &AnalysisConfig::default()),
            Err(Error::TooFewGroups { needed: 2, found: 1 })
        ));
    }
}
