use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::dataset::{Group, samples};
use crate::error::{Error, Result};
use crate::verdict::{TestKind, TestVerdict};

/// Family of difference tests: ANOVA with Welch's t, or their rank-based
/// counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TestFamily {
    Parametric,
    NonParametric,
}

impl TestFamily {
    /// Parametric tests are only valid when the groups are both normal and
    /// homogeneous.
    pub fn recommend(normal: bool, homogeneous: bool) -> Self {
        if normal && homogeneous {
            TestFamily::Parametric
        } else {
            TestFamily::NonParametric
        }
    }

    pub fn omnibus_test(self) -> TestKind {
        match self {
            TestFamily::Parametric => TestKind::Anova,
            TestFamily::NonParametric => TestKind::KruskalWallis,
        }
    }

    pub fn pairwise_test(self) -> TestKind {
        match self {
            TestFamily::Parametric => TestKind::WelchT,
            TestFamily::NonParametric => TestKind::MannWhitneyU,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseResult {
    pub group_a: String,
    pub group_b: String,
    pub verdict: TestVerdict,
}

impl PairwiseResult {
    pub fn significant(&self) -> bool {
        self.verdict.null_rejected
    }
}

/// Omnibus test of equal location across all groups. A verdict that does
/// not reject the null means no significant difference was found.
pub fn omnibus(groups: &[Group], family: TestFamily, config: &AnalysisConfig) -> Result<TestVerdict> {
    let significance = config.significance()?;
    let samples = samples(groups);
    let test = family.omnibus_test();
    tracing::debug!(test = %test, groups = groups.len(), "running omnibus test");

    let outcome = match family {
        TestFamily::Parametric => stats::f_oneway(&samples),
        TestFamily::NonParametric => stats::kruskal_wallis(&samples),
    }
    .map_err(Error::test(test))?;

    Ok(TestVerdict::new(test, outcome, significance))
}

/// One-way ANOVA. Normality and homogeneity are assumed, not checked.
pub fn anova(groups: &[Group], config: &AnalysisConfig) -> Result<TestVerdict> {
    omnibus(groups, TestFamily::Parametric, config)
}

pub fn kruskal_wallis(groups: &[Group], config: &AnalysisConfig) -> Result<TestVerdict> {
    omnibus(groups, TestFamily::NonParametric, config)
}

/// Two-sample test for every unordered pair of groups, in group order:
/// (g0, g1), (g0, g2), ..., (g1, g2), ...
pub fn pairwise(groups: &[Group], family: TestFamily, config: &AnalysisConfig) -> Result<Vec<PairwiseResult>> {
    let significance = config.significance()?;
    let test = family.pairwise_test();

    groups
        .iter()
        .tuple_combinations()
        .map(|(a, b)| -> Result<PairwiseResult> {
            let outcome = match family {
                TestFamily::Parametric => stats::welch_t_test(&a.values, &b.values),
                TestFamily::NonParametric => stats::mann_whitney_u(&a.values, &b.values),
            }
            .map_err(|source| Error::GroupTest {
                test,
                group: format!("{} vs {}", a.label, b.label),
                source,
            })?;
            Ok(PairwiseResult {
                group_a: a.label.clone(),
                group_b: b.label.clone(),
                verdict: TestVerdict::new(test, outcome, significance),
            })
        })
        .collect()
}

pub fn pairwise_welch(groups: &[Group], config: &AnalysisConfig) -> Result<Vec<PairwiseResult>> {
    pairwise(groups, TestFamily::Parametric, config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn synthetic_samples(center: f64, noise: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = seed;
        (0..n)
            .map(|_| {
                rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
                let uniform = (rng >> 33) as f64 / (1u64 << 31) as f64;
                center + (uniform - 0.5) * 2.0 * noise
            })
            .collect()
    }

    fn labelled(n: usize) -> Vec<Group> {
        (0..n)
            .map(|i| Group::new(format!("g{i}"), synthetic_samples(10.0, 1.0, 20, i as u64 + 1)))
            .collect()
    }

    #[test]
    fn pairwise_emits_n_choose_2_unique_pairs() {
        let config = AnalysisConfig::default();
        for n in 2..=6 {
            let results = pairwise_welch(&labelled(n), &config).unwrap();
            assert_eq!(results.len(), n * (n - 1) / 2);
            let pairs: HashSet<(String, String)> = results
                .iter()
                .map(|r| {
                    let mut p = [r.group_a.clone(), r.group_b.clone()];
                    p.sort();
                    (p[0].clone(), p[1].clone())
                })
                .collect();
            assert_eq!(pairs.len(), results.len(), "duplicate unordered pair for n={n}");
            assert!(results.iter().all(|r| r.group_a != r.group_b));
        }
    }

    #[test]
    fn pairwise_order_follows_group_order() {
        let results = pairwise_welch(&labelled(3), &AnalysisConfig::default()).unwrap();
        let order: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.group_a.as_str(), r.group_b.as_str()))
            .collect();
        assert_eq!(order, vec![("g0", "g1"), ("g0", "g2"), ("g1", "g2")]);
    }

    #[test]
    fn tight_groups_ten_apart_differ_significantly() {
        let groups = vec![
            Group::new("ten", synthetic_samples(10.0, 0.1, 50, 11)),
            Group::new("twenty", synthetic_samples(20.0, 0.1, 50, 12)),
        ];
        let config = AnalysisConfig::default();
        let welch = pairwise(&groups, TestFamily::Parametric, &config).unwrap();
        let mwu = pairwise(&groups, TestFamily::NonParametric, &config).unwrap();
        assert!(welch[0].significant() && welch[0].verdict.p_value < 0.05);
        assert!(mwu[0].significant());
        assert_eq!(welch[0].verdict.test, TestKind::WelchT);
        assert_eq!(mwu[0].verdict.test, TestKind::MannWhitneyU);
    }

    #[test]
    fn recommendation_requires_both_assumptions() {
        assert_eq!(TestFamily::recommend(true, true), TestFamily::Parametric);
        assert_eq!(TestFamily::recommend(true, false), TestFamily::NonParametric);
        assert_eq!(TestFamily::recommend(false, true), TestFamily::NonParametric);
        assert_eq!(TestFamily::recommend(false, false), TestFamily::NonParametric);
    }

    #[test]
    fn anova_and_kruskal_detect_shifted_group() {
        let groups = vec![
            Group::new("a", synthetic_samples(10.0, 1.0, 30, 1)),
            Group::new("b", synthetic_samples(10.0, 1.0, 30, 2)),
            Group::new("c", synthetic_samples(15.0, 1.0, 30, 3)),
        ];
        let config = AnalysisConfig::default();
        let f = anova(&groups, &config).unwrap();
        let h = kruskal_wallis(&groups, &config).unwrap();
        assert_eq!(f.test, TestKind::Anova);
        assert_eq!(h.test, TestKind::KruskalWallis);
        assert!(f.null_rejected && h.null_rejected);
    }

    #[test]
    fn failing_pair_names_both_groups() {
        let groups = vec![Group::new("a", vec![1.0, 2.0]), Group::new("b", vec![3.0])];
        let err = pairwise_welch(&groups, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, Error::GroupTest { ref group, .. } if group == "a vs b"));
    }
}
