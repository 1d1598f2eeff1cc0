use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::dataset::{Group, samples};
use crate::error::{Error, Result};
use crate::verdict::{TestKind, TestVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LeveneCenter {
    /// Brown-Forsythe variant
    #[default]
    Median,
    Mean,
}

impl From<LeveneCenter> for stats::Center {
    fn from(center: LeveneCenter) -> Self {
        match center {
            LeveneCenter::Median => stats::Center::Median,
            LeveneCenter::Mean => stats::Center::Mean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomogeneityTest {
    Bartlett,
    Levene,
}

impl HomogeneityTest {
    /// Bartlett when the groups are normal, Levene otherwise.
    pub fn select(normal: bool) -> Self {
        if normal {
            HomogeneityTest::Bartlett
        } else {
            HomogeneityTest::Levene
        }
    }

    pub fn kind(self) -> TestKind {
        match self {
            HomogeneityTest::Bartlett => TestKind::Bartlett,
            HomogeneityTest::Levene => TestKind::Levene,
        }
    }
}

/// Run `test` across all groups at once. A verdict that does not reject
/// the null means the variances are homogeneous.
pub fn check(groups: &[Group], test: HomogeneityTest, config: &AnalysisConfig) -> Result<TestVerdict> {
    let significance = config.significance()?;
    let samples = samples(groups);
    tracing::debug!(test = %test.kind(), groups = groups.len(), "running homogeneity test");

    let outcome = match test {
        HomogeneityTest::Bartlett => stats::bartlett(&samples),
        HomogeneityTest::Levene => stats::levene(&samples, config.levene_center.into()),
    }
    .map_err(Error::test(test.kind()))?;

    Ok(TestVerdict::new(test.kind(), outcome, significance))
}

pub fn bartlett(groups: &[Group], config: &AnalysisConfig) -> Result<TestVerdict> {
    check(groups, HomogeneityTest::Bartlett, config)
}

pub fn levene(groups: &[Group], config: &AnalysisConfig) -> Result<TestVerdict> {
    check(groups, HomogeneityTest::Levene, config)
}
