use std::fmt;

use serde::Serialize;
use stats::TestOutcome;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    ShapiroWilk,
    KolmogorovSmirnov,
    Bartlett,
    Levene,
    Anova,
    KruskalWallis,
    WelchT,
    MannWhitneyU,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::ShapiroWilk => write!(f, "Shapiro-Wilk"),
            TestKind::KolmogorovSmirnov => write!(f, "Kolmogorov-Smirnov"),
            TestKind::Bartlett => write!(f, "Bartlett"),
            TestKind::Levene => write!(f, "Levene"),
            TestKind::Anova => write!(f, "one-way ANOVA"),
            TestKind::KruskalWallis => write!(f, "Kruskal-Wallis"),
            TestKind::WelchT => write!(f, "Welch's t"),
            TestKind::MannWhitneyU => write!(f, "Mann-Whitney U"),
        }
    }
}

/// Significance level used to classify every p-value.
///
/// The null hypothesis is rejected iff `p < alpha`; a p-value exactly at
/// alpha is not rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significance {
    alpha: f64,
}

impl Significance {
    pub const DEFAULT_ALPHA: f64 = 0.05;

    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "alpha must be in (0, 1), got {alpha}"
            )));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn rejects(&self, p_value: f64) -> bool {
        p_value < self.alpha
    }
}

impl Default for Significance {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
        }
    }
}

/// Outcome of one hypothesis test classified against a significance level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestVerdict {
    pub test: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub null_rejected: bool,
}

impl TestVerdict {
    pub fn new(test: TestKind, outcome: TestOutcome, significance: Significance) -> Self {
        Self {
            test,
            statistic: outcome.statistic,
            p_value: outcome.p_value,
            null_rejected: significance.rejects(outcome.p_value),
        }
    }
}
