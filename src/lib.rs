//! Test selection for comparing a numeric measurement across the groups of
//! a categorical column.
//!
//! The decision chain: per-group normality (Shapiro-Wilk or
//! Kolmogorov-Smirnov by sample size) picks the variance-homogeneity test
//! (Bartlett or Levene), and the two outcomes together pick the family of
//! difference tests (ANOVA and Welch's t, or Kruskal-Wallis and
//! Mann-Whitney U). Computation returns structured verdicts; [`report`]
//! renders them.

pub mod config;
pub mod dataset;
pub mod difference;
pub mod error;
pub mod explore;
pub mod homogeneity;
pub mod normality;
pub mod pipeline;
pub mod report;
pub mod verdict;

pub use config::AnalysisConfig;
pub use dataset::{Dataset, Group};
pub use error::{Error, Result};
pub use pipeline::{Analysis, analyze};
pub use verdict::{Significance, TestKind, TestVerdict};
