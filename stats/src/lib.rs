mod descriptive;
mod error;
mod homogeneity;
mod location;
mod normality;
mod rank;

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

pub use descriptive::{Summary, describe, quantile};
pub use error::StatsError;
pub use homogeneity::{Center, bartlett, levene};
pub use location::{f_oneway, welch_t_test};
pub use normality::{kolmogorov_sf, ks_normal_fitted, shapiro_wilk};
pub use rank::{kruskal_wallis, mann_whitney_u, rank_average};

pub type Result<T> = std::result::Result<T, StatsError>;

/// Statistic and p-value of a single hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
        }
    }
}

pub fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance (Bessel-corrected).
pub fn variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64
}

pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

fn require_len(data: &[f64], needed: usize) -> Result<()> {
    if data.len() < needed {
        return Err(StatsError::InsufficientData {
            needed,
            got: data.len(),
        });
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(StatsError::NonFinite);
    }
    Ok(())
}

fn require_groups(groups: &[&[f64]], needed: usize) -> Result<()> {
    if groups.len() < needed {
        return Err(StatsError::TooFewGroups {
            needed,
            got: groups.len(),
        });
    }
    Ok(())
}

// Tail probabilities. Upper tails of symmetric distributions are taken
// from the lower tail to keep precision for small p-values.

fn normal_sf(z: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(StatsError::distribution)?;
    Ok(normal.cdf(-z))
}

fn normal_quantile(p: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(StatsError::distribution)?;
    Ok(normal.inverse_cdf(p))
}

fn t_two_tailed(t: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(StatsError::distribution)?;
    Ok(2.0 * dist.cdf(-t.abs()))
}

fn chi2_sf(x: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df).map_err(StatsError::distribution)?;
    Ok(1.0 - dist.cdf(x))
}

fn f_sf(x: f64, df1: f64, df2: f64) -> Result<f64> {
    let dist = FisherSnedecor::new(df1, df2).map_err(StatsError::distribution)?;
    Ok(1.0 - dist.cdf(x))
}
