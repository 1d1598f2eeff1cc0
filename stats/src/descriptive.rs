use crate::{Result, mean, require_len, std_dev};

/// Descriptive statistics of a numeric sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for a single observation.
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn describe(data: &[f64]) -> Result<Summary> {
    require_len(data, 1)?;
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    Ok(Summary {
        count: data.len(),
        mean: mean(data),
        std: if data.len() > 1 { std_dev(data) } else { f64::NAN },
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Quantile of already-sorted data with linear interpolation between
/// order statistics. NaN for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
