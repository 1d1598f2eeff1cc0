use crate::{Result, StatsError, TestOutcome, chi2_sf, f_sf, mean, quantile, require_groups, require_len, variance};

/// Location each group's absolute deviations are measured from in Levene's test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Center {
    /// Brown-Forsythe variant, robust to non-normal data.
    #[default]
    Median,
    Mean,
}

/// Bartlett's test for equal variances across `groups`.
///
/// Sensitive to departures from normality; use [`levene`] for non-normal data.
pub fn bartlett(groups: &[&[f64]]) -> Result<TestOutcome> {
    require_groups(groups, 2)?;
    for g in groups {
        require_len(g, 2)?;
    }

    let k = groups.len() as f64;
    let n_total: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let variances: Vec<f64> = groups.iter().map(|g| variance(g)).collect();
    if variances.iter().any(|&v| v == 0.0) {
        return Err(StatsError::ZeroVariance);
    }

    let pooled = groups
        .iter()
        .zip(&variances)
        .map(|(g, v)| (g.len() as f64 - 1.0) * v)
        .sum::<f64>()
        / (n_total - k);

    let numer = (n_total - k) * pooled.ln()
        - groups
            .iter()
            .zip(&variances)
            .map(|(g, v)| (g.len() as f64 - 1.0) * v.ln())
            .sum::<f64>();
    let denom = 1.0
        + (groups.iter().map(|g| 1.0 / (g.len() as f64 - 1.0)).sum::<f64>() - 1.0 / (n_total - k))
            / (3.0 * (k - 1.0));

    let t = numer / denom;
    Ok(TestOutcome::new(t, chi2_sf(t, k - 1.0)?))
}

/// Levene's test for equal variances across `groups`.
pub fn levene(groups: &[&[f64]], center: Center) -> Result<TestOutcome> {
    require_groups(groups, 2)?;
    for g in groups {
        require_len(g, 1)?;
    }

    let k = groups.len();
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return Err(StatsError::InsufficientData {
            needed: k + 1,
            got: n_total,
        });
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let c = match center {
                Center::Mean => mean(g),
                Center::Median => {
                    let mut sorted = g.to_vec();
                    sorted.sort_by(f64::total_cmp);
                    quantile(&sorted, 0.5)
                }
            };
            g.iter().map(|x| (x - c).abs()).collect()
        })
        .collect();

    let group_means: Vec<f64> = deviations.iter().map(|z| mean(z)).collect();
    let grand_mean = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * m)
        .sum::<f64>()
        / n_total as f64;

    let numer = (n_total - k) as f64
        * deviations
            .iter()
            .zip(&group_means)
            .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
            .sum::<f64>();
    let spread: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();
    if spread == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    let df1 = (k - 1) as f64;
    let df2 = (n_total - k) as f64;
    let w = numer / (df1 * spread);
    Ok(TestOutcome::new(w, f_sf(w, df1, df2)?))
}
