use crate::{Result, StatsError, TestOutcome, f_sf, mean, require_groups, require_len, t_two_tailed, variance};

/// Welch's t-test for two independent samples with unequal variance.
/// The statistic is signed as `mean(a) - mean(b)`; the p-value is two-tailed.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    require_len(a, 2)?;
    require_len(b, 2)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let v1 = variance(a);
    let v2 = variance(b);
    let diff = mean(a) - mean(b);

    // Both samples constant
    if v1 == 0.0 && v2 == 0.0 {
        return Ok(if diff == 0.0 {
            TestOutcome::new(0.0, 1.0)
        } else {
            TestOutcome::new(diff.signum() * f64::INFINITY, 0.0)
        });
    }

    let se = (v1 / n1 + v2 / n2).sqrt();
    let t = diff / se;

    // Welch-Satterthwaite degrees of freedom
    let num = (v1 / n1 + v2 / n2).powi(2);
    let den = (v1 / n1).powi(2) / (n1 - 1.0) + (v2 / n2).powi(2) / (n2 - 1.0);
    let df = num / den;

    Ok(TestOutcome::new(t, t_two_tailed(t, df)?))
}

/// One-way analysis of variance across `groups`.
pub fn f_oneway(groups: &[&[f64]]) -> Result<TestOutcome> {
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

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n_total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = mean(g);
        ss_between += g.len() as f64 * (m - grand_mean).powi(2);
        ss_within += g.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }

    if ss_within == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);

    Ok(TestOutcome::new(f, f_sf(f, df_between, df_within)?))
}
