use crate::{Result, StatsError, TestOutcome, chi2_sf, normal_sf, require_groups, require_len};

/// 1-based ranks with ties assigned their average rank, plus the tie
/// term sum(t^3 - t) over tie groups.
pub fn rank_average(data: &[f64]) -> (Vec<f64>, f64) {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut ties = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && data[order[j]] == data[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        let t = (j - i) as f64;
        ties += t * t * t - t;
        i = j;
    }
    (ranks, ties)
}

/// Kruskal-Wallis H test (rank-based one-way ANOVA) with tie correction.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestOutcome> {
    require_groups(groups, 2)?;
    for g in groups {
        require_len(g, 1)?;
    }

    let combined: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n = combined.len() as f64;
    let (ranks, ties) = rank_average(&combined);

    let mut offset = 0;
    let mut h = 0.0;
    for g in groups {
        let rank_sum: f64 = ranks[offset..offset + g.len()].iter().sum();
        h += rank_sum * rank_sum / g.len() as f64;
        offset += g.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - ties / (n * n * n - n);
    if correction <= 0.0 {
        return Err(StatsError::ZeroVariance);
    }
    h /= correction;

    let df = (groups.len() - 1) as f64;
    Ok(TestOutcome::new(h, chi2_sf(h, df)?))
}

/// Two-sided Mann-Whitney U test. The statistic is U of the first sample;
/// the p-value uses the normal approximation with tie and continuity
/// correction.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    require_len(a, 1)?;
    require_len(b, 1)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    let mut combined = Vec::with_capacity(a.len() + b.len());
    combined.extend_from_slice(a);
    combined.extend_from_slice(b);
    let (ranks, ties) = rank_average(&combined);

    let r1: f64 = ranks[..a.len()].iter().sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;

    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)))).sqrt();
    if sigma.is_nan() || sigma <= 0.0 {
        return Ok(TestOutcome::new(u1, 1.0));
    }

    let z = ((u1 - mu).abs() - 0.5).max(0.0) / sigma;
    Ok(TestOutcome::new(u1, 2.0 * normal_sf(z)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_close, synthetic_samples};

    #[test]
    fn ranks_average_ties() {
        let (ranks, ties) = rank_average(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(ranks, vec![2.0, 3.5, 3.5, 1.0]);
        assert_eq!(ties, 6.0);
    }

    #[test]
    fn kruskal_matches_hand_computation() {
        // rank sums 6, 15, 24: H = 12/90 * 279 - 30 = 7.2, p = exp(-3.6)
        let r = kruskal_wallis(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]]).unwrap();
        assert_close(r.statistic, 7.2, 1e-9);
        assert_close(r.p_value, (-3.6f64).exp(), 1e-8);
    }

    #[test]
    fn kruskal_interleaved_groups_not_significant() {
        let r = kruskal_wallis(&[&[1.0, 4.0, 7.0], &[2.0, 5.0, 8.0], &[3.0, 6.0, 9.0]]).unwrap();
        assert!(r.p_value > 0.5, "interleaved groups flagged: p={}", r.p_value);
    }

    #[test]
    fn kruskal_all_identical_is_degenerate() {
        assert_eq!(
            kruskal_wallis(&[&[1.0, 1.0], &[1.0, 1.0]]),
            Err(StatsError::ZeroVariance)
        );
    }

    #[test]
    fn mann_whitney_separated_samples() {
        let r = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(r.statistic, 0.0);
        // z = (4.5 - 0.5) / sqrt(5.25)
        let z: f64 = 4.0 / 5.25f64.sqrt();
        assert_close(r.p_value, 2.0 * normal_sf(z).unwrap(), 1e-12);
        assert!(r.p_value < 0.1);
    }

    #[test]
    fn mann_whitney_u_is_complementary() {
        let a = synthetic_samples(10.0, 3.0, 20, 1);
        let b = synthetic_samples(11.0, 3.0, 25, 2);
        let ab = mann_whitney_u(&a, &b).unwrap();
        let ba = mann_whitney_u(&b, &a).unwrap();
        assert_close(ab.statistic + ba.statistic, 20.0 * 25.0, 1e-9);
        assert_close(ab.p_value, ba.p_value, 1e-12);
    }

    #[test]
    fn mann_whitney_clear_shift_is_significant() {
        let a = synthetic_samples(10.0, 1.0, 40, 3);
        let b = synthetic_samples(20.0, 1.0, 40, 4);
        assert!(mann_whitney_u(&a, &b).unwrap().p_value < 1e-6);
    }

    #[test]
    fn mann_whitney_all_tied_is_not_significant() {
        let r = mann_whitney_u(&[2.0, 2.0], &[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(r.p_value, 1.0);
    }
}
