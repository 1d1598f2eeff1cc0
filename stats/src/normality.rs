//! Normality tests.
//!
//! Shapiro-Wilk follows Royston's AS R94 approximation of the weights and
//! of the null distribution of W. The Kolmogorov-Smirnov test compares the
//! sample with a normal distribution whose parameters are estimated from
//! the same sample, so its p-value is optimistic (no Lilliefors correction).

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{Result, StatsError, TestOutcome, mean, normal_quantile, normal_sf, require_len, std_dev};

const SHAPIRO_MAX_N: usize = 5000;

/// Largest sample for which the exact Kolmogorov distribution is evaluated.
const KS_EXACT_MAX_N: usize = 1000;

fn poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Shapiro-Wilk test of the null hypothesis that `data` comes from a normal
/// distribution. Valid for 3 <= n <= 5000.
pub fn shapiro_wilk(data: &[f64]) -> Result<TestOutcome> {
    require_len(data, 3)?;
    let n = data.len();
    if n > SHAPIRO_MAX_N {
        return Err(StatsError::TooManyObservations {
            max: SHAPIRO_MAX_N,
            got: n,
        });
    }

    let mut x = data.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] < 1e-19 {
        return Err(StatsError::ZeroVariance);
    }

    let a = shapiro_weights(n)?;

    let m = mean(&x);
    let ssq: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
    let b: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (b * b / ssq).min(1.0);

    Ok(TestOutcome::new(w, shapiro_p_value(w, n)?))
}

/// Antisymmetric weights a_1..a_{n/2} for the largest-minus-smallest pairs.
fn shapiro_weights(n: usize) -> Result<Vec<f64>> {
    const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
    const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];

    let half = n / 2;
    if n == 3 {
        return Ok(vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    let an25 = n as f64 + 0.25;
    let mut m = Vec::with_capacity(half);
    for i in 1..=half {
        m.push(normal_quantile((i as f64 - 0.375) / an25)?);
    }
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (first, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        (1, fac)
    };
    for i in first..half {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

fn shapiro_p_value(w: f64, n: usize) -> Result<f64> {
    const G: [f64; 2] = [-2.273, 0.459];
    const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
    const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
    const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

    let nf = n as f64;
    if n == 3 {
        // exact distribution of W for n = 3
        let pi6 = 6.0 / std::f64::consts::PI;
        let stqr = std::f64::consts::FRAC_PI_3;
        return Ok((pi6 * (w.sqrt().asin() - stqr)).max(0.0));
    }

    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }
    let mut y = w1.ln();

    let (mu, sigma) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return Ok(0.0);
        }
        y = -(gamma - y).ln();
        (poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    normal_sf((y - mu) / sigma)
}

/// One-sample Kolmogorov-Smirnov test of `data` against a normal
/// distribution with mean and standard deviation estimated from `data`.
pub fn ks_normal_fitted(data: &[f64]) -> Result<TestOutcome> {
    require_len(data, 2)?;
    let sd = std_dev(data);
    if sd == 0.0 {
        return Err(StatsError::ZeroVariance);
    }
    let reference = Normal::new(mean(data), sd).map_err(StatsError::distribution)?;

    let mut x = data.to_vec();
    x.sort_by(f64::total_cmp);
    let n = x.len() as f64;

    let d = x
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let cdf = reference.cdf(v);
            let above = (i + 1) as f64 / n - cdf;
            let below = cdf - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max);

    Ok(TestOutcome::new(d, kolmogorov_sf(d, x.len())))
}

/// P(D_n >= d) for the two-sided one-sample Kolmogorov-Smirnov statistic.
///
/// Exact (Marsaglia, Tsang & Wang 2003) for n up to 1000, Stephens'
/// corrected asymptotic series above that.
pub fn kolmogorov_sf(d: f64, n: usize) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    if d >= 1.0 {
        return 0.0;
    }
    let p = if n <= KS_EXACT_MAX_N {
        1.0 - kolmogorov_cdf_exact(d, n)
    } else {
        let sqrt_n = (n as f64).sqrt();
        kolmogorov_asymptotic_sf((sqrt_n + 0.12 + 0.11 / sqrt_n) * d)
    };
    p.clamp(0.0, 1.0)
}

/// Q_KS(lambda) = 2 * sum_{k>=1} (-1)^(k-1) exp(-2 k^2 lambda^2)
fn kolmogorov_asymptotic_sf(lambda: f64) -> f64 {
    if lambda < 0.2 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let term = (-2.0 * (k as f64).powi(2) * lambda * lambda).exp();
        sum += sign * term;
        if term < 1e-16 {
            break;
        }
        sign = -sign;
    }
    2.0 * sum
}

/// P(D_n < d) via the Marsaglia-Tsang-Wang matrix power.
fn kolmogorov_cdf_exact(d: f64, n: usize) -> f64 {
    let nf = n as f64;
    let s = d * d * nf;
    // far tail: the series approximation is accurate to ~7 digits here
    if s > 7.24 || (s > 3.76 && n > 99) {
        return 1.0 - 2.0 * (-(2.000071 + 0.331 / nf.sqrt() + 1.409 / nf) * s).exp();
    }

    let k = (nf * d) as usize + 1;
    let m = 2 * k - 1;
    let h = k as f64 - nf * d;

    let mut hm = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            if i + 1 >= j {
                hm[i * m + j] = 1.0;
            }
        }
    }
    for i in 0..m {
        hm[i * m] -= h.powi(i as i32 + 1);
        hm[(m - 1) * m + i] -= h.powi((m - i) as i32);
    }
    if 2.0 * h - 1.0 > 0.0 {
        hm[(m - 1) * m] += (2.0 * h - 1.0).powi(m as i32);
    }
    for i in 0..m {
        for j in 0..m {
            if i + 1 > j {
                for g in 1..=(i + 1 - j) {
                    hm[i * m + j] /= g as f64;
                }
            }
        }
    }

    let (q, mut exp10) = matrix_power(&hm, 0, m, n);
    let mut s = q[(k - 1) * m + k - 1];
    for i in 1..=n {
        s = s * i as f64 / nf;
        if s < 1e-140 {
            s *= 1e140;
            exp10 -= 140;
        }
    }
    s * 10f64.powi(exp10)
}

fn matrix_multiply(a: &[f64], b: &[f64], m: usize) -> Vec<f64> {
    let mut c = vec![0.0; m * m];
    for i in 0..m {
        for k in 0..m {
            let aik = a[i * m + k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..m {
                c[i * m + j] += aik * b[k * m + j];
            }
        }
    }
    c
}

/// Raises `a` (scaled by 10^exp) to `power`, returning the mantissa matrix
/// and its decimal exponent.
fn matrix_power(a: &[f64], exp: i32, m: usize, power: usize) -> (Vec<f64>, i32) {
    if power == 1 {
        return (a.to_vec(), exp);
    }
    let (half, half_exp) = matrix_power(a, exp, m, power / 2);
    let squared = matrix_multiply(&half, &half, m);
    let (mut v, mut v_exp) = if power % 2 == 0 {
        (squared, 2 * half_exp)
    } else {
        (matrix_multiply(a, &squared, m), exp + 2 * half_exp)
    };
    if v[(m / 2) * m + m / 2] > 1e140 {
        for x in &mut v {
            *x *= 1e-140;
        }
        v_exp += 140;
    }
    (v, v_exp)
}
