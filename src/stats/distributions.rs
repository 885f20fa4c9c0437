//! Distribution primitives shared by the inference suite.
//!
//! Hand-rolled special functions, kept in-crate: the p-value precision
//! needed here (two significant figures around conventional thresholds) is
//! comfortably within reach of classical approximations.

use std::f64::consts::PI;

/// Natural log of the gamma function (Lanczos approximation, g = 7).
///
/// Accurate to ~1e-13 over the positive reals, which is far beyond what
/// the tests built on it require.
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 8] = [
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula keeps the approximation in its stable range.
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = 0.999_999_999_999_809_93;
    for (i, &c) in COEFFICIENTS.iter().enumerate() {
        acc += c / (x + (i + 1) as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Natural log of the binomial coefficient C(n, k), continuously extended
/// to fractional k via the gamma function.
///
/// The continuous extension is what lets the binomial test evaluate the
/// half-integer k produced by even tie splitting.
#[must_use]
pub fn ln_choose(n: f64, k: f64) -> f64 {
    if k < 0.0 || k > n {
        return f64::NEG_INFINITY;
    }
    ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
}

/// Binomial point probability mass, continuously extended in k.
#[must_use]
pub fn binomial_pmf(n: f64, k: f64, p: f64) -> f64 {
    if p <= 0.0 {
        return if k == 0.0 { 1.0 } else { 0.0 };
    }
    if p >= 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }
    (ln_choose(n, k) + k * p.ln() + (n - k) * (1.0 - p).ln()).exp()
}

/// Smallest integer k with `CDF(k; n, p) >= q` (the binomial quantile).
///
/// Linear scan over the support; n here is an observation count, so the
/// scan is negligible next to the aggregation pass that produced it.
#[must_use]
pub fn binomial_ppf(q: f64, n: u64, p: f64) -> u64 {
    if p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return n;
    }
    let mut cdf = 0.0;
    for k in 0..=n {
        cdf += binomial_pmf(n as f64, k as f64, p);
        if cdf >= q - 1e-12 {
            return k;
        }
    }
    n
}

/// Two-sided exact binomial p-value against the null p = 0.5.
///
/// Sums every point probability not exceeding the observed one (the
/// standard small-sample two-sided definition, with a relative tolerance
/// for floating-point equality of symmetric terms). Accepts fractional k
/// from tie splitting.
#[must_use]
pub fn binomial_two_sided_pvalue(k: f64, n: u64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let n_f = n as f64;
    let observed = binomial_pmf(n_f, k, 0.5);
    let mut p = 0.0;
    for i in 0..=n {
        let mass = binomial_pmf(n_f, i as f64, 0.5);
        if mass <= observed * (1.0 + 1e-7) {
            p += mass;
        }
    }
    p.min(1.0)
}

/// Error function approximation (Abramowitz & Stegun 7.1.26).
///
/// Maximum absolute error 1.5e-7.
#[must_use]
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// Standard normal CDF.
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / 2.0_f64.sqrt()))
}

/// Upper-tail survival of the chi-square distribution with 1 degree of
/// freedom: `P(X > x) = erfc(sqrt(x/2))`.
#[must_use]
pub fn chi_square_survival_1df(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    (1.0 - erf((x / 2.0).sqrt())).clamp(0.0, 1.0)
}

/// Logistic sigmoid.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
