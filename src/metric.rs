//! Block similarity/dissimilarity metrics.
//!
//! Every metric consumes two equally sized windows (`a` from the left image,
//! `b` from the right image), laid out row-major with `(2r+1)^2` samples, and
//! returns a scalar score accumulated in f64. The set is closed:
//!
//! - SSD: `Σ (a_i − b_i)^2`, minimised.
//! - SSD/mean: `Σ (a_i/mean_a − b_i/mean_b)^2`, minimised. A window whose mean
//!   is (numerically) zero is degenerate and scores `+∞`; the matcher treats
//!   such candidates as unexplorable.
//! - NCC: `|cov(a, b)| / (σ_a σ_b)` with sample (n−1) normalisation, in
//!   [0, 1], maximised. Flat windows (σ below [`NCC_FLAT_EPS`]) score 0.
//! - L^p: `Σ |a_i − b_i|^p`, minimised; `p <= 0` falls back to 1.
//!
//! The variant is resolved once into a [`Scorer`] (plain function pointer plus
//! exponent) so the candidate loop never matches on the enum.

use log::warn;
use serde::{Deserialize, Serialize};

/// Standard deviation below which an NCC window is considered flat.
pub const NCC_FLAT_EPS: f64 = 1e-20;
/// Absolute block mean below which SSD/mean is considered degenerate.
pub const MEAN_EPS: f64 = 1e-12;
/// Exponent used when a non-positive L^p exponent is configured.
pub const DEFAULT_LP_EXPONENT: f64 = 1.0;

/// Metric selector as it appears in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricKind {
    Ssd,
    SsdMean,
    Ncc,
    Lp { p: f64 },
}

impl Default for MetricKind {
    fn default() -> Self {
        MetricKind::Ssd
    }
}

impl MetricKind {
    /// True when lower scores are better.
    pub fn minimize(&self) -> bool {
        !matches!(self, MetricKind::Ncc)
    }

    /// Replace a non-positive L^p exponent by the default.
    pub fn sanitized(self) -> Self {
        match self {
            MetricKind::Lp { p } if !(p > 0.0) => {
                warn!("L^p exponent {p} is not positive; using {DEFAULT_LP_EXPONENT}");
                MetricKind::Lp {
                    p: DEFAULT_LP_EXPONENT,
                }
            }
            other => other,
        }
    }

    /// Resolve the variant into a reusable scorer.
    pub fn scorer(self) -> Scorer {
        match self.sanitized() {
            MetricKind::Ssd => Scorer::new(ssd_score, 0.0, true),
            MetricKind::SsdMean => Scorer::new(ssd_mean_score, 0.0, true),
            MetricKind::Ncc => Scorer::new(ncc_score, 0.0, false),
            MetricKind::Lp { p } => Scorer::new(lp_score, p, true),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Ssd => "ssd",
            MetricKind::SsdMean => "ssd_mean",
            MetricKind::Ncc => "ncc",
            MetricKind::Lp { .. } => "lp",
        }
    }
}

type ScoreFn = fn(&[f32], &[f32], f64) -> f64;

/// Metric resolved for the hot loop.
#[derive(Clone, Copy, Debug)]
pub struct Scorer {
    func: ScoreFn,
    p: f64,
    minimize: bool,
}

impl Scorer {
    fn new(func: ScoreFn, p: f64, minimize: bool) -> Self {
        Self { func, p, minimize }
    }

    #[inline]
    pub fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        (self.func)(a, b, self.p)
    }

    #[inline]
    pub fn minimize(&self) -> bool {
        self.minimize
    }

    /// Strict improvement of `candidate` over `current` in the metric's sense.
    #[inline]
    pub fn is_better(&self, candidate: f64, current: f64) -> bool {
        if self.minimize {
            candidate < current
        } else {
            candidate > current
        }
    }

    /// Ideal score: an exact match cannot be improved upon.
    #[inline]
    pub fn ideal(&self) -> f64 {
        if self.minimize {
            0.0
        } else {
            1.0
        }
    }
}

/// Sum of squared differences.
pub fn ssd(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// SSD between mean-normalised windows; `+∞` when either mean is ~0.
pub fn ssd_div_mean(a: &[f32], b: &[f32]) -> f64 {
    let mean_a = mean(a);
    let mean_b = mean(b);
    if mean_a.abs() < MEAN_EPS || mean_b.abs() < MEAN_EPS {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 / mean_a - y as f64 / mean_b;
            d * d
        })
        .sum()
}

/// Absolute Pearson correlation with sample normalisation.
pub fn ncc(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mean_a = mean(&a[..n]);
    let mean_b = mean(&b[..n]);
    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let da = x as f64 - mean_a;
        let db = y as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (n - 1) as f64;
    let sigma_a = (var_a / denom).sqrt();
    let sigma_b = (var_b / denom).sqrt();
    if sigma_a < NCC_FLAT_EPS || sigma_b < NCC_FLAT_EPS {
        return 0.0;
    }
    ((cov / denom).abs() / (sigma_a * sigma_b)).min(1.0)
}

/// L^p pseudo-norm raised to the p-th power.
pub fn lp_distance(a: &[f32], b: &[f32], p: f64) -> f64 {
    let p = if p > 0.0 { p } else { DEFAULT_LP_EXPONENT };
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x as f64 - y as f64).abs().powf(p))
        .sum()
}

fn ssd_score(a: &[f32], b: &[f32], _p: f64) -> f64 {
    ssd(a, b)
}

fn ssd_mean_score(a: &[f32], b: &[f32], _p: f64) -> f64 {
    ssd_div_mean(a, b)
}

fn ncc_score(a: &[f32], b: &[f32], _p: f64) -> f64 {
    ncc(a, b)
}

fn lp_score(a: &[f32], b: &[f32], p: f64) -> f64 {
    lp_distance(a, b, p)
}

#[inline]
fn mean(v: &[f32]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().map(|&x| x as f64).sum::<f64>() / v.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ssd_of_identical_blocks_is_zero() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(ssd(&a, &a), 0.0);
        assert_eq!(ssd(&a, &[0.0, 2.0, 3.0, 6.0]), 5.0);
    }

    #[test]
    fn ncc_of_flat_block_is_zero() {
        let flat = [7.0f32; 9];
        let textured = [1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 0.0, 6.0];
        assert_eq!(ncc(&flat, &textured), 0.0);
        assert_eq!(ncc(&flat, &flat), 0.0);
    }

    #[test]
    fn ncc_is_invariant_to_gain_and_offset() {
        let a = [1.0f32, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 0.0, 6.0];
        let b: Vec<f32> = a.iter().map(|v| 3.0 * v + 10.0).collect();
        assert!((ncc(&a, &b) - 1.0).abs() < 1e-12);
        let neg: Vec<f32> = a.iter().map(|v| -v).collect();
        assert!((ncc(&a, &neg) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ssd_mean_guards_zero_mean() {
        let zero = [0.0f32; 9];
        let other = [1.0f32; 9];
        assert!(ssd_div_mean(&zero, &other).is_infinite());
        assert!(ssd_div_mean(&other, &zero).is_infinite());
        let doubled = [2.0f32; 9];
        assert_eq!(ssd_div_mean(&other, &doubled), 0.0);
    }

    #[test]
    fn lp_with_p_two_matches_ssd() {
        let a = [1.0f32, 2.5, -3.0, 4.0, 0.5];
        let b = [0.0f32, 2.0, 1.0, 4.5, -2.0];
        assert!((lp_distance(&a, &b, 2.0) - ssd(&a, &b)).abs() < 1e-9);
        assert!((lp_distance(&a, &b, 1.0) - 8.5).abs() < 1e-9);
    }

    #[test]
    fn non_positive_exponent_falls_back_to_one() {
        assert_eq!(
            MetricKind::Lp { p: -2.0 }.sanitized(),
            MetricKind::Lp { p: 1.0 }
        );
        assert_eq!(MetricKind::Lp { p: 0.0 }.sanitized(), MetricKind::Lp { p: 1.0 });
        let a = [1.0f32, 4.0];
        let b = [2.0f32, 2.0];
        let scorer = MetricKind::Lp { p: 0.0 }.scorer();
        assert_eq!(scorer.score(&a, &b), 3.0);
    }

    #[test]
    fn scorer_direction_follows_metric() {
        assert!(MetricKind::Ssd.scorer().minimize());
        assert!(!MetricKind::Ncc.scorer().minimize());
        let ncc = MetricKind::Ncc.scorer();
        assert!(ncc.is_better(0.8, 0.5));
        assert!(!ncc.is_better(0.5, 0.5));
    }

    #[test]
    fn metric_kind_deserializes_from_tagged_json() {
        let kind: MetricKind = serde_json::from_str(r#"{"kind":"lp","p":1.5}"#).unwrap();
        assert_eq!(kind, MetricKind::Lp { p: 1.5 });
        let kind: MetricKind = serde_json::from_str(r#"{"kind":"ssd_mean"}"#).unwrap();
        assert_eq!(kind, MetricKind::SsdMean);
    }

    proptest! {
        #[test]
        fn prop_ncc_within_unit_interval(
            a in prop::collection::vec(-1000.0f32..1000.0, 25),
            b in prop::collection::vec(-1000.0f32..1000.0, 25),
        ) {
            let v = ncc(&a, &b);
            prop_assert!(v.is_finite());
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_ssd_symmetric_and_non_negative(
            a in prop::collection::vec(-100.0f32..100.0, 9),
            b in prop::collection::vec(-100.0f32..100.0, 9),
        ) {
            let ab = ssd(&a, &b);
            prop_assert!(ab >= 0.0);
            prop_assert_eq!(ab, ssd(&b, &a));
        }
    }
}
