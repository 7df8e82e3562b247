//! Recency-weighted least-squares fit over calibration pairs.
//!
//! The fit models `unfiltered = slope * glucose + intercept`. Later pairs are
//! favoured by a per-step multiplier in `[1, 2]` that is applied to the running
//! cross/square sums as a whole, so each step compounds the weight of everything
//! accumulated before it. `sum_x`/`sum_y` stay unweighted. Numeric outputs depend
//! on this exact accumulation; see the tests below before changing it.

use crate::error::{CalError, Result};
use crate::types::{CalibrationPair, CalibrationType};

/// Result of a fitting engine, before policy acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub slope: f64,
    pub intercept: f64,
    pub kind: CalibrationType,
    /// Residual standard error of the slope (informational only).
    pub slope_error: Option<f64>,
    /// Residual standard error of the intercept (informational only).
    pub intercept_error: Option<f64>,
}

/// Recency multiplier for pair `i`, given offsets from the first pair.
///
/// `w[0] = 1`; `w[i] = 1 + t[i-1] / (2 * t[n-1])`, reset to 1 when outside `[1, 2]`
/// or not finite (e.g. all pairs share one timestamp).
#[inline]
pub(crate) fn recency_weight(offsets: &[i64], i: usize) -> f64 {
    if i == 0 {
        return 1.0;
    }
    let span = offsets[offsets.len() - 1] as f64;
    let w = 1.0 + offsets[i - 1] as f64 / (span * 2.0);
    if (1.0..=2.0).contains(&w) { w } else { 1.0 }
}

/// Weighted least-squares regression over `pairs` (time-ordered ascending).
pub fn lsr_fit(pairs: &[CalibrationPair]) -> Result<Fit> {
    let n_pts = pairs.len();
    if n_pts < 2 {
        return Err(CalError::InsufficientData {
            needed: 2,
            got: n_pts,
        });
    }
    let n = n_pts as f64;

    let sum_x: f64 = pairs.iter().map(|p| p.glucose).sum();
    let sum_y: f64 = pairs.iter().map(|p| p.unfiltered).sum();
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut sq_diff_x = 0.0f64;
    let mut sq_diff_y = 0.0f64;
    for p in pairs {
        let dx = p.glucose - mean_x;
        let dy = p.unfiltered - mean_y;
        sq_diff_x += dx * dx;
        sq_diff_y += dy * dy;
    }
    let stddev_x = (sq_diff_x / (n - 1.0)).sqrt();
    let stddev_y = (sq_diff_y / (n - 1.0)).sqrt();

    let first = pairs[0].read_date_ms;
    let offsets: Vec<i64> = pairs.iter().map(|p| p.read_date_ms.saturating_sub(first)).collect();

    let mut sum_xy = 0.0f64;
    let mut sum_x_sq = 0.0f64;
    let mut sum_y_sq = 0.0f64;
    for (i, p) in pairs.iter().enumerate() {
        let w = recency_weight(&offsets, i);
        tracing::trace!(record = i, read_date_ms = p.read_date_ms, w, "lsr weighted multiplier");
        // Compounding: the multiplier scales the whole running sum.
        sum_xy = (sum_xy + p.glucose * p.unfiltered) * w;
        sum_x_sq = (sum_x_sq + p.glucose * p.glucose) * w;
        sum_y_sq = (sum_y_sq + p.unfiltered * p.unfiltered) * w;
    }

    let delta = n * sum_x_sq - sum_x * sum_x;
    let denominator = (delta * (n * sum_y_sq - sum_y * sum_y)).sqrt();
    if denominator == 0.0 || stddev_x == 0.0 || !denominator.is_finite() || !stddev_x.is_finite()
    {
        return Err(CalError::DegenerateFit);
    }

    let r = (n * sum_xy - sum_x * sum_y) / denominator;
    let slope = r * stddev_y / stddev_x;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(CalError::NonFinite);
    }

    let (slope_error, intercept_error) = if n_pts > 2 {
        let var_sum: f64 = pairs
            .iter()
            .map(|p| {
                let res = p.unfiltered - intercept - slope * p.glucose;
                res * res
            })
            .sum();
        let vari = var_sum / (n - 2.0);
        let finite = |v: f64| v.is_finite().then_some(v);
        (
            finite((n / delta * vari).sqrt()),
            finite((vari / delta * sum_x_sq).sqrt()),
        )
    } else {
        (None, None)
    };

    tracing::debug!(num_points = n_pts, slope, intercept, "lsr fit");

    Ok(Fit {
        slope,
        intercept,
        kind: CalibrationType::LeastSquaresRegression,
        slope_error,
        intercept_error,
    })
}
