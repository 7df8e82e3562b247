//! One-point calibration through the origin.

use crate::error::{CalError, Result};
use crate::regression::Fit;
use crate::types::{CalibrationPair, CalibrationType};

/// Fit `slope = unfiltered / glucose` from the most recent pair, intercept fixed at 0.
pub fn single_point_fit(pairs: &[CalibrationPair]) -> Result<Fit> {
    let last = pairs.last().ok_or(CalError::InsufficientData {
        needed: 1,
        got: 0,
    })?;
    if last.glucose == 0.0 {
        return Err(CalError::InvalidDivisor);
    }
    let slope = last.unfiltered / last.glucose;
    if !slope.is_finite() {
        return Err(CalError::NonFinite);
    }
    tracing::debug!(
        x = last.glucose,
        y = last.unfiltered,
        slope,
        "single point fit"
    );
    Ok(Fit {
        slope,
        intercept: 0.0,
        kind: CalibrationType::SinglePoint,
        slope_error: None,
        intercept_error: None,
    })
}
