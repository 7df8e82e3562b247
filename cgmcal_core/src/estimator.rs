//! Raw signal to displayable glucose.

use crate::error::{CalError, Result};
use crate::types::Calibration;

/// Results below this are not displayed literally.
pub const DISPLAY_FLOOR_MG_DL: i32 = 40;
/// Value reported in place of anything below `DISPLAY_FLOOR_MG_DL`.
pub const BELOW_FLOOR_MG_DL: i32 = 39;

/// `round((raw - intercept) / slope)`, floored to 39 for anything under 40.
pub fn estimate_raw(raw: f64, calibration: &Calibration) -> Result<i32> {
    if calibration.slope == 0.0 {
        return Err(CalError::InvalidDivisor);
    }
    let value = ((raw - calibration.intercept) / calibration.slope).round();
    if !value.is_finite() {
        return Err(CalError::NonFinite);
    }
    if value < f64::from(DISPLAY_FLOOR_MG_DL) {
        return Ok(BELOW_FLOOR_MG_DL);
    }
    // Saturating cast; glucose anywhere near i32::MAX is already nonsense.
    Ok(value as i32)
}
