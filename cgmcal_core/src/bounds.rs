//! Acceptance checks applied to a fit before it becomes a calibration.

use crate::error::{CalError, Result};
use crate::regression::Fit;
use crate::types::CalibrationPair;

/// Decides whether a fit may be emitted.
///
/// The policy calls this after every successful fit and before stamping a
/// `Calibration`. The pairs the fit was computed from are passed so that guards
/// can compare against the input signal.
pub trait FitGuard {
    fn check(&self, fit: &Fit, pairs: &[CalibrationPair]) -> Result<()>;
}

/// Reject any fit whose slope lies outside `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for SlopeBounds {
    fn default() -> Self {
        Self::from(&cgmcal_config::BoundsCfg::default())
    }
}

impl FitGuard for SlopeBounds {
    fn check(&self, fit: &Fit, _pairs: &[CalibrationPair]) -> Result<()> {
        // NaN fails the range test as well.
        if (self.min..=self.max).contains(&fit.slope) {
            Ok(())
        } else {
            Err(CalError::OutOfBounds {
                slope: fit.slope,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl<G: FitGuard + ?Sized> FitGuard for &G {
    fn check(&self, fit: &Fit, pairs: &[CalibrationPair]) -> Result<()> {
        (**self).check(fit, pairs)
    }
}

impl<G: FitGuard + ?Sized> FitGuard for Box<G> {
    fn check(&self, fit: &Fit, pairs: &[CalibrationPair]) -> Result<()> {
        (**self).check(fit, pairs)
    }
}
