//! Decides when to recalibrate and which fitting method to use.
//!
//! Two entry points share the fitting engines and the acceptance guard:
//! - `live`: called for each new sensor reading while the session is active
//! - `expired`: rebuilds a calibration from reference checks after the session
//!   has expired on the device

use cgmcal_traits::Clock;

use crate::bounds::{FitGuard, SlopeBounds};
use crate::config::PolicyCfg;
use crate::error::{CalError, Result};
use crate::estimator::estimate_raw;
use crate::regression::{Fit, lsr_fit};
use crate::selector::{select_expired_pairs, select_live_pairs};
use crate::single_point::single_point_fit;
use crate::types::{
    Calibration, CalibrationPair, CalibrationType, ReferenceCheck, SensorInsert, SensorReading,
};

/// Caller-owned state for one live calibration decision.
#[derive(Debug, Clone, Copy)]
pub struct LiveInput<'a> {
    /// Calibration currently in force, if any.
    pub last_calibration: Option<&'a Calibration>,
    /// When the device last received a calibration (epoch ms).
    pub last_calibration_ms: i64,
    pub sensor_insert: Option<SensorInsert>,
    /// Earlier readings, ascending by time, not including `current`.
    pub history: &'a [SensorReading],
    pub current: &'a SensorReading,
}

/// Calibration policy parameterised by its acceptance guard.
#[derive(Debug, Clone)]
pub struct CalibrationPolicy<G = SlopeBounds> {
    cfg: PolicyCfg,
    guard: G,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self::new(PolicyCfg::default())
    }
}

impl CalibrationPolicy {
    pub fn new(cfg: PolicyCfg) -> Self {
        Self {
            cfg,
            guard: SlopeBounds::default(),
        }
    }
}

impl<G: FitGuard> CalibrationPolicy<G> {
    /// Replace the acceptance guard.
    pub fn with_guard<H: FitGuard>(self, guard: H) -> CalibrationPolicy<H> {
        CalibrationPolicy {
            cfg: self.cfg,
            guard,
        }
    }

    /// Choose the live fitting method for `count` candidate pairs.
    ///
    /// `large_error` is true when the current calibration is off by more than the
    /// threshold, or when there is no usable calibration at all.
    pub fn live_method(&self, large_error: bool, count: usize) -> Option<CalibrationType> {
        let live = &self.cfg.live;
        if (large_error && count >= live.lsr_min_pairs_on_error) || count >= live.lsr_min_pairs {
            Some(CalibrationType::LeastSquaresRegression)
        } else if large_error && count > 0 {
            Some(CalibrationType::SinglePoint)
        } else {
            None
        }
    }

    /// Live recalibration for a new reading.
    pub fn live(&self, input: &LiveInput<'_>, clock: &impl Clock) -> Result<Calibration> {
        let live = &self.cfg.live;
        let current = input.current;

        if !live.in_range(current.glucose) {
            tracing::info!(glucose = current.glucose, "current glucose out of range to calibrate");
            return Err(CalError::OutOfRange {
                glucose: current.glucose,
            });
        }

        let error = input.last_calibration.and_then(|cal| {
            match estimate_raw(current.unfiltered, cal) {
                Ok(estimate) => {
                    let error = (f64::from(estimate) - current.glucose).abs();
                    tracing::debug!(
                        error,
                        estimate,
                        slope = cal.slope,
                        intercept = cal.intercept,
                        "current calibration error"
                    );
                    Some(error)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "last calibration unusable; treating as uncalibrated");
                    None
                }
            }
        });
        let large_error = error.is_none_or(|e| e > live.error_threshold);
        let last_single_point = input
            .last_calibration
            .is_some_and(|c| c.kind == CalibrationType::SinglePoint);

        if !large_error && !last_single_point {
            tracing::debug!("no calibration update needed");
            return Err(CalError::NotNeeded { error });
        }

        let pairs = select_live_pairs(
            live,
            input.last_calibration_ms,
            input.sensor_insert,
            input.history,
            current,
        );

        match self.live_method(large_error, pairs.len()) {
            Some(kind) => self.fit_and_accept(kind, &pairs, clock),
            None if large_error => {
                tracing::info!("calibration needed, but no suitable glucose pairs found");
                Err(CalError::InsufficientData {
                    needed: 1,
                    got: pairs.len(),
                })
            }
            None => {
                tracing::debug!(pairs = pairs.len(), "no calibration update needed");
                Err(CalError::NotNeeded { error })
            }
        }
    }

    /// Calibration from reference checks once the device session has expired.
    pub fn expired(
        &self,
        checks: &[ReferenceCheck],
        sensor_insert: Option<SensorInsert>,
        clock: &impl Clock,
    ) -> Result<Calibration> {
        let pairs = select_expired_pairs(&self.cfg.expired, checks, sensor_insert);
        let kind = if pairs.len() >= self.cfg.expired.lsr_min_pairs {
            CalibrationType::LeastSquaresRegression
        } else if !pairs.is_empty() {
            CalibrationType::SinglePoint
        } else {
            tracing::info!("no suitable glucose pairs found for expired calibration");
            return Err(CalError::InsufficientData { needed: 1, got: 0 });
        };
        self.fit_and_accept(kind, &pairs, clock)
    }

    fn fit_and_accept(
        &self,
        kind: CalibrationType,
        pairs: &[CalibrationPair],
        clock: &impl Clock,
    ) -> Result<Calibration> {
        let fit: Fit = match kind {
            CalibrationType::LeastSquaresRegression => lsr_fit(pairs),
            CalibrationType::SinglePoint => single_point_fit(pairs),
        }
        .inspect_err(|e| tracing::info!(method = %kind, error = %e, "fit failed"))?;

        if let Err(e) = self.guard.check(&fit, pairs) {
            // Wait for the next opportunity.
            tracing::info!(method = %kind, slope = fit.slope, "fit rejected: {e}");
            return Err(e);
        }

        let calibration = Calibration {
            date_ms: clock.now_ms(),
            scale: 1,
            intercept: fit.intercept,
            slope: fit.slope,
            kind: fit.kind,
        };
        tracing::info!(
            method = %kind,
            pairs = pairs.len(),
            slope = calibration.slope,
            intercept = calibration.intercept,
            slope_error = fit.slope_error,
            intercept_error = fit.intercept_error,
            "calibrated"
        );
        Ok(calibration)
    }
}
