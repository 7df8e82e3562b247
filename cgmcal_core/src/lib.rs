#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! CGM calibration engine (pure, synchronous).
//!
//! Converts a sensor's raw "unfiltered" signal into glucose (mg/dL) and decides,
//! reading by reading, when that conversion should be recomputed. Nothing here
//! keeps state between calls: the caller passes the last calibration, history,
//! and sensor insert time on every invocation and owns whatever is emitted.
//!
//! ## Architecture
//!
//! - **Interpolation**: raw value at an arbitrary time between two readings (`interpolate`)
//! - **Regression**: recency-weighted least squares (`regression`)
//! - **Single point**: one pair, zero intercept (`single_point`)
//! - **Estimation**: raw to displayable glucose (`estimator`)
//! - **Selection**: candidate pairs for each entry point (`selector`)
//! - **Policy**: method choice and acceptance (`policy`, guarded by `bounds`)
//!
//! Every "no result" outcome is a `CalError`; the `Option`-returning functions
//! below log the reason and drop it.

pub mod bounds;
pub mod config;
pub mod conversions;
pub mod error;
pub mod estimator;
pub mod interpolate;
pub mod policy;
pub mod regression;
pub mod selector;
pub mod single_point;
pub mod types;

pub use bounds::{FitGuard, SlopeBounds};
pub use config::{
    EXPIRED_INSERT_EXCLUSION_MS, ExpiredCfg, InterpolationCfg, LiveCfg, MAX_SLOPE, MIN_SLOPE,
    PolicyCfg,
};
pub use error::CalError;
pub use estimator::estimate_raw;
pub use interpolate::{attach_unfiltered, interpolate_with, raw_at};
pub use policy::{CalibrationPolicy, LiveInput};
pub use regression::{Fit, lsr_fit};
pub use single_point::single_point_fit;
pub use types::{
    Calibration, CalibrationPair, CalibrationType, ReferenceCheck, SensorInsert, SensorReading,
};

use cgmcal_traits::Clock;

/// Live calibration for `current` with the stock policy.
///
/// Returns `None` when no update should be emitted; the reason is logged at debug.
pub fn compute_live_calibration(
    last_calibration: Option<&Calibration>,
    last_calibration_ms: i64,
    sensor_insert: Option<SensorInsert>,
    history: &[SensorReading],
    current: &SensorReading,
    clock: &impl Clock,
) -> Option<Calibration> {
    let input = LiveInput {
        last_calibration,
        last_calibration_ms,
        sensor_insert,
        history,
        current,
    };
    CalibrationPolicy::default()
        .live(&input, clock)
        .inspect_err(|e| tracing::debug!(reason = %e, "no live calibration"))
        .ok()
}

/// Expired-session calibration from reference checks with the stock policy.
pub fn compute_expired_calibration(
    checks: &[ReferenceCheck],
    sensor_insert: Option<SensorInsert>,
    clock: &impl Clock,
) -> Option<Calibration> {
    CalibrationPolicy::default()
        .expired(checks, sensor_insert, clock)
        .inspect_err(|e| tracing::debug!(reason = %e, "no expired calibration"))
        .ok()
}

/// Glucose for `reading` under `calibration`; `None` for a zero slope or non-finite input.
pub fn estimate_glucose(reading: &SensorReading, calibration: &Calibration) -> Option<i32> {
    estimate_raw(reading.unfiltered, calibration)
        .inspect_err(|e| tracing::debug!(reason = %e, "no glucose estimate"))
        .ok()
}

/// Raw value at `at_ms` between two readings at most 10 minutes apart.
pub fn interpolate_raw(before: &SensorReading, after: &SensorReading, at_ms: i64) -> Option<f64> {
    interpolate_with(&InterpolationCfg::default(), before, after, at_ms)
}
