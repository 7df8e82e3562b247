//! Linear interpolation of the raw signal between two readings.

use crate::config::InterpolationCfg;
use crate::types::{ReferenceCheck, SensorReading};

/// Raw value at `at_ms` on the line through `before` and `after`.
///
/// Returns `None` when the readings are more than `cfg.max_gap_ms` apart or are
/// not in increasing time order.
pub fn interpolate_with(
    cfg: &InterpolationCfg,
    before: &SensorReading,
    after: &SensorReading,
    at_ms: i64,
) -> Option<f64> {
    let total_time = after.read_date_ms.saturating_sub(before.read_date_ms);
    if total_time > cfg.max_gap_ms {
        tracing::debug!(total_time, "gap too large, not interpolating unfiltered values");
        return None;
    }
    if total_time <= 0 {
        return None;
    }
    let total_delta = after.unfiltered - before.unfiltered;
    let fraction = at_ms.saturating_sub(before.read_date_ms) as f64 / total_time as f64;
    let value = before.unfiltered + fraction * total_delta;
    tracing::trace!(at_ms, total_time, total_delta, fraction, value, "interpolated unfiltered");
    Some(value)
}

/// Raw value at `at_ms` from the readings that bracket it.
///
/// `readings` must be ascending by time. A reading taken exactly at `at_ms` is
/// used as is; otherwise the neighbours on either side are interpolated.
pub fn raw_at(cfg: &InterpolationCfg, readings: &[SensorReading], at_ms: i64) -> Option<f64> {
    // First reading at or after `at_ms`.
    let idx = readings.partition_point(|r| r.read_date_ms < at_ms);
    match readings.get(idx) {
        Some(exact) if exact.read_date_ms == at_ms => Some(exact.unfiltered),
        Some(after) if idx > 0 => interpolate_with(cfg, &readings[idx - 1], after, at_ms),
        _ => None,
    }
}

/// Fill in missing raw values on `checks` from the bracketing `readings`.
///
/// A check keeps `unfiltered = None` when no pair of readings brackets it within
/// the gap limit. Checks that already carry a raw value are left untouched.
pub fn attach_unfiltered(
    cfg: &InterpolationCfg,
    checks: &mut [ReferenceCheck],
    readings: &[SensorReading],
) {
    for check in checks.iter_mut().filter(|c| c.unfiltered.is_none()) {
        check.unfiltered = raw_at(cfg, readings, check.date_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sgv(t: i64, unfiltered: f64) -> SensorReading {
        SensorReading {
            glucose: 100.0,
            unfiltered,
            filtered: unfiltered,
            read_date_ms: t,
            device_calibrated: true,
        }
    }

    #[test]
    fn midpoint() {
        let cfg = InterpolationCfg::default();
        let v = interpolate_with(&cfg, &sgv(0, 1000.0), &sgv(300_000, 2000.0), 150_000);
        assert_eq!(v, Some(1500.0));
    }

    #[test]
    fn exactly_ten_minutes_is_allowed() {
        let cfg = InterpolationCfg::default();
        let v = interpolate_with(&cfg, &sgv(0, 1000.0), &sgv(600_000, 2000.0), 300_000);
        assert_eq!(v, Some(1500.0));
    }

    #[test]
    fn gap_over_ten_minutes_is_none() {
        let cfg = InterpolationCfg::default();
        assert_eq!(
            interpolate_with(&cfg, &sgv(0, 1000.0), &sgv(700_000, 2000.0), 150_000),
            None
        );
    }

    #[test]
    fn zero_gap_is_none() {
        let cfg = InterpolationCfg::default();
        assert_eq!(interpolate_with(&cfg, &sgv(5, 1000.0), &sgv(5, 2000.0), 5), None);
    }

    #[test]
    fn attaches_only_missing_values() {
        let cfg = InterpolationCfg::default();
        let readings = [sgv(0, 1000.0), sgv(300_000, 2000.0), sgv(600_000, 3000.0)];
        let mut checks = vec![
            ReferenceCheck {
                kind: "Meter".into(),
                unfiltered: None,
                glucose: 110.0,
                date_ms: 450_000,
            },
            ReferenceCheck {
                kind: "Meter".into(),
                unfiltered: Some(42.0),
                glucose: 110.0,
                date_ms: 150_000,
            },
            ReferenceCheck {
                kind: "Meter".into(),
                unfiltered: None,
                glucose: 110.0,
                date_ms: 300_000,
            },
            ReferenceCheck {
                kind: "Meter".into(),
                unfiltered: None,
                glucose: 110.0,
                date_ms: 900_000,
            },
        ];
        attach_unfiltered(&cfg, &mut checks, &readings);
        assert_eq!(checks[0].unfiltered, Some(2500.0));
        assert_eq!(checks[1].unfiltered, Some(42.0));
        assert_eq!(checks[2].unfiltered, Some(2000.0));
        assert_eq!(checks[3].unfiltered, None);
    }

    #[test]
    fn raw_at_outside_readings_is_none() {
        let cfg = InterpolationCfg::default();
        let readings = [sgv(1_000, 1000.0), sgv(301_000, 2000.0)];
        assert_eq!(raw_at(&cfg, &readings, 0), None);
        assert_eq!(raw_at(&cfg, &readings, 400_000), None);
        assert_eq!(raw_at(&cfg, &[], 0), None);
        assert_eq!(raw_at(&cfg, &readings, 1_000), Some(1000.0));
    }

    #[test]
    fn extreme_timestamps_saturate_to_no_value() {
        let cfg = InterpolationCfg::default();
        assert_eq!(interpolate_with(&cfg, &sgv(i64::MIN, 1000.0), &sgv(i64::MAX, 2000.0), 0), None);
        let readings = [sgv(i64::MIN, 1000.0), sgv(i64::MAX, 2000.0)];
        assert_eq!(raw_at(&cfg, &readings, 0), None);
    }
}
