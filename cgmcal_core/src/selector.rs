//! Candidate pair selection for both policy entry points.

use crate::config::{ExpiredCfg, LiveCfg};
use crate::types::{CalibrationPair, ReferenceCheck, SensorInsert, SensorReading};

/// Build the live candidate set: recent qualifying history plus the current reading.
///
/// A history reading qualifies when it is later than `last_cal_ms + settle_ms`,
/// its glucose is inside the calibratable range, it was calibrated by the device,
/// and it is later than the sensor insert (when one is known). History is scanned
/// newest first and at most `max_pairs - 1` readings are taken. The result is
/// ascending by time with `current` last.
pub fn select_live_pairs(
    cfg: &LiveCfg,
    last_cal_ms: i64,
    sensor_insert: Option<SensorInsert>,
    history: &[SensorReading],
    current: &SensorReading,
) -> Vec<CalibrationPair> {
    let earliest = last_cal_ms.saturating_add(cfg.settle_ms);
    let qualifies = |r: &&SensorReading| {
        r.read_date_ms > earliest
            && cfg.in_range(r.glucose)
            && r.device_calibrated
            && sensor_insert.is_none_or(|ins| r.read_date_ms > ins.millis())
    };

    let mut pairs: Vec<CalibrationPair> = history
        .iter()
        .rev()
        .filter(qualifies)
        .take(cfg.max_pairs.saturating_sub(1))
        .map(CalibrationPair::from)
        .collect();
    pairs.reverse();
    pairs.push(CalibrationPair::from(current));
    pairs
}

/// Build the expired-session candidate set from reference checks.
///
/// Checks of the excluded kind or without a usable raw value are skipped. The
/// leading run of pairs taken within `insert_exclusion_ms` of the sensor insert is
/// dropped; when every pair falls in that window only the most recent is kept.
pub fn select_expired_pairs(
    cfg: &ExpiredCfg,
    checks: &[ReferenceCheck],
    sensor_insert: Option<SensorInsert>,
) -> Vec<CalibrationPair> {
    let pairs: Vec<CalibrationPair> = checks
        .iter()
        .filter(|c| c.kind != cfg.excluded_kind)
        .filter_map(|c| {
            c.unfiltered
                .filter(|u| *u != 0.0 && u.is_finite())
                .map(|u| CalibrationPair::new(c.glucose, u, c.date_ms))
        })
        .collect();

    let Some(insert) = sensor_insert else {
        return pairs;
    };
    if pairs.is_empty() {
        return pairs;
    }

    let within_window = |p: &CalibrationPair| {
        p.read_date_ms.saturating_sub(insert.millis()) < cfg.insert_exclusion_ms
    };
    let start = match pairs.iter().rposition(within_window) {
        Some(last_inside) => (last_inside + 1).min(pairs.len() - 1),
        None => 0,
    };
    tracing::debug!(total = pairs.len(), dropped = start, "expired pairs after insert window");
    pairs[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60 * 1000;
    const HOUR: i64 = 60 * MIN;

    fn sgv(t: i64, glucose: f64, device_calibrated: bool) -> SensorReading {
        SensorReading {
            glucose,
            unfiltered: glucose * 1000.0,
            filtered: glucose * 1000.0,
            read_date_ms: t,
            device_calibrated,
        }
    }

    fn check(kind: &str, t: i64, unfiltered: Option<f64>) -> ReferenceCheck {
        ReferenceCheck {
            kind: kind.to_string(),
            unfiltered,
            glucose: 120.0,
            date_ms: t,
        }
    }

    #[test]
    fn live_keeps_order_and_appends_current() {
        let cfg = LiveCfg::default();
        let history = [sgv(20 * MIN, 100.0, true), sgv(25 * MIN, 110.0, true)];
        let current = sgv(30 * MIN, 120.0, true);
        let pairs = select_live_pairs(&cfg, 0, None, &history, &current);
        let times: Vec<i64> = pairs.iter().map(|p| p.read_date_ms).collect();
        assert_eq!(times, vec![20 * MIN, 25 * MIN, 30 * MIN]);
    }

    #[test]
    fn live_filters_each_rule() {
        let cfg = LiveCfg::default();
        let history = [
            sgv(12 * MIN, 100.0, true),  // not after last_cal + 12 min
            sgv(13 * MIN, 80.0, true),   // range is exclusive
            sgv(14 * MIN, 300.0, true),  // range is exclusive
            sgv(15 * MIN, 150.0, false), // not device calibrated
            sgv(16 * MIN, 150.0, true),  // before insert
            sgv(21 * MIN, 150.0, true),  // ok
        ];
        let current = sgv(30 * MIN, 120.0, true);
        let pairs = select_live_pairs(&cfg, 0, Some(SensorInsert(20 * MIN)), &history, &current);
        let times: Vec<i64> = pairs.iter().map(|p| p.read_date_ms).collect();
        assert_eq!(times, vec![21 * MIN, 30 * MIN]);
    }

    #[test]
    fn live_caps_at_ten_newest() {
        let cfg = LiveCfg::default();
        let history: Vec<SensorReading> =
            (0..20).map(|i| sgv(HOUR + i * 5 * MIN, 150.0, true)).collect();
        let current = sgv(HOUR + 100 * 5 * MIN, 150.0, true);
        let pairs = select_live_pairs(&cfg, 0, None, &history, &current);
        assert_eq!(pairs.len(), 10);
        assert_eq!(pairs[0].read_date_ms, HOUR + 11 * 5 * MIN);
        assert_eq!(pairs[8].read_date_ms, HOUR + 19 * 5 * MIN);
    }

    #[test]
    fn expired_skips_unity_and_missing_raw() {
        let cfg = ExpiredCfg::default();
        let checks = [
            check("Unity", HOUR, Some(100_000.0)),
            check("Meter", 2 * HOUR, None),
            check("Meter", 3 * HOUR, Some(0.0)),
            check("Meter", 4 * HOUR, Some(120_000.0)),
        ];
        let pairs = select_expired_pairs(&cfg, &checks, None);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].read_date_ms, 4 * HOUR);
    }

    #[test]
    fn expired_without_insert_keeps_all() {
        let cfg = ExpiredCfg::default();
        let checks = [check("Meter", HOUR, Some(1.0)), check("Meter", 2 * HOUR, Some(2.0))];
        assert_eq!(select_expired_pairs(&cfg, &checks, None).len(), 2);
    }

    #[test]
    fn expired_drops_pairs_inside_insert_window() {
        let cfg = ExpiredCfg::default();
        let checks = [
            check("Meter", HOUR, Some(1.0)),
            check("Meter", 14 * HOUR, Some(2.0)),
            check("Meter", 15 * HOUR, Some(3.0)),
            check("Meter", 20 * HOUR, Some(4.0)),
        ];
        let pairs = select_expired_pairs(&cfg, &checks, Some(SensorInsert(0)));
        let raw: Vec<f64> = pairs.iter().map(|p| p.unfiltered).collect();
        assert_eq!(raw, vec![3.0, 4.0]);
    }

    #[test]
    fn expired_keeps_latest_when_all_inside_window() {
        let cfg = ExpiredCfg::default();
        let checks = [check("Meter", HOUR, Some(1.0)), check("Meter", 2 * HOUR, Some(2.0))];
        let pairs = select_expired_pairs(&cfg, &checks, Some(SensorInsert(0)));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].unfiltered, 2.0);
    }

    #[test]
    fn expired_far_past_insert_keeps_every_check() {
        let cfg = ExpiredCfg::default();
        let checks = [
            check("Meter", 1_700_000_000_000, Some(1.0)),
            check("Meter", 1_700_000_000_000 + HOUR, Some(2.0)),
        ];
        let pairs = select_expired_pairs(&cfg, &checks, Some(SensorInsert(i64::MIN)));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn expired_far_future_insert_counts_as_inside_window() {
        let cfg = ExpiredCfg::default();
        let checks = [check("Meter", i64::MIN, Some(1.0)), check("Meter", 0, Some(2.0))];
        let pairs = select_expired_pairs(&cfg, &checks, Some(SensorInsert(i64::MAX)));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].unfiltered, 2.0);
    }
}
