use cgmcal_core::{
    CalError, Calibration, CalibrationPolicy, CalibrationType, Fit, FitGuard, LiveInput,
    SensorInsert, SensorReading, compute_live_calibration,
};
use cgmcal_traits::ManualClock;
use rstest::rstest;

const MIN: i64 = 60 * 1000;
const NOW: i64 = 1_700_000_000_000;

fn sgv(t: i64, glucose: f64) -> SensorReading {
    SensorReading {
        glucose,
        unfiltered: glucose * 1000.0,
        filtered: glucose * 1000.0,
        read_date_ms: t,
        device_calibrated: true,
    }
}

fn cal(slope: f64, kind: CalibrationType) -> Calibration {
    Calibration {
        date_ms: 0,
        scale: 1,
        intercept: 0.0,
        slope,
        kind,
    }
}

/// `n` qualifying history readings ending 5 minutes before `current_t`.
fn history(n: usize, current_t: i64) -> Vec<SensorReading> {
    (0..n)
        .map(|i| {
            let back = (n - i) as i64;
            sgv(current_t - back * 5 * MIN, 100.0 + 5.0 * i as f64)
        })
        .collect()
}

fn run(
    policy: &CalibrationPolicy,
    last: Option<&Calibration>,
    hist: &[SensorReading],
    current: &SensorReading,
) -> Result<Calibration, CalError> {
    let clock = ManualClock::new(NOW);
    policy.live(
        &LiveInput {
            last_calibration: last,
            last_calibration_ms: 0,
            sensor_insert: None,
            history: hist,
            current,
        },
        &clock,
    )
}

#[rstest]
#[case(350.0)]
#[case(300.0)]
#[case(80.0)]
#[case(20.0)]
fn out_of_range_current_never_calibrates(#[case] glucose: f64) {
    let current = sgv(NOW, glucose);
    let hist = history(9, NOW);
    let err = run(&CalibrationPolicy::default(), None, &hist, &current).unwrap_err();
    assert_eq!(err, CalError::OutOfRange { glucose });

    let clock = ManualClock::new(NOW);
    assert!(compute_live_calibration(None, 0, None, &hist, &current, &clock).is_none());
}

#[test]
fn first_reading_without_calibration_uses_single_point() {
    let current = sgv(NOW, 120.0);
    let c = run(&CalibrationPolicy::default(), None, &[], &current).unwrap();
    assert_eq!(c.kind, CalibrationType::SinglePoint);
    assert_eq!(c.slope, 1000.0);
    assert_eq!(c.intercept, 0.0);
    assert_eq!(c.scale, 1);
    assert_eq!(c.date_ms, NOW);
}

#[rstest]
#[case(0, Some(CalibrationType::SinglePoint))]
#[case(1, Some(CalibrationType::SinglePoint))]
#[case(2, Some(CalibrationType::SinglePoint))]
#[case(3, Some(CalibrationType::LeastSquaresRegression))]
#[case(8, Some(CalibrationType::LeastSquaresRegression))]
#[case(20, Some(CalibrationType::LeastSquaresRegression))]
fn large_error_method_ladder(#[case] hist_len: usize, #[case] expected: Option<CalibrationType>) {
    // Off by 2x: estimate = 2 * glucose.
    let last = cal(500.0, CalibrationType::LeastSquaresRegression);
    let current = sgv(NOW, 150.0);
    let hist = history(hist_len, NOW);
    let c = run(&CalibrationPolicy::default(), Some(&last), &hist, &current).unwrap();
    assert_eq!(Some(c.kind), expected);
    assert!((c.slope - 1000.0).abs() < 1e-6, "{}", c.slope);
}

#[rstest]
#[case(false, 3, None)]
#[case(false, 8, None)]
#[case(false, 9, Some(CalibrationType::LeastSquaresRegression))]
#[case(true, 0, None)]
#[case(true, 1, Some(CalibrationType::SinglePoint))]
#[case(true, 3, Some(CalibrationType::SinglePoint))]
#[case(true, 4, Some(CalibrationType::LeastSquaresRegression))]
#[case(true, 9, Some(CalibrationType::LeastSquaresRegression))]
fn method_thresholds(
    #[case] large_error: bool,
    #[case] count: usize,
    #[case] expected: Option<CalibrationType>,
) {
    assert_eq!(
        CalibrationPolicy::default().live_method(large_error, count),
        expected
    );
}

#[test]
fn accurate_regression_calibration_is_kept() {
    let last = cal(1000.0, CalibrationType::LeastSquaresRegression);
    let current = sgv(NOW, 150.0);
    let hist = history(9, NOW);
    let err = run(&CalibrationPolicy::default(), Some(&last), &hist, &current).unwrap_err();
    assert_eq!(err, CalError::NotNeeded { error: Some(0.0) });
}

#[rstest]
#[case(7, false)]
#[case(8, true)]
fn accurate_single_point_upgrades_once_enough_pairs(#[case] hist_len: usize, #[case] upgrades: bool) {
    let last = cal(1000.0, CalibrationType::SinglePoint);
    let current = sgv(NOW, 150.0);
    let hist = history(hist_len, NOW);
    let res = run(&CalibrationPolicy::default(), Some(&last), &hist, &current);
    if upgrades {
        assert_eq!(res.unwrap().kind, CalibrationType::LeastSquaresRegression);
    } else {
        assert!(matches!(res, Err(CalError::NotNeeded { .. })));
    }
}

#[test]
fn readings_before_device_settle_are_ignored() {
    let last = cal(500.0, CalibrationType::LeastSquaresRegression);
    let current = sgv(NOW, 150.0);
    let hist = history(9, NOW);
    let clock = ManualClock::new(NOW);
    // Last device calibration 20 minutes ago: only readings after NOW - 8 min qualify.
    let input = LiveInput {
        last_calibration: Some(&last),
        last_calibration_ms: NOW - 20 * MIN,
        sensor_insert: None,
        history: &hist,
        current: &current,
    };
    let c = CalibrationPolicy::default().live(&input, &clock).unwrap();
    assert_eq!(c.kind, CalibrationType::SinglePoint);
}

#[test]
fn readings_before_sensor_insert_are_ignored() {
    let current = sgv(NOW, 150.0);
    let hist = history(9, NOW);
    let clock = ManualClock::new(NOW);
    let input = LiveInput {
        last_calibration: None,
        last_calibration_ms: 0,
        sensor_insert: Some(SensorInsert(NOW - 12 * MIN)),
        history: &hist,
        current: &current,
    };
    // Two history readings (NOW-10, NOW-5) plus current: single point.
    let c = CalibrationPolicy::default().live(&input, &clock).unwrap();
    assert_eq!(c.kind, CalibrationType::SinglePoint);
}

#[test]
fn uncalibrated_history_is_ignored() {
    let current = sgv(NOW, 150.0);
    let mut hist = history(9, NOW);
    for r in &mut hist {
        r.device_calibrated = false;
    }
    let c = run(&CalibrationPolicy::default(), None, &hist, &current).unwrap();
    assert_eq!(c.kind, CalibrationType::SinglePoint);
}

#[test]
fn steep_regression_is_rejected() {
    let current = SensorReading {
        unfiltered: 150.0 * 20_000.0,
        ..sgv(NOW, 150.0)
    };
    let hist: Vec<SensorReading> = history(5, NOW)
        .into_iter()
        .map(|r| SensorReading {
            unfiltered: r.glucose * 20_000.0,
            ..r
        })
        .collect();
    let err = run(&CalibrationPolicy::default(), None, &hist, &current).unwrap_err();
    assert!(matches!(err, CalError::OutOfBounds { .. }), "{err:?}");
}

#[test]
fn shallow_single_point_is_rejected() {
    let current = SensorReading {
        unfiltered: 14_400.0,
        ..sgv(NOW, 120.0)
    };
    let err = run(&CalibrationPolicy::default(), None, &[], &current).unwrap_err();
    assert!(matches!(err, CalError::OutOfBounds { .. }), "{err:?}");
}

#[test]
fn flat_history_is_degenerate() {
    let current = sgv(NOW, 150.0);
    let hist: Vec<SensorReading> = (1..=5).map(|i| sgv(NOW - i * 5 * MIN, 150.0)).rev().collect();
    let err = run(&CalibrationPolicy::default(), None, &hist, &current).unwrap_err();
    assert_eq!(err, CalError::DegenerateFit);
}

#[test]
fn unusable_last_calibration_counts_as_uncalibrated() {
    let last = cal(0.0, CalibrationType::LeastSquaresRegression);
    let current = sgv(NOW, 150.0);
    let c = run(&CalibrationPolicy::default(), Some(&last), &[], &current).unwrap();
    assert_eq!(c.kind, CalibrationType::SinglePoint);
}

struct AcceptAll;
impl FitGuard for AcceptAll {
    fn check(&self, _fit: &Fit, _pairs: &[cgmcal_core::CalibrationPair]) -> cgmcal_core::error::Result<()> {
        Ok(())
    }
}

#[test]
fn guard_is_pluggable() {
    let current = SensorReading {
        unfiltered: 14_400.0,
        ..sgv(NOW, 120.0)
    };
    let clock = ManualClock::new(NOW);
    let policy = CalibrationPolicy::default().with_guard(AcceptAll);
    let input = LiveInput {
        last_calibration: None,
        last_calibration_ms: 0,
        sensor_insert: None,
        history: &[],
        current: &current,
    };
    let c = policy.live(&input, &clock).unwrap();
    assert_eq!(c.slope, 120.0);
}
