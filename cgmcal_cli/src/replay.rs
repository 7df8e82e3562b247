//! Command implementations: replay recorded inputs through the engine.

use cgmcal_config::Config;
use cgmcal_core::{
    CalError, Calibration, CalibrationPolicy, CalibrationType, InterpolationCfg, LiveInput,
    PolicyCfg, ReferenceCheck, SensorInsert, SensorReading, SlopeBounds, attach_unfiltered,
    estimate_raw, raw_at,
};
use cgmcal_traits::{CalibrationSink, ManualClock, SensorSession};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One live decision, as printed to stdout.
#[derive(Debug, Serialize)]
pub struct LiveRecord {
    pub read_date_ms: i64,
    pub unfiltered: f64,
    pub device_glucose: f64,
    /// Glucose under the calibration in force after this reading.
    pub glucose: Option<i32>,
    /// Calibration emitted for this reading, if any.
    pub calibration: Option<Calibration>,
    /// Why nothing was emitted.
    pub reason: Option<String>,
}

/// Collects accepted calibrations from a replay run.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub accepted: Vec<Calibration>,
}

impl CalibrationSink<Calibration> for CollectingSink {
    fn accept(
        &mut self,
        calibration: &Calibration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.accepted.push(*calibration);
        Ok(())
    }
}

fn policy_from(cfg: &Config) -> CalibrationPolicy {
    CalibrationPolicy::new(PolicyCfg::from(cfg)).with_guard(SlopeBounds::from(&cfg.bounds))
}

fn load_readings(path: &Path) -> eyre::Result<Vec<SensorReading>> {
    Ok(cgmcal_config::load_readings_csv(path)?
        .iter()
        .map(SensorReading::from)
        .collect())
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> eyre::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn describe(c: &Calibration) -> String {
    format!(
        "{} slope={:.3} intercept={:.3}",
        c.kind, c.slope, c.intercept
    )
}

/// Feed each reading to the live policy with everything before it as history.
///
/// Emitted calibrations become the calibration in force and reset the settle
/// window; the replay clock follows the reading being processed.
pub fn run_live(
    cfg: &Config,
    readings_path: &Path,
    session: &impl SensorSession,
    json: bool,
    out: &mut impl Write,
) -> eyre::Result<Vec<Calibration>> {
    let readings = load_readings(readings_path)?;
    let policy = policy_from(cfg);
    let clock = ManualClock::new(0);
    let sensor_insert = session.insert_time_ms().map(SensorInsert);
    let mut sink = CollectingSink::default();

    let mut last: Option<Calibration> = None;
    let mut last_cal_ms: i64 = 0;

    tracing::info!(readings = readings.len(), ?sensor_insert, "live replay start");
    for (i, current) in readings.iter().enumerate() {
        clock.set(current.read_date_ms);
        let input = LiveInput {
            last_calibration: last.as_ref(),
            last_calibration_ms: last_cal_ms,
            sensor_insert,
            history: &readings[..i],
            current,
        };
        let (calibration, reason) = match policy.live(&input, &clock) {
            Ok(c) => {
                sink.accept(&c).map_err(|e| eyre::eyre!("calibration sink: {e}"))?;
                last = Some(c);
                last_cal_ms = c.date_ms;
                (Some(c), None)
            }
            Err(e) => (None, Some(e.to_string())),
        };
        let glucose = last
            .as_ref()
            .and_then(|c| estimate_raw(current.unfiltered, c).ok());

        let record = LiveRecord {
            read_date_ms: current.read_date_ms,
            unfiltered: current.unfiltered,
            device_glucose: current.glucose,
            glucose,
            calibration,
            reason,
        };
        if json {
            print_json(out, &record)?;
        } else {
            let shown = glucose.map_or_else(|| "--".to_string(), |g| g.to_string());
            match (&record.calibration, &record.reason) {
                (Some(c), _) => writeln!(
                    out,
                    "t={} raw={:.1} glucose={} calibrated {}",
                    record.read_date_ms,
                    record.unfiltered,
                    shown,
                    describe(c)
                )?,
                (None, Some(r)) => writeln!(
                    out,
                    "t={} raw={:.1} glucose={} ({r})",
                    record.read_date_ms, record.unfiltered, shown
                )?,
                (None, None) => {}
            }
        }
    }

    let lsr = sink
        .accepted
        .iter()
        .filter(|c| c.kind == CalibrationType::LeastSquaresRegression)
        .count();
    tracing::info!(
        calibrations = sink.accepted.len(),
        lsr,
        single_point = sink.accepted.len() - lsr,
        "live replay complete"
    );
    if !json {
        writeln!(
            out,
            "replay complete: {} reading(s), {} calibration(s)",
            readings.len(),
            sink.accepted.len()
        )?;
    }
    Ok(sink.accepted)
}

#[derive(Debug, Serialize)]
struct ExpiredRecord {
    checks: usize,
    usable: usize,
    calibration: Option<Calibration>,
    reason: Option<String>,
}

pub fn run_expired(
    cfg: &Config,
    checks_path: &Path,
    readings_path: Option<&Path>,
    session: &impl SensorSession,
    json: bool,
    out: &mut impl Write,
) -> eyre::Result<Option<Calibration>> {
    let mut checks: Vec<ReferenceCheck> = cgmcal_config::load_checks_csv(checks_path)?
        .iter()
        .map(ReferenceCheck::from)
        .collect();
    if let Some(path) = readings_path {
        let readings = load_readings(path)?;
        let interp = InterpolationCfg::from(&cfg.interpolation);
        attach_unfiltered(&interp, &mut checks, &readings);
    }
    let usable = checks.iter().filter(|c| c.unfiltered.is_some()).count();

    let clock = cgmcal_traits::SystemClock::new();
    let sensor_insert = session.insert_time_ms().map(SensorInsert);
    let result = policy_from(cfg).expired(&checks, sensor_insert, &clock);

    let (calibration, reason) = match result {
        Ok(c) => (Some(c), None),
        Err(CalError::InsufficientData { .. }) => {
            (None, Some("no suitable glucose pairs found for expired calibration".to_string()))
        }
        Err(e) => (None, Some(e.to_string())),
    };
    if json {
        print_json(
            out,
            &ExpiredRecord {
                checks: checks.len(),
                usable,
                calibration,
                reason,
            },
        )?;
    } else {
        match (&calibration, &reason) {
            (Some(c), _) => writeln!(out, "expired calibration: {}", describe(c))?,
            (None, Some(r)) => writeln!(out, "no calibration: {r}")?,
            (None, None) => {}
        }
    }
    Ok(calibration)
}

/// Estimate glucose for one raw value. An unusable calibration (zero slope,
/// non-finite result) is reported as "no estimate", not as a failure.
pub fn run_estimate(
    raw: f64,
    slope: f64,
    intercept: f64,
    json: bool,
    out: &mut impl Write,
) -> eyre::Result<Option<i32>> {
    let calibration = Calibration {
        date_ms: 0,
        scale: 1,
        intercept,
        slope,
        kind: CalibrationType::LeastSquaresRegression,
    };
    let result = estimate_raw(raw, &calibration)
        .inspect_err(|e| tracing::info!(raw, slope, intercept, reason = %e, "no glucose estimate"));
    if json {
        let reason = result.as_ref().err().map(ToString::to_string);
        let glucose = result.as_ref().ok();
        print_json(
            out,
            &serde_json::json!({ "raw": raw, "glucose": glucose, "reason": reason }),
        )?;
    } else {
        match &result {
            Ok(glucose) => writeln!(out, "glucose: {glucose} mg/dL")?,
            Err(e) => writeln!(out, "no estimate: {e}")?,
        }
    }
    Ok(result.ok())
}

pub fn run_interpolate(
    cfg: &Config,
    readings_path: &Path,
    at_ms: i64,
    json: bool,
    out: &mut impl Write,
) -> eyre::Result<Option<f64>> {
    let readings = load_readings(readings_path)?;
    let value = raw_at(&InterpolationCfg::from(&cfg.interpolation), &readings, at_ms);
    if json {
        print_json(out, &serde_json::json!({ "at_ms": at_ms, "unfiltered": value }))?;
    } else {
        match value {
            Some(v) => writeln!(out, "unfiltered at {at_ms}: {v:.3}")?,
            None => writeln!(out, "no estimate available at {at_ms}")?,
        }
    }
    Ok(value)
}
