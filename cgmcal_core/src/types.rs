//! Data model shared by every stage of the engine.

use serde::{Deserialize, Serialize};

/// A (truth, raw) pair used by the fitting engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPair {
    /// Reference glucose in mg/dL.
    pub glucose: f64,
    /// Raw sensor signal in device counts.
    pub unfiltered: f64,
    /// Read time, epoch milliseconds.
    pub read_date_ms: i64,
}

impl CalibrationPair {
    pub fn new(glucose: f64, unfiltered: f64, read_date_ms: i64) -> Self {
        Self {
            glucose,
            unfiltered,
            read_date_ms,
        }
    }
}

impl From<&SensorReading> for CalibrationPair {
    fn from(r: &SensorReading) -> Self {
        Self::new(r.glucose, r.unfiltered, r.read_date_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationType {
    LeastSquaresRegression,
    SinglePoint,
}

impl CalibrationType {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationType::LeastSquaresRegression => "LeastSquaresRegression",
            CalibrationType::SinglePoint => "SinglePoint",
        }
    }
}

impl core::fmt::Display for CalibrationType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted calibration record: `raw = slope * glucose + intercept`.
///
/// Built only by the policy; never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Creation time, epoch milliseconds.
    #[serde(rename = "date")]
    pub date_ms: i64,
    /// Always 1.
    pub scale: u32,
    pub intercept: f64,
    pub slope: f64,
    #[serde(rename = "type")]
    pub kind: CalibrationType,
}

/// One timestamped sample from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Device-calibrated glucose in mg/dL.
    pub glucose: f64,
    pub unfiltered: f64,
    pub filtered: f64,
    pub read_date_ms: i64,
    /// True when `glucose` came from the transmitter's own calibration.
    pub device_calibrated: bool,
}

/// An independent truth measurement such as a meter fingerstick.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCheck {
    /// Entry type; `"Unity"` marks a synthetic/manual entry that is never used.
    pub kind: String,
    pub unfiltered: Option<f64>,
    pub glucose: f64,
    pub date_ms: i64,
}

/// Sensor replacement time, epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SensorInsert(pub i64);

impl SensorInsert {
    #[inline]
    pub fn millis(self) -> i64 {
        self.0
    }
}

impl From<i64> for SensorInsert {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}
