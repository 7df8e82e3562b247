use thiserror::Error;

/// Reasons a calibration attempt produced no result.
///
/// Every variant is an expected outcome: the caller keeps the calibration it
/// already has and tries again on the next reading.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalError {
    #[error("degenerate fit: zero variance in glucose or raw values")]
    DegenerateFit,
    #[error("invalid divisor: zero slope or zero reference glucose")]
    InvalidDivisor,
    #[error("slope {slope} outside accepted bounds [{min}, {max}]")]
    OutOfBounds { slope: f64, min: f64, max: f64 },
    #[error("insufficient data: need {needed} pair(s), got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("glucose {glucose} mg/dL outside calibratable range")]
    OutOfRange { glucose: f64 },
    #[error("no recalibration needed (current error {error:?})")]
    NotNeeded { error: Option<f64> },
    #[error("computation produced a non-finite value")]
    NonFinite,
}

pub type Result<T> = std::result::Result<T, CalError>;
