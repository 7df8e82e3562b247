//! Runtime configuration for the calibration engine.
//!
//! These are the values the policy and interpolator actually consume.
//! They are separate from the TOML-deserialized config in `cgmcal_config`.

pub use cgmcal_config::{
    DEVICE_CAL_SETTLE_MS, EXPIRED_INSERT_EXCLUSION_MS, MAX_INTERPOLATION_GAP_MS, MAX_SLOPE,
    MIN_SLOPE,
};

/// Live-path policy knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveCfg {
    /// Exclusive lower bound of calibratable glucose (mg/dL).
    pub min_glucose: f64,
    /// Exclusive upper bound of calibratable glucose (mg/dL).
    pub max_glucose: f64,
    /// Recalibrate once `|estimate - glucose|` exceeds this (mg/dL).
    pub error_threshold: f64,
    /// Upper bound on pairs in one candidate set, current reading included.
    pub max_pairs: usize,
    /// Only readings later than `last_cal + settle_ms` qualify.
    pub settle_ms: i64,
    /// Regression is used on a large error once this many pairs are available.
    pub lsr_min_pairs_on_error: usize,
    /// Regression is used regardless of error once this many pairs are available.
    pub lsr_min_pairs: usize,
}

// Defaults come from the TOML schema.
impl Default for LiveCfg {
    fn default() -> Self {
        Self::from(&cgmcal_config::LiveCfg::default())
    }
}

impl LiveCfg {
    /// True when `glucose` lies strictly inside the calibratable range.
    #[inline]
    pub fn in_range(&self, glucose: f64) -> bool {
        glucose > self.min_glucose && glucose < self.max_glucose
    }
}

/// Expired-session policy knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiredCfg {
    /// Checks closer than this to the sensor insert are dropped.
    pub insert_exclusion_ms: i64,
    /// Regression is used once this many pairs are available.
    pub lsr_min_pairs: usize,
    /// Check type that is never used as a calibration input.
    pub excluded_kind: String,
}

impl Default for ExpiredCfg {
    fn default() -> Self {
        Self::from(&cgmcal_config::ExpiredCfg::default())
    }
}

/// Interpolator limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationCfg {
    pub max_gap_ms: i64,
}

impl Default for InterpolationCfg {
    fn default() -> Self {
        Self::from(&cgmcal_config::InterpolationCfg::default())
    }
}

/// Complete policy configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyCfg {
    pub live: LiveCfg,
    pub expired: ExpiredCfg,
}
