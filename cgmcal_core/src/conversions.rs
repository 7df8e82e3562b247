//! `From` implementations bridging `cgmcal_config` types to `cgmcal_core` types.

use crate::bounds::SlopeBounds;
use crate::config::{ExpiredCfg, InterpolationCfg, LiveCfg, PolicyCfg};
use crate::types::{ReferenceCheck, SensorReading};

// ── Policy ───────────────────────────────────────────────────────────────────

impl From<&cgmcal_config::LiveCfg> for LiveCfg {
    fn from(c: &cgmcal_config::LiveCfg) -> Self {
        Self {
            min_glucose: c.min_glucose,
            max_glucose: c.max_glucose,
            error_threshold: c.error_threshold,
            max_pairs: c.max_pairs,
            settle_ms: c.settle_ms,
            lsr_min_pairs_on_error: c.lsr_min_pairs_on_error,
            lsr_min_pairs: c.lsr_min_pairs,
        }
    }
}

impl From<&cgmcal_config::ExpiredCfg> for ExpiredCfg {
    fn from(c: &cgmcal_config::ExpiredCfg) -> Self {
        Self {
            insert_exclusion_ms: c.insert_exclusion_ms,
            lsr_min_pairs: c.lsr_min_pairs,
            excluded_kind: c.excluded_kind.clone(),
        }
    }
}

impl From<&cgmcal_config::Config> for PolicyCfg {
    fn from(c: &cgmcal_config::Config) -> Self {
        Self {
            live: (&c.live).into(),
            expired: (&c.expired).into(),
        }
    }
}

// ── Bounds / interpolation ───────────────────────────────────────────────────

impl From<&cgmcal_config::BoundsCfg> for SlopeBounds {
    fn from(c: &cgmcal_config::BoundsCfg) -> Self {
        Self {
            min: c.min_slope,
            max: c.max_slope,
        }
    }
}

impl From<&cgmcal_config::InterpolationCfg> for InterpolationCfg {
    fn from(c: &cgmcal_config::InterpolationCfg) -> Self {
        Self {
            max_gap_ms: c.max_gap_ms,
        }
    }
}

// ── CSV rows ─────────────────────────────────────────────────────────────────

impl From<&cgmcal_config::ReadingRow> for SensorReading {
    fn from(r: &cgmcal_config::ReadingRow) -> Self {
        Self {
            glucose: r.glucose,
            unfiltered: r.unfiltered,
            filtered: r.filtered,
            read_date_ms: r.read_date_ms,
            device_calibrated: r.device_calibrated,
        }
    }
}

impl From<&cgmcal_config::CheckRow> for ReferenceCheck {
    fn from(r: &cgmcal_config::CheckRow) -> Self {
        Self {
            kind: r.kind.clone(),
            unfiltered: r.unfiltered,
            glucose: r.glucose,
            date_ms: r.date_ms,
        }
    }
}
