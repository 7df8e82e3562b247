pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// Source of the active sensor session's insert time.
///
/// The session lifecycle (insert, stop, post-insert lockout) is owned elsewhere;
/// the calibration engine only reads the timestamp.
pub trait SensorSession {
    /// Insert time in epoch milliseconds, or `None` when no sensor is active.
    fn insert_time_ms(&self) -> Option<i64>;
}

/// Consumer of accepted calibration records (persistence, broadcast, ...).
pub trait CalibrationSink<C> {
    fn accept(&mut self, calibration: &C) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl SensorSession for Option<i64> {
    fn insert_time_ms(&self) -> Option<i64> {
        *self
    }
}
