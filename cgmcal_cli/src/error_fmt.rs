//! Human-readable error descriptions and structured JSON error formatting.
//!
//! Core calibration outcomes are "no result" values printed by each command;
//! what reaches this module are input and configuration failures.

/// Error classes the CLI can explain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InvalidHeaders,
    OutOfOrder,
    InvalidConfig,
    Io,
    Other,
}

impl ErrorClass {
    pub fn of(err: &eyre::Report) -> Self {
        let lower = err.to_string().to_ascii_lowercase();
        if lower.contains("csv must have headers") {
            Self::InvalidHeaders
        } else if lower.contains("ascending by time") {
            Self::OutOfOrder
        } else if lower.contains("parse config")
            || lower.contains("read config")
            || lower.contains(" must be ")
        {
            Self::InvalidConfig
        } else if lower.contains("open readings csv") || lower.contains("open checks csv") {
            Self::Io
        } else {
            Self::Other
        }
    }

    /// Short, stable name (JSON `reason` field).
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidHeaders => "InvalidHeaders",
            Self::OutOfOrder => "OutOfOrder",
            Self::InvalidConfig => "InvalidConfig",
            Self::Io => "Io",
            Self::Other => "Error",
        }
    }
}

/// Map an eyre::Report to a human-readable explanation with a fix hint.
pub fn humanize(err: &eyre::Report) -> String {
    let msg = err.to_string();
    match ErrorClass::of(err) {
        ErrorClass::InvalidHeaders => format!(
            "What happened: Invalid CSV headers.\nDetails: {msg}\nHow to fix: Use exactly the listed header row (see --help for each command)."
        ),
        ErrorClass::OutOfOrder => format!(
            "What happened: Input rows are out of time order.\nDetails: {msg}\nHow to fix: Sort the CSV by its timestamp column, oldest first."
        ),
        ErrorClass::InvalidConfig => format!(
            "What happened: Configuration is invalid.\nDetails: {msg}\nHow to fix: Edit the TOML config and try again."
        ),
        ErrorClass::Io => format!(
            "What happened: Could not open an input file.\nDetails: {msg}\nHow to fix: Check the path and file permissions."
        ),
        ErrorClass::Other => {
            let cause = err.source().map(|src| format!(" Cause: {src}")).unwrap_or_default();
            format!(
                "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
            )
        }
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": ErrorClass::of(err).name(), "message": humanize(err) }).to_string()
}
