//! Commit-header date parsing

use chrono::{DateTime, FixedOffset};

use crate::error::HarvestError;

/// Git's default header date format, as pinned by the log invocation
/// (`Tue Feb 11 22:10:39 2014 -0800`; single-digit days are space-padded).
const GIT_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y %z";

/// Parse a header date, keeping its timezone offset.
pub fn parse_commit_date(value: &str) -> Result<DateTime<FixedOffset>, HarvestError> {
    DateTime::parse_from_str(value.trim(), GIT_DATE_FORMAT)
        .map_err(|err| HarvestError::InvalidDate(format!("'{value}': {err}")))
}

/// UTC-normalized epoch seconds for an envelope timestamp.
pub fn epoch_seconds(date: &DateTime<FixedOffset>) -> f64 {
    date.timestamp() as f64
}
