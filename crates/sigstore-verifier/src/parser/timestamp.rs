use chrono::{DateTime, Utc};

use crate::error::TimestampError;

/// Parse a Rekor `integratedTime` (decimal seconds since the Unix epoch, as
/// a string per the bundle JSON schema) into an instant.
pub fn parse_integrated_time(time_str: &str) -> Result<DateTime<Utc>, TimestampError> {
    let timestamp = time_str
        .parse::<i64>()
        .map_err(|_| TimestampError::InvalidIntegratedTime)?;

    DateTime::from_timestamp(timestamp, 0).ok_or(TimestampError::InvalidIntegratedTime)
}
