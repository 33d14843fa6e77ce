use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::error::{CoreError, Result};

/// Parses an RFC 3339 timestamp such as `2030-01-01T00:00:00Z`.
pub fn parse_rfc3339(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(format!("failed to parse '{s}' as RFC 3339: {e}")))
}

/// Formats a timestamp in the canonical form used for flattened state:
/// UTC, whole seconds, `Z` suffix.
pub fn format_rfc3339(datetime: OffsetDateTime) -> Result<String> {
    let utc = datetime.to_offset(UtcOffset::UTC);
    let whole = utc
        .replace_nanosecond(0)
        .map_err(|e| CoreError::invalid_date_time(e.to_string()))?;
    whole
        .format(&Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(e.to_string()))
}
