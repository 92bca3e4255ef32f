//! Time related utils.

use crate::Error;
use chrono::SecondsFormat;
use chrono::SubsecRound;
use chrono::TimeDelta;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Drop the sub-second part, the precision of a formatted `se`.
pub fn truncate_to_seconds(t: DateTime) -> DateTime {
    t.trunc_subsecs(0)
}

/// Round up to the next whole second, keeping whole seconds as they are.
pub fn ceil_to_seconds(t: DateTime) -> DateTime {
    let truncated = truncate_to_seconds(t);
    if truncated < t {
        truncated + TimeDelta::seconds(1)
    } else {
        truncated
    }
}

/// Format time into RFC3339 with second precision: `2022-03-13T07:20:04Z`
///
/// This is the form Azure expects for `se` and `st`.
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse RFC3339 formatted time.
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::unexpected(format!("parse '{s}' into rfc3339 failed")).with_source(e))?
        .with_timezone(&Utc))
}

/// Parse http date like `Sun, 06 Nov 1994 08:49:37 GMT`.
///
/// Azure sends this form in `Last-Modified`.
pub fn parse_http_date(s: &str) -> crate::Result<DateTime> {
    Ok(chrono::DateTime::parse_from_rfc2822(s)
        .map_err(|e| Error::unexpected(format!("parse '{s}' into http date failed")).with_source(e))?
        .with_timezone(&Utc))
}

/// Build a datetime from unix seconds, as found in JWT `exp`/`nbf`.
pub fn from_timestamp(secs: i64) -> Option<DateTime> {
    chrono::DateTime::from_timestamp(secs, 0)
}
