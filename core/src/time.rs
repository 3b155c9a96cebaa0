//! Time related utils.
//!
//! The `Date` header produced here is checked byte-for-byte by the remote
//! verifier, so weekday and month names come from fixed English tables
//! instead of anything locale aware.

use crate::Error;
use chrono::Datelike;
use chrono::NaiveDateTime;
use chrono::Timelike;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into http date: `Tue, 01 Mar 2022 08:12:34 +0000`
///
/// Equivalent to the `EEE, dd MMM yyyy HH:mm:ss Z` pattern rendered in UTC.
pub fn format_http_date(t: DateTime) -> String {
    format!(
        "{}, {:02} {} {:04} {:02}:{:02}:{:02} +0000",
        WEEKDAYS[t.weekday().num_days_from_monday() as usize],
        t.day(),
        MONTHS[t.month0() as usize],
        t.year(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

/// Parse http date.
///
/// Accepts the three forms allowed by RFC 9110:
///
/// - IMF-fixdate / RFC 1123: `Sun, 06 Nov 1994 08:49:37 GMT` (numeric zones accepted too)
/// - RFC 850: `Sunday, 06-Nov-94 08:49:37 GMT`
/// - asctime: `Sun Nov  6 08:49:37 1994`
pub fn parse_http_date(s: &str) -> crate::Result<DateTime> {
    let s = s.trim();

    if let Ok(t) = chrono::DateTime::parse_from_rfc2822(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Ok(t.and_utc());
    }
    NaiveDateTime::parse_from_str(s, "%a %b %e %H:%M:%S %Y")
        .map(|t| t.and_utc())
        .map_err(|e| Error::unexpected(format!("invalid http date: {s}")).with_source(e))
}

/// Parse rfc3339 string like `2022-03-13T07:20:04Z`
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("invalid rfc3339 time: {s}")).with_source(e))
}
