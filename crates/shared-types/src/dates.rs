//! Lenient date parsing for the assorted formats the Projects API emits.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Date/time formats attempted in order for free-form strings.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m-%d-%Y %I:%M:%S %p",
    "%m-%d-%Y %I:%M %p",
    "%Y-%m-%d %I:%M %p",
];

/// Date-only formats attempted after the datetime formats.
const DATE_FORMATS: &[&str] = &["%m-%d-%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Parse a free-form date or datetime string.
///
/// Offset-carrying strings (RFC 3339 / RFC 2822) are converted to the
/// reference timezone; naive strings are assumed to already be in it.
/// Date-only strings resolve to midnight. Returns `None` when nothing
/// matches.
pub fn parse_flexible(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&tz));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return localize(naive, tz);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).and_then(|naive| localize(naive, tz));
        }
    }

    None
}

/// Convert an epoch-milliseconds timestamp (UTC) to the reference timezone.
pub fn from_epoch_millis(millis: i64, tz: Tz) -> Option<DateTime<Tz>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.with_timezone(&tz))
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    // earliest() picks the first valid instant across DST gaps
    tz.from_local_datetime(&naive).earliest()
}
