//! Time-window matching.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// True iff `now` lies in `[start - lead_in, end + lag_out]`, both ends inclusive.
///
/// Padding saturates at the representable range instead of overflowing.
pub fn overlaps_now(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    lead_in: Duration,
    lag_out: Duration,
) -> bool {
    let padded_start = start
        .checked_sub_signed(lead_in)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let padded_end = end
        .checked_add_signed(lag_out)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    now >= padded_start && now <= padded_end
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
