//! Which events count as "busy now".

use chrono::{DateTime, Utc};

use super::window::overlaps_now;
use crate::integrations::provider::CalendarEvent;
use crate::storage::Config;

/// Whether `event` occupies `now` once padding and event policies apply.
///
/// Rules, in order: cancelled events never count; all-day events are dropped
/// when `ignore_all_day` is set; transparent ("free") events never count;
/// everything else must overlap `now`. Events with missing or unparseable
/// bounds are not relevant.
pub fn is_busy_relevant(event: &CalendarEvent, now: DateTime<Utc>, config: &Config) -> bool {
    if event.is_cancelled() {
        return false;
    }
    if config.ignore_all_day && event.is_all_day() {
        return false;
    }
    if event.is_transparent() {
        return false;
    }

    let start = event.start.as_ref().and_then(|t| t.instant());
    let end = event.end.as_ref().and_then(|t| t.instant());
    match (start, end) {
        (Some(start), Some(end)) => {
            overlaps_now(start, end, now, config.lead_in(), config.lag_out())
        }
        _ => false,
    }
}
