//! Timezone normalization.
//!
//! Every timed value leaving the core is expressed in the caller's target
//! timezone. Floating (naive) times are read as UTC, never as target-local.

use chrono::offset::LocalResult;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::event::{LocalizedTime, TemporalValue};

/// Zone assumed for timestamps that carry no zone or offset.
pub const NAIVE_TIMEZONE: Tz = Tz::UTC;

/// Attach `tz` to a wall-clock reading.
///
/// An ambiguous reading (DST fall-back) resolves to the earlier instant.
/// A reading inside a DST gap does not exist locally and is read as UTC.
pub fn localize(tz: Tz, moment: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(moment) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz.from_utc_datetime(moment),
    }
}

/// Resolve an instant to an absolute point in time, applying the naive
/// fallback when the document gave no zone.
pub fn resolve_instant(moment: &NaiveDateTime, timezone: Option<Tz>) -> DateTime<Tz> {
    localize(timezone.unwrap_or(NAIVE_TIMEZONE), moment)
}

/// Convert a document value into the target timezone.
///
/// Dates pass through unchanged.
pub fn normalize(value: &TemporalValue, target: Tz) -> LocalizedTime {
    match value {
        TemporalValue::Instant { moment, timezone } => {
            LocalizedTime::Instant(resolve_instant(moment, *timezone).with_timezone(&target))
        }
        TemporalValue::CalendarDate(date) => LocalizedTime::Date(*date),
    }
}
