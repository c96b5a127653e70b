//! Event types flowing through the parser and the expander.
//!
//! `RawEventRecord` is what the parser extracts from a VEVENT, untouched.
//! `NormalizedOccurrence` is what the expander hands back: one concrete
//! instance, with every timed value converted into the target timezone.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Suffix appended to the summary of every generated recurring occurrence.
pub const RECURRING_SUFFIX: &str = " (Recurring)";

/// Summary used when an event carries none.
pub const UNTITLED_SUMMARY: &str = "(No title)";

/// One VEVENT as extracted from the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub summary: Option<String>,
    pub start: Option<TemporalValue>,
    pub end: Option<TemporalValue>,
    /// RRULE value, verbatim (e.g. `FREQ=WEEKLY;COUNT=3`)
    pub recurrence_rule: Option<String>,
}

impl RawEventRecord {
    /// A record with neither summary nor start has nothing to display.
    pub fn is_displayable(&self) -> bool {
        self.summary.is_some() || self.start.is_some()
    }

    pub fn summary_or_default(&self) -> &str {
        self.summary.as_deref().unwrap_or(UNTITLED_SUMMARY)
    }
}

/// DTSTART / DTEND value as written in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalValue {
    /// Wall-clock reading in `timezone`. `None` means the document gave no
    /// zone or offset at all (a "floating" time).
    Instant {
        moment: NaiveDateTime,
        timezone: Option<Tz>,
    },
    /// All-day value (`VALUE=DATE`)
    CalendarDate(NaiveDate),
}

/// A start or end after normalization.
///
/// Timed values always carry the target timezone; dates never acquire one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocalizedTime {
    Instant(DateTime<Tz>),
    Date(NaiveDate),
}

impl LocalizedTime {
    /// Calendar date this value falls on, in the zone it is expressed in.
    pub fn date(&self) -> NaiveDate {
        match self {
            LocalizedTime::Instant(dt) => dt.date_naive(),
            LocalizedTime::Date(d) => *d,
        }
    }

    pub fn as_instant(&self) -> Option<&DateTime<Tz>> {
        match self {
            LocalizedTime::Instant(dt) => Some(dt),
            LocalizedTime::Date(_) => None,
        }
    }
}

/// One concrete occurrence, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedOccurrence {
    pub summary: String,
    /// Only absent for a non-recurring event that has a summary but no DTSTART.
    pub start: Option<LocalizedTime>,
    /// Absent when no duration could be derived.
    pub end: Option<LocalizedTime>,
    pub is_recurring: bool,
}

impl NormalizedOccurrence {
    /// Date used to place this occurrence on a calendar grid.
    pub fn date(&self) -> Option<NaiveDate> {
        self.start.as_ref().map(LocalizedTime::date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_without_summary_or_start_is_not_displayable() {
        let record = RawEventRecord {
            end: Some(TemporalValue::CalendarDate(
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            )),
            ..Default::default()
        };
        assert!(!record.is_displayable());
        assert_eq!(record.summary_or_default(), UNTITLED_SUMMARY);
    }

    #[test]
    fn test_localized_time_date_uses_its_own_zone() {
        let denver = chrono_tz::America::Denver;
        let late_evening = denver.with_ymd_and_hms(2024, 1, 15, 22, 0, 0).unwrap();

        // 05:00 UTC the next day, but still the 15th in Denver
        assert_eq!(
            LocalizedTime::Instant(late_evening).date(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_occurrence_serializes_start_as_rfc3339() {
        let occurrence = NormalizedOccurrence {
            summary: "Standup".to_string(),
            start: Some(LocalizedTime::Instant(
                chrono_tz::UTC.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            )),
            end: None,
            is_recurring: false,
        };

        let json = serde_json::to_value(&occurrence).expect("Should serialize");
        let start = json["start"]["Instant"].as_str().expect("Should be a string");
        assert!(start.starts_with("2024-01-01T09:00:00"), "got {}", start);
        assert_eq!(json["is_recurring"], false);
    }
}
