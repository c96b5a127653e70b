//! ICS document parsing using the icalendar crate's parser.

use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};
use tracing::{debug, error, info, warn};

use crate::error::{ParseError, ParseResult};
use crate::event::{RawEventRecord, TemporalValue};

const CALENDAR_HEADER: &str = "BEGIN:VCALENDAR";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parse a whole calendar document into raw event records.
///
/// Only structural extraction happens here: timezone and recurrence
/// semantics are left to the expander. Events with neither a summary nor a
/// start are dropped.
pub fn parse_document(content: &str) -> ParseResult<Vec<RawEventRecord>> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    if content.trim().is_empty() {
        error!("{}", ParseError::Empty);
        return Err(ParseError::Empty);
    }

    let unfolded = unfold(content);
    if !unfolded.trim_start().starts_with(CALENDAR_HEADER) {
        let err = ParseError::Malformed(format!("document does not start with {CALENDAR_HEADER}"));
        error!("{}", err);
        return Err(err);
    }

    let calendar = read_calendar(&unfolded).map_err(|e| {
        let err = ParseError::Malformed(e.to_string());
        error!("{}", err);
        err
    })?;

    let mut vevents = Vec::new();
    for component in &calendar.components {
        collect_vevents(component, &mut vevents);
    }

    let records: Vec<RawEventRecord> = vevents
        .into_iter()
        .map(to_record)
        .filter(RawEventRecord::is_displayable)
        .collect();

    info!(count = records.len(), "Parsed events from ICS data");
    Ok(records)
}

/// Walk the component tree, collecting every VEVENT at any depth.
fn collect_vevents<'c, 'a>(component: &'c Component<'a>, out: &mut Vec<&'c Component<'a>>) {
    if component.name == "VEVENT" {
        out.push(component);
    }
    for child in &component.components {
        collect_vevents(child, out);
    }
}

fn to_record(vevent: &Component<'_>) -> RawEventRecord {
    let summary = vevent.find_prop("SUMMARY").map(|p| p.val.to_string());
    let start = temporal_prop(vevent, "DTSTART");
    let end = temporal_prop(vevent, "DTEND");
    let recurrence_rule = vevent.find_prop("RRULE").map(|p| p.val.to_string());

    RawEventRecord {
        summary,
        start,
        end,
        recurrence_rule,
    }
}

/// Read a DTSTART/DTEND-style property. Unreadable values count as absent.
fn temporal_prop(vevent: &Component<'_>, name: &str) -> Option<TemporalValue> {
    let prop = vevent.find_prop(name)?;

    match DatePerhapsTime::try_from(prop) {
        Ok(dpt) => Some(to_temporal_value(dpt)),
        Err(e) => {
            debug!(property = name, value = prop.val.as_ref(), error = ?e, "Ignoring unreadable date value");
            None
        }
    }
}

/// Convert icalendar's DatePerhapsTime to our TemporalValue, keeping the zone
fn to_temporal_value(dpt: DatePerhapsTime) -> TemporalValue {
    match dpt {
        DatePerhapsTime::Date(d) => TemporalValue::CalendarDate(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => TemporalValue::Instant {
                moment: dt.naive_utc(),
                timezone: Some(Tz::UTC),
            },
            CalendarDateTime::Floating(naive) => TemporalValue::Instant {
                moment: naive,
                timezone: None,
            },
            CalendarDateTime::WithTimezone { date_time, tzid } => TemporalValue::Instant {
                moment: date_time,
                timezone: lookup_tzid(&tzid),
            },
        },
    }
}

/// Resolve a TZID parameter against the IANA database.
///
/// Unknown zones leave the value floating.
fn lookup_tzid(tzid: &str) -> Option<Tz> {
    let name = tzid.trim_matches('"');
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            warn!(tzid = name, "Unknown TZID, treating time as floating");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn moment(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_empty_input_is_empty_not_malformed() {
        assert_eq!(parse_document(""), Err(ParseError::Empty));
        assert_eq!(parse_document("  \r\n "), Err(ParseError::Empty));
    }

    #[test]
    fn test_non_calendar_text_is_malformed() {
        let result = parse_document("<html><body>Not found</body></html>");
        assert!(
            matches!(result, Err(ParseError::Malformed(_))),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_parse_classifies_temporal_values() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:all-day\r\n\
SUMMARY:Holiday\r\n\
DTSTART;VALUE=DATE:20240115\r\n\
DTEND;VALUE=DATE:20240116\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:utc\r\n\
SUMMARY:Call\r\n\
DTSTART:20240101T100000Z\r\n\
DTEND:20240101T110000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:zoned\r\n\
SUMMARY:Lunch\r\n\
DTSTART;TZID=America/New_York:20240102T120000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:floating\r\n\
SUMMARY:Standup\r\n\
DTSTART:20240101T090000\r\n\
RRULE:FREQ=WEEKLY;COUNT=3\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let records = parse_document(ics).expect("Should parse");
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].summary.as_deref(), Some("Holiday"));
        assert_eq!(
            records[0].start,
            Some(TemporalValue::CalendarDate(
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
            ))
        );
        assert_eq!(
            records[0].end,
            Some(TemporalValue::CalendarDate(
                NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
            ))
        );

        assert_eq!(
            records[1].start,
            Some(TemporalValue::Instant {
                moment: moment("2024-01-01 10:00:00"),
                timezone: Some(Tz::UTC),
            })
        );

        assert_eq!(
            records[2].start,
            Some(TemporalValue::Instant {
                moment: moment("2024-01-02 12:00:00"),
                timezone: Some(chrono_tz::America::New_York),
            })
        );
        assert_eq!(records[2].end, None);

        assert!(matches!(
            records[3].start,
            Some(TemporalValue::Instant { timezone: None, .. })
        ));
        assert_eq!(
            records[3].recurrence_rule.as_deref(),
            Some("FREQ=WEEKLY;COUNT=3")
        );
    }

    #[test]
    fn test_events_without_summary_or_start_are_dropped() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:nothing-to-show
DTEND:20240101T110000Z
END:VEVENT
BEGIN:VEVENT
UID:title-only
SUMMARY:Someday
END:VEVENT
END:VCALENDAR"#;

        let records = parse_document(ics).expect("Should parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary.as_deref(), Some("Someday"));
        assert_eq!(records[0].start, None);
    }

    #[test]
    fn test_unknown_tzid_becomes_floating() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:custom-zone
SUMMARY:Offsite
DTSTART;TZID=Custom/Nowhere:20240301T080000
END:VEVENT
END:VCALENDAR"#;

        let records = parse_document(ics).expect("Should parse");
        assert_eq!(
            records[0].start,
            Some(TemporalValue::Instant {
                moment: moment("2024-03-01 08:00:00"),
                timezone: None,
            })
        );
    }

    #[test]
    fn test_parse_line_folding_in_summary() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:test-123\r\n\
SUMMARY:Quarterly \r\n planning review\r\n\
DTSTART:20240101T100000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        let records = parse_document(ics).expect("Should parse");
        assert_eq!(
            records[0].summary.as_deref(),
            Some("Quarterly planning review")
        );
    }

    #[test]
    fn test_leading_byte_order_mark_is_ignored() {
        let ics = "\u{feff}BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:bom\r\n\
SUMMARY:Review\r\n\
DTSTART:20240101T100000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let records = parse_document(ics).expect("Should parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary.as_deref(), Some("Review"));

        assert_eq!(parse_document("\u{feff}"), Err(ParseError::Empty));
    }

    #[test]
    fn test_document_without_events_is_not_an_error() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nEND:VCALENDAR\r\n";

        let records = parse_document(ics).expect("Should parse");
        assert!(records.is_empty());
    }
}
