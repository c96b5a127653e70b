//! Occurrence expansion.
//!
//! Turns each raw record into normalized occurrences: one pass-through
//! occurrence for a single event, or every RRULE instance that falls inside
//! the expansion window for a recurring one. Rules are evaluated in the
//! event's own timezone (UTC for floating times, midnight UTC and date-only
//! comparison for all-day events) and the results converted afterwards.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use rrule::{RRule, RRuleSet, Unvalidated};
use tracing::{debug, info, warn};

use crate::error::RuleError;
use crate::event::{
    LocalizedTime, NormalizedOccurrence, RECURRING_SUFFIX, RawEventRecord, TemporalValue,
};
use crate::timezone::{NAIVE_TIMEZONE, localize, normalize, resolve_instant};
use crate::window::ExpansionWindow;

/// Expand one record into normalized occurrences.
///
/// Never fails: a recurrence rule that cannot be evaluated is logged and
/// the record contributes nothing.
pub fn expand_occurrences(
    record: &RawEventRecord,
    window: &ExpansionWindow,
    target_tz: Tz,
) -> Vec<NormalizedOccurrence> {
    let Some(rule) = &record.recurrence_rule else {
        return single_occurrence(record, target_tz).into_iter().collect();
    };

    match expand_recurring(record, rule, window, target_tz) {
        Ok(occurrences) => {
            debug!(
                summary = record.summary_or_default(),
                count = occurrences.len(),
                "Expanded recurring event"
            );
            occurrences
        }
        Err(e) => {
            warn!(
                summary = record.summary_or_default(),
                start = ?record.start,
                error = %e,
                "Skipping recurring event"
            );
            Vec::new()
        }
    }
}

/// Expand every record of a document, isolating per-event rule failures.
///
/// The result is unsorted.
pub fn expand_all<'r>(
    records: impl IntoIterator<Item = &'r RawEventRecord>,
    window: &ExpansionWindow,
    target_tz: Tz,
) -> Vec<NormalizedOccurrence> {
    let occurrences: Vec<NormalizedOccurrence> = records
        .into_iter()
        .flat_map(|record| expand_occurrences(record, window, target_tz))
        .collect();

    info!(count = occurrences.len(), timezone = target_tz.name(), "Expanded occurrences");
    occurrences
}

fn single_occurrence(record: &RawEventRecord, target_tz: Tz) -> Option<NormalizedOccurrence> {
    if !record.is_displayable() {
        return None;
    }

    Some(NormalizedOccurrence {
        summary: record.summary_or_default().to_string(),
        start: record.start.as_ref().map(|v| normalize(v, target_tz)),
        end: record.end.as_ref().map(|v| normalize(v, target_tz)),
        is_recurring: false,
    })
}

fn expand_recurring(
    record: &RawEventRecord,
    rule: &str,
    window: &ExpansionWindow,
    target_tz: Tz,
) -> Result<Vec<NormalizedOccurrence>, RuleError> {
    let start = record
        .start
        .as_ref()
        .ok_or_else(|| RuleError("recurrence rule without DTSTART".to_string()))?;

    let span = TemplateSpan::between(start, record.end.as_ref());
    let context = EvaluationContext::for_start(start);
    let rule_set = build_rule_set(start, rule, context)?;

    let starts: Vec<LocalizedTime> = match context {
        EvaluationContext::Zoned(tz) => {
            let (lower, upper) = window.in_zone(&rrule::Tz::Tz(tz));
            within_window(rule_set.into_iter(), lower, upper)
                .map(|occurrence| LocalizedTime::Instant(occurrence.with_timezone(&target_tz)))
                .collect()
        }
        EvaluationContext::AllDay => {
            let (first, last) = window.dates();
            let dates = rule_set.into_iter().map(|occurrence| occurrence.date_naive());
            within_window(dates, first, last)
                .map(LocalizedTime::Date)
                .collect()
        }
    };

    let summary = format!("{}{}", record.summary_or_default(), RECURRING_SUFFIX);

    Ok(starts
        .into_iter()
        .map(|start| NormalizedOccurrence {
            summary: summary.clone(),
            end: span.and_then(|span| span.end_for(&start)),
            start: Some(start),
            is_recurring: true,
        })
        .collect())
}

/// Intersect an ordered candidate sequence with `[lower, upper]`.
///
/// Pulling stops at the first candidate past `upper`, so a rule without
/// COUNT or UNTIL still terminates.
fn within_window<I, T>(candidates: I, lower: T, upper: T) -> impl Iterator<Item = T>
where
    I: Iterator<Item = T>,
    T: PartialOrd,
{
    candidates
        .skip_while(move |candidate| *candidate < lower)
        .take_while(move |candidate| *candidate <= upper)
}

/// Zone (or date-only mode) a rule is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvaluationContext {
    Zoned(Tz),
    /// All-day start: evaluated at midnight UTC, compared by date only
    AllDay,
}

impl EvaluationContext {
    fn for_start(start: &TemporalValue) -> Self {
        match start {
            TemporalValue::Instant { timezone, .. } => {
                EvaluationContext::Zoned(timezone.unwrap_or(NAIVE_TIMEZONE))
            }
            TemporalValue::CalendarDate(_) => EvaluationContext::AllDay,
        }
    }
}

/// Span of the rule's template occurrence, reapplied to every instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateSpan {
    Timed(TimeDelta),
    Days(i64),
}

impl TemplateSpan {
    /// Undefined unless start and end are the same kind of value.
    fn between(start: &TemporalValue, end: Option<&TemporalValue>) -> Option<Self> {
        match (start, end?) {
            (
                TemporalValue::Instant {
                    moment: start,
                    timezone: start_tz,
                },
                TemporalValue::Instant {
                    moment: end,
                    timezone: end_tz,
                },
            ) => Some(TemplateSpan::Timed(
                resolve_instant(end, *end_tz) - resolve_instant(start, *start_tz),
            )),
            (TemporalValue::CalendarDate(start), TemporalValue::CalendarDate(end)) => {
                Some(TemplateSpan::Days((*end - *start).num_days()))
            }
            _ => None,
        }
    }

    fn end_for(self, start: &LocalizedTime) -> Option<LocalizedTime> {
        match (self, start) {
            (TemplateSpan::Timed(delta), LocalizedTime::Instant(dt)) => {
                Some(LocalizedTime::Instant(*dt + delta))
            }
            (TemplateSpan::Days(days), LocalizedTime::Date(date)) => {
                Some(LocalizedTime::Date(*date + TimeDelta::days(days)))
            }
            _ => None,
        }
    }
}

/// Parse the RRULE and anchor it at the template's start.
fn build_rule_set(
    start: &TemporalValue,
    rule: &str,
    context: EvaluationContext,
) -> Result<RRuleSet, RuleError> {
    normalize_until(rule, context)
        .parse::<RRule<Unvalidated>>()
        .and_then(|rrule| rrule.build(rule_start(start)))
        .map_err(|e| RuleError(e.to_string()))
}

/// DTSTART for the rule evaluator, already resolved to an instant.
///
/// Floating times get the naive zone attached so the evaluator never runs in
/// the machine's local zone. A wall-clock start inside a DST gap or overlap
/// resolves the same way a single event's start does.
fn rule_start(start: &TemporalValue) -> DateTime<rrule::Tz> {
    let dtstart = match start {
        // the rrule crate needs a datetime, so all-day dates become midnight UTC
        TemporalValue::CalendarDate(d) => Tz::UTC.from_utc_datetime(&d.and_time(NaiveTime::MIN)),
        TemporalValue::Instant { moment, timezone } => resolve_instant(moment, *timezone),
    };
    dtstart.with_timezone(&rrule::Tz::Tz(dtstart.timezone()))
}

/// Rewrite a floating UNTIL as UTC, read in the evaluation zone.
///
/// The evaluator only accepts a UTC UNTIL alongside a zoned DTSTART. A
/// date-only UNTIL covers its whole day for timed rules.
fn normalize_until(rule: &str, context: EvaluationContext) -> String {
    rule.split(';')
        .map(|part| match part.strip_prefix("UNTIL=") {
            Some(value) => format!("UNTIL={}", utc_until(value, context)),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn utc_until(value: &str, context: EvaluationContext) -> String {
    if value.ends_with('Z') {
        return value.to_string();
    }

    let local = if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        match context {
            EvaluationContext::AllDay => date.and_time(NaiveTime::MIN),
            EvaluationContext::Zoned(_) => {
                date.and_time(NaiveTime::MIN) + TimeDelta::days(1) - TimeDelta::seconds(1)
            }
        }
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        dt
    } else {
        // let the evaluator report it
        return value.to_string();
    };

    let tz = match context {
        EvaluationContext::Zoned(tz) => tz,
        EvaluationContext::AllDay => Tz::UTC,
    };

    localize(tz, &local)
        .naive_utc()
        .format("%Y%m%dT%H%M%SZ")
        .to_string()
}
