//! Terminal rendering for occurrences: the agenda list and the month grid.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate};
use icsview_core::{LocalizedTime, NormalizedOccurrence, Tz};
use owo_colors::OwoColorize;

/// Display format for timed occurrences (e.g. "Mon, Jan 15, 2024 09:00 AM MST")
pub const DATE_FORMAT: &str = "%a, %b %d, %Y %I:%M %p %Z";

const ALL_DAY_LABEL: &str = "All day";

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for LocalizedTime {
    fn render(&self) -> String {
        match self {
            LocalizedTime::Instant(dt) => dt.format(DATE_FORMAT).to_string(),
            LocalizedTime::Date(_) => ALL_DAY_LABEL.to_string(),
        }
    }
}

impl Render for NormalizedOccurrence {
    fn render(&self) -> String {
        let time = self
            .start
            .as_ref()
            .map(Render::render)
            .unwrap_or_default();
        let summary = if self.is_recurring {
            self.summary.cyan().to_string()
        } else {
            self.summary.to_string()
        };

        format!("{} {}", summary, time.dimmed())
    }
}

/// Occurrences bucketed by the date they start on, each bucket in start order.
///
/// Occurrences without a start have no date and are left out.
pub fn group_by_date(
    occurrences: &[NormalizedOccurrence],
) -> BTreeMap<NaiveDate, Vec<&NormalizedOccurrence>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&NormalizedOccurrence>> = BTreeMap::new();

    for occurrence in occurrences {
        if let Some(date) = occurrence.date() {
            groups.entry(date).or_default().push(occurrence);
        }
    }

    // All-day entries sort ahead of timed ones on the same date
    for day in groups.values_mut() {
        day.sort_by_key(|o| start_instant(o));
    }

    groups
}

fn start_instant(occurrence: &NormalizedOccurrence) -> Option<DateTime<Tz>> {
    occurrence
        .start
        .as_ref()
        .and_then(LocalizedTime::as_instant)
        .copied()
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Format the time portion of an occurrence (e.g. "15:00" or "all-day")
fn format_time(occurrence: &NormalizedOccurrence) -> String {
    match occurrence.start {
        Some(LocalizedTime::Instant(dt)) => format!("{:>7}", dt.format("%H:%M")),
        _ => "all-day".to_string(),
    }
}

pub fn render_agenda(
    groups: &BTreeMap<NaiveDate, Vec<&NormalizedOccurrence>>,
    today: NaiveDate,
) -> Vec<String> {
    if groups.is_empty() {
        return vec!["No events found".dimmed().to_string()];
    }

    let mut lines = Vec::new();

    for (date, day) in groups {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format_date_label(*date, today).bold().to_string());

        for occurrence in day {
            let summary = if occurrence.is_recurring {
                occurrence.summary.cyan().to_string()
            } else {
                occurrence.summary.to_string()
            };
            lines.push(format!("  {} {}", format_time(occurrence), summary));
        }
    }

    lines
}

/// First day of the month, or None for an impossible year/month.
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Previous and next months as (year, month) pairs.
pub fn adjacent_months(first: NaiveDate) -> Option<((i32, u32), (i32, u32))> {
    let prev = first.checked_sub_months(Months::new(1))?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(((prev.year(), prev.month()), (next.year(), next.month())))
}

/// Weeks of the month, Sunday first. Days outside the month are None.
pub fn month_weeks(first: NaiveDate) -> Vec<[Option<NaiveDate>; 7]> {
    let offset = first.weekday().num_days_from_sunday() as usize;
    let days: Vec<NaiveDate> = first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .collect();

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    for (i, day) in days.into_iter().enumerate() {
        let slot = (i + offset) % 7;
        week[slot] = Some(day);
        if slot == 6 {
            weeks.push(week);
            week = [None; 7];
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }

    weeks
}

/// Render one month: a grid with marked event days, then the events of each day.
pub fn render_month(
    first: NaiveDate,
    groups: &BTreeMap<NaiveDate, Vec<&NormalizedOccurrence>>,
    today: NaiveDate,
) -> Vec<String> {
    let mut lines = vec![first.format("%B %Y").bold().to_string()];
    lines.push(" Su  Mo  Tu  We  Th  Fr  Sa".dimmed().to_string());

    for week in month_weeks(first) {
        let cells: Vec<String> = week
            .iter()
            .map(|slot| match slot {
                None => "    ".to_string(),
                Some(day) => {
                    let marker = if groups.contains_key(day) { "*" } else { " " };
                    let cell = format!("{:>3}{}", day.day(), marker);
                    if *day == today {
                        cell.reversed().to_string()
                    } else if groups.contains_key(day) {
                        cell.yellow().to_string()
                    } else {
                        cell
                    }
                }
            })
            .collect();
        lines.push(cells.join(""));
    }

    let in_month: Vec<_> = groups
        .iter()
        .filter(|(date, _)| date.year() == first.year() && date.month() == first.month())
        .collect();

    if in_month.is_empty() {
        lines.push(String::new());
        lines.push("No events this month".dimmed().to_string());
    }

    for (date, day) in in_month {
        lines.push(String::new());
        lines.push(date.format("%A, %B %-d").bold().to_string());
        for occurrence in day {
            lines.push(format!("  {}", occurrence.render()));
        }
    }

    if let Some(((prev_year, prev_month), (next_year, next_month))) = adjacent_months(first) {
        lines.push(String::new());
        let hint = format!(
            "prev: --year {} --month {}   next: --year {} --month {}",
            prev_year, prev_month, next_year, next_month
        );
        lines.push(hint.dimmed().to_string());
    }

    lines
}
