//! Time window used to bound recurrence expansion.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use chrono_tz::Tz;

use crate::timezone::localize;

/// Default forward-looking horizon for expansion, in days.
pub const DEFAULT_HORIZON_DAYS: i64 = 90;

/// Inclusive window `[lower_bound, upper_bound]`, expressed in the target timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionWindow {
    pub lower_bound: DateTime<Tz>,
    pub upper_bound: DateTime<Tz>,
}

impl ExpansionWindow {
    pub fn new(lower_bound: DateTime<Tz>, upper_bound: DateTime<Tz>) -> Self {
        ExpansionWindow {
            lower_bound,
            upper_bound,
        }
    }

    /// `[now, now + horizon]`
    pub fn from_now(now: DateTime<Tz>, horizon: TimeDelta) -> Self {
        ExpansionWindow::new(now, now + horizon)
    }

    /// Window spanning from the start of `first` to the start of `last`, local to `tz`.
    pub fn between_dates(first: NaiveDate, last: NaiveDate, tz: Tz) -> Self {
        ExpansionWindow::new(
            localize(tz, &first.and_time(NaiveTime::MIN)),
            localize(tz, &last.and_time(NaiveTime::MIN)),
        )
    }

    /// Bounds converted into another zone, for comparing against values
    /// produced in that zone.
    pub fn in_zone<Z: chrono::TimeZone>(&self, zone: &Z) -> (DateTime<Z>, DateTime<Z>) {
        (
            self.lower_bound.with_timezone(zone),
            self.upper_bound.with_timezone(zone),
        )
    }

    /// Bounds with zone and time-of-day stripped, for all-day comparisons.
    pub fn dates(&self) -> (NaiveDate, NaiveDate) {
        (self.lower_bound.date_naive(), self.upper_bound.date_naive())
    }

    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        *instant >= self.lower_bound && *instant <= self.upper_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_now_spans_horizon() {
        let now = chrono_tz::UTC.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let window = ExpansionWindow::from_now(now, TimeDelta::days(DEFAULT_HORIZON_DAYS));

        assert_eq!(
            window.upper_bound,
            chrono_tz::UTC.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert!(window.contains(&now));
        assert!(window.contains(&window.upper_bound));
    }

    #[test]
    fn test_between_dates_uses_local_midnight() {
        let tz = chrono_tz::Etc::GMTPlus7;
        let window = ExpansionWindow::between_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            tz,
        );

        assert_eq!(
            window.lower_bound.naive_utc(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap()
        );
        assert_eq!(
            window.dates(),
            (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
            )
        );
    }

    #[test]
    fn test_dates_strip_time_in_target_zone() {
        let denver = chrono_tz::America::Denver;
        // 03:00 UTC on the 2nd is still the 1st in Denver
        let lower = chrono_tz::UTC
            .with_ymd_and_hms(2024, 1, 2, 3, 0, 0)
            .unwrap()
            .with_timezone(&denver);
        let window = ExpansionWindow::from_now(lower, TimeDelta::days(1));

        assert_eq!(window.dates().0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
