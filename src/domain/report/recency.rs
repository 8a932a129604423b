//! Recency window filtering

use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::entity::FormattedReport;

/// Source of "now" for time-window decisions
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Whole days between `now` and the report's first date, truncated toward zero
pub fn days_since_first_date(report: &FormattedReport, now: DateTime<Utc>) -> Option<i64> {
    report.dates.first().map(|first| (now - *first).num_days())
}

/// A report is recent when its first date is at most `window_days` before `now`
///
/// Reports without dates are never recent.
pub fn is_recent(report: &FormattedReport, now: DateTime<Utc>, window_days: i64) -> bool {
    days_since_first_date(report, now).is_some_and(|days| days <= window_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ReportUser;
    use chrono::{Duration, TimeZone};

    fn report_with_dates(dates: Vec<DateTime<Utc>>) -> FormattedReport {
        FormattedReport {
            id: "1".to_string(),
            title: "t".to_string(),
            body: None,
            dates,
            location_desc: None,
            images: vec![],
            permalink: None,
            user: ReportUser {
                id: "2".to_string(),
                name: "n".to_string(),
                image: None,
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_exactly_window_days_is_included() {
        let report = report_with_dates(vec![now() - Duration::days(7)]);
        assert!(is_recent(&report, now(), 7));
    }

    #[test]
    fn test_one_day_past_window_is_excluded() {
        let report = report_with_dates(vec![now() - Duration::days(8)]);
        assert!(!is_recent(&report, now(), 7));
    }

    #[test]
    fn test_partial_days_truncate() {
        let report = report_with_dates(vec![now() - Duration::days(7) - Duration::hours(23)]);
        assert_eq!(days_since_first_date(&report, now()), Some(7));
        assert!(is_recent(&report, now(), 7));
    }

    #[test]
    fn test_no_dates_is_never_recent() {
        let report = report_with_dates(vec![]);
        assert!(!is_recent(&report, now(), 7));
        assert!(!is_recent(&report, now(), i64::MAX));
    }

    #[test]
    fn test_future_dates_are_recent() {
        let report = report_with_dates(vec![now() + Duration::days(3)]);
        assert!(is_recent(&report, now(), 7));
    }

    #[test]
    fn test_only_first_date_counts() {
        let report = report_with_dates(vec![now() - Duration::days(30), now()]);
        assert!(!is_recent(&report, now(), 7));
    }

    #[test]
    fn test_mock_clock() {
        let mut clock = MockClock::new();
        clock.expect_now().times(1).returning(now);

        assert_eq!(clock.now(), now());
    }
}
