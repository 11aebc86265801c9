// ⏰ Calendar dates for meal planning
//
// Plan dates are calendar days, not instants. A date typed as
// "2025-03-09" means March 9th for everyone in the household, so inputs
// that arrive as timestamps keep the day *as written* instead of being
// shifted through UTC (which moves evening entries to the next day).

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::error::{PlannerError, Result};

/// Storage/display format for plan dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Monday..=Sunday of the week containing `date`
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start + Duration::days(6))
}

/// Week start for "now" as seen in UTC
pub fn current_week_start(now: DateTime<Utc>) -> NaiveDate {
    week_start(now.date_naive())
}

/// Parse a plan date from either `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps keep their local calendar date: "2025-03-09T23:30:00-05:00"
/// is March 9th, not March 10th.
pub fn parse_plan_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|e| PlannerError::invalid("date", format!("'{trimmed}': {e}")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2025-03-05 is a Wednesday
        assert_eq!(week_start(ymd(2025, 3, 5)), ymd(2025, 3, 3));
        // Monday maps to itself
        assert_eq!(week_start(ymd(2025, 3, 3)), ymd(2025, 3, 3));
        // Sunday belongs to the previous Monday
        assert_eq!(week_start(ymd(2025, 3, 9)), ymd(2025, 3, 3));
    }

    #[test]
    fn test_week_start_across_year_boundary() {
        // 2025-01-01 is a Wednesday; its week starts in December
        assert_eq!(week_start(ymd(2025, 1, 1)), ymd(2024, 12, 30));
    }

    #[test]
    fn test_week_range() {
        let (start, end) = week_range(ymd(2025, 3, 5));
        assert_eq!(start, ymd(2025, 3, 3));
        assert_eq!(end, ymd(2025, 3, 9));
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_plan_date("2025-03-09").unwrap(), ymd(2025, 3, 9));
        assert_eq!(parse_plan_date(" 2025-03-09 ").unwrap(), ymd(2025, 3, 9));
    }

    #[test]
    fn test_parse_timestamp_keeps_written_day() {
        // Late evening west of UTC would be the 10th in UTC
        assert_eq!(
            parse_plan_date("2025-03-09T23:30:00-05:00").unwrap(),
            ymd(2025, 3, 9)
        );
        // Early morning east of UTC would be the 8th in UTC
        assert_eq!(
            parse_plan_date("2025-03-09T00:30:00+09:00").unwrap(),
            ymd(2025, 3, 9)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_plan_date("next tuesday").is_err());
        assert!(parse_plan_date("2025-13-01").is_err());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(ymd(2025, 1, 2)), "2025-01-02");
    }
}
