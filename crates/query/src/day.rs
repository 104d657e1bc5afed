//! Calendar-day interval computation.

use chrono::{Days, FixedOffset, NaiveDate, TimeZone, Utc};

use orderdesk_core::{DomainError, DomainResult};
use orderdesk_store::Interval;

/// Half-open UTC interval covering calendar day `date` in zone `offset`:
/// `[D 00:00, D+1 00:00)` local time. A record stamped exactly at the next
/// midnight belongs to the next day.
pub fn day_interval(date: NaiveDate, offset: FixedOffset) -> DomainResult<Interval> {
    let next = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| DomainError::validation(format!("date {date} out of range")))?;
    let start = local_midnight(date, offset)?;
    let end = local_midnight(next, offset)?;
    Ok(Interval { start, end })
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DomainResult<chrono::DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DomainError::validation(format!("date {date} out of range")))?;
    // A fixed offset has no gaps or folds, so midnight always maps uniquely.
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| DomainError::validation(format!("date {date} out of range")))
}

/// Strict `YYYY-MM-DD` parsing for date path parameters.
pub fn parse_day(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("invalid date {raw:?}, expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn interval_covers_the_local_day_exactly() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let interval = day_interval(day, offset(2)).unwrap();

        // Local 2024-05-10 00:00 +02:00 is 2024-05-09 22:00 UTC.
        assert_eq!(interval.start, Utc.with_ymd_and_hms(2024, 5, 9, 22, 0, 0).unwrap());
        assert_eq!(interval.end, Utc.with_ymd_and_hms(2024, 5, 10, 22, 0, 0).unwrap());

        assert!(interval.contains(interval.start));
        assert!(!interval.contains(interval.end));
    }

    #[test]
    fn utc_offset_is_the_plain_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let interval = day_interval(day, offset(0)).unwrap();
        assert_eq!(interval.start, Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());
        assert_eq!(interval.end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn date_parameters_are_strict() {
        assert!(parse_day("2024-05-10").is_ok());
        for raw in ["2024-5-10", "10/05/2024", "2024-05-10T00:00:00", "yesterday", ""] {
            assert!(matches!(
                parse_day(raw).unwrap_err(),
                DomainError::Validation(_)
            ));
        }
    }
}
