//! Date parameters to millisecond bounds
//!
//! Dates are interpreted in UTC. Conversions happen in the API layer; the
//! repositories only see `i64` Unix millis.

use chrono::{NaiveDate, NaiveTime};

use super::{AppError, AppResult};

/// Parse `YYYY-MM-DD`
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {date}, expected YYYY-MM-DD")))
}

/// 00:00:00.000 of `date`
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Last millisecond of `date`, for inclusive `<=` bounds
pub fn day_end_millis(date: NaiveDate) -> i64 {
    match date.succ_opt() {
        Some(next) => day_start_millis(next) - 1,
        None => i64::MAX,
    }
}

/// Inclusive `[from, to]` bounds from optional start/end dates
///
/// Rejects a range whose end precedes its start.
pub fn date_bounds(start: Option<&str>, end: Option<&str>) -> AppResult<(Option<i64>, Option<i64>)> {
    let from = start
        .filter(|s| !s.trim().is_empty())
        .map(parse_date)
        .transpose()?;
    let to = end
        .filter(|s| !s.trim().is_empty())
        .map(parse_date)
        .transpose()?;

    if let (Some(from), Some(to)) = (from, to)
        && to < from
    {
        return Err(AppError::validation("endDate must not be before startDate"));
    }

    Ok((from.map(day_start_millis), to.map(day_end_millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds() {
        let date = parse_date("2024-03-01").unwrap();
        assert_eq!(day_start_millis(date), 1_709_251_200_000);
        assert_eq!(day_end_millis(date), 1_709_251_200_000 + 86_400_000 - 1);
    }

    #[test]
    fn test_invalid_date() {
        assert!(parse_date("01/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_date_bounds() {
        assert_eq!(date_bounds(None, Some("")).unwrap(), (None, None));

        let (from, to) = date_bounds(Some("2024-03-01"), Some("2024-03-01")).unwrap();
        assert_eq!(to.unwrap() - from.unwrap(), 86_400_000 - 1);

        let err = date_bounds(Some("2024-03-02"), Some("2024-03-01")).unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
    }
}
