use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use shared_utils::validation::is_date_format;

use crate::error::SchedulingError;

pub fn parse_timezone(name: &str) -> Result<Tz, SchedulingError> {
    name.parse::<Tz>()
        .map_err(|_| SchedulingError::InvalidTimezone(name.to_string()))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, SchedulingError> {
    if !is_date_format(value) {
        return Err(SchedulingError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| SchedulingError::InvalidDate(value.to_string()))
}

/// Weekday (0 = Sunday .. 6 = Saturday) of `date` on the provider's local calendar.
///
/// Anchored at local noon; DST transitions happen around midnight.
pub fn day_of_week(date: NaiveDate, timezone: &str) -> Result<u8, SchedulingError> {
    let tz = parse_timezone(timezone)?;
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());

    let local = tz
        .from_local_datetime(&noon)
        .earliest()
        .ok_or_else(|| SchedulingError::InvalidDate(date.to_string()))?;

    Ok(local.weekday().num_days_from_sunday() as u8)
}

pub fn resolve_day_of_week(date: &str, timezone: &str) -> Result<u8, SchedulingError> {
    day_of_week(parse_date(date)?, timezone)
}

/// Today's date on the given zone's calendar.
pub fn today_in(timezone: &str) -> Result<NaiveDate, SchedulingError> {
    let tz = parse_timezone(timezone)?;
    Ok(chrono::Utc::now().with_timezone(&tz).date_naive())
}
