//! `"HH:MM"` <-> minutes since midnight.

use shared_utils::validation::is_time_format;

use crate::error::SchedulingError;

pub const MINUTES_PER_DAY: i32 = 24 * 60;
const END_OF_DAY: &str = "24:00";

pub fn to_minutes(value: &str) -> Result<i32, SchedulingError> {
    if !is_time_format(value) {
        return Err(SchedulingError::InvalidTimeFormat(value.to_string()));
    }

    let (hours, minutes) = value
        .split_once(':')
        .ok_or_else(|| SchedulingError::InvalidTimeFormat(value.to_string()))?;
    let hours: i32 = hours
        .parse()
        .map_err(|_| SchedulingError::InvalidTimeFormat(value.to_string()))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| SchedulingError::InvalidTimeFormat(value.to_string()))?;

    if hours > 23 || minutes > 59 {
        return Err(SchedulingError::InvalidTimeFormat(value.to_string()));
    }

    Ok(hours * 60 + minutes)
}

pub fn to_time_string(minutes: i32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Like [`to_minutes`], but also accepts `"24:00"` so a range can close at midnight.
pub fn to_end_minutes(value: &str) -> Result<i32, SchedulingError> {
    if value == END_OF_DAY {
        return Ok(MINUTES_PER_DAY);
    }
    to_minutes(value)
}

/// Parses a stored start/end pair into a half-open range.
pub fn to_range(start: &str, end: &str) -> Result<(i32, i32), SchedulingError> {
    Ok((to_minutes(start)?, to_end_minutes(end)?))
}
