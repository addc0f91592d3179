use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use uuid::Uuid;

use shared_models::error::AppError;

fn date_pattern() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"))
}

fn time_pattern() -> &'static Regex {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").expect("static time pattern"))
}

pub fn is_date_format(value: &str) -> bool {
    date_pattern().is_match(value)
}

pub fn is_time_format(value: &str) -> bool {
    time_pattern().is_match(value)
}

/// `YYYY-MM-DD` that is also a real calendar day.
pub fn parse_date_field(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    if !is_date_format(value) {
        return Err(AppError::invalid_field(field, value, format!("{} must use YYYY-MM-DD", field)));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::invalid_field(field, value, format!("{} is not a valid calendar date", field)))
}

pub fn check_time_field(field: &str, value: &str) -> Result<(), AppError> {
    if !is_time_format(value) {
        return Err(AppError::invalid_field(field, value, format!("{} must use HH:MM", field)));
    }
    Ok(())
}

pub fn parse_uuid_field(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::invalid_field(field, value, format!("{} must be a UUID", field)))
}

/// Comma separated UUID list, as sent in query strings.
pub fn parse_uuid_list(field: &str, value: &str) -> Result<Vec<Uuid>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_uuid_field(field, part))
        .collect()
}

pub fn require_field<'a, T>(field: &str, value: &'a Option<T>) -> Result<&'a T, AppError> {
    value
        .as_ref()
        .ok_or_else(|| AppError::invalid_field(field, "", format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_date_format() {
        assert!(is_date_format("2025-03-10"));
        assert!(!is_date_format("2025-3-10"));
        assert!(!is_date_format("10/03/2025"));
        assert!(!is_date_format("2025-03-10T00:00"));
    }

    #[test]
    fn test_time_format() {
        assert!(is_time_format("08:00"));
        assert!(!is_time_format("8:00"));
        assert!(!is_time_format("08:00:00"));
        assert!(!is_time_format(" 08:00"));
    }

    #[test]
    fn test_parse_date_rejects_impossible_days() {
        assert!(parse_date_field("date", "2025-02-28").is_ok());
        assert_matches!(parse_date_field("date", "2025-02-30"), Err(AppError::Validation { .. }));
        assert_matches!(parse_date_field("date", "tomorrow"), Err(AppError::Validation { .. }));
    }

    #[test]
    fn test_uuid_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(parse_uuid_list("service_ids", &format!("{}, {},", a, b)).unwrap(), vec![a, b]);
        assert_matches!(parse_uuid_list("service_ids", "abc"), Err(AppError::Validation { .. }));
        assert!(parse_uuid_list("service_ids", "").unwrap().is_empty());
    }

    #[test]
    fn test_require_field() {
        let missing: Option<String> = None;
        assert_matches!(require_field("service_id", &missing), Err(AppError::Validation { .. }));
        assert_eq!(require_field("service_id", &Some(3)).unwrap(), &3);
    }
}
