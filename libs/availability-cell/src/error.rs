use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

/// Resolved duration of one requested service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDuration {
    pub service_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
}

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Invalid time format: {0} (expected HH:MM)")]
    InvalidTimeFormat(String),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Invalid availability rule: {0}")]
    InvalidRule(String),

    #[error("Duration must be at least one minute, got {0}")]
    InvalidDuration(i32),

    #[error("Provider {0} not found")]
    ProviderNotFound(Uuid),

    #[error("Service {0} not found")]
    ServiceNotFound(Uuid),

    #[error("Provider does not offer service {0}")]
    ServiceNotOffered(Uuid),

    #[error("Combined duration of {total} minutes exceeds the daily maximum of {limit} minutes")]
    DurationExceedsDailyLimit {
        total: i32,
        limit: i32,
        breakdown: Vec<ServiceDuration>,
    },

    #[error("Blocked slot {0} not found")]
    BlockNotFound(Uuid),

    #[error("Blocked slot {0} belongs to an appointment; cancel the appointment instead")]
    SystemBlockLocked(Uuid),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        let message = err.to_string();
        match err {
            SchedulingError::InvalidTimeFormat(value) => AppError::invalid_field("time", &value, message),
            SchedulingError::InvalidDate(value) => AppError::invalid_field("date", &value, message),
            SchedulingError::InvalidTimezone(value) => AppError::invalid_field("timezone", &value, message),
            SchedulingError::InvalidTimeRange { start, end } => AppError::Validation {
                message,
                details: Some(json!({ "field": "end_time", "start_time": start, "end_time": end })),
            },
            SchedulingError::InvalidRule(_) => AppError::validation(message),
            SchedulingError::InvalidDuration(value) => {
                AppError::invalid_field("duration", &value.to_string(), message)
            }
            SchedulingError::DurationExceedsDailyLimit { total, limit, breakdown } => AppError::Validation {
                message,
                details: Some(json!({
                    "field": "service_ids",
                    "total_minutes": total,
                    "limit_minutes": limit,
                    "services": breakdown,
                })),
            },
            SchedulingError::ServiceNotOffered(service_id) => {
                AppError::invalid_field("service_id", &service_id.to_string(), message)
            }
            SchedulingError::ProviderNotFound(_)
            | SchedulingError::ServiceNotFound(_)
            | SchedulingError::BlockNotFound(_) => AppError::NotFound(message),
            SchedulingError::SystemBlockLocked(_) => AppError::conflict(message),
            SchedulingError::CorruptRecord(_) => AppError::Internal(message),
            SchedulingError::Store(store) => store.into(),
        }
    }
}
