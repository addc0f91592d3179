use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use availability_cell::SchedulingError;
use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::scheduling::AppointmentStatus;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("No slot starts at {start_time} on {date}")]
    SlotNotFound { date: String, start_time: String },

    #[error("Slot {start_time} is no longer available")]
    SlotNoLongerAvailable { start_time: String },

    #[error("End time {requested} does not match the service duration; the slot is {start_time}-{expected}")]
    EndTimeMismatch {
        start_time: String,
        requested: String,
        expected: String,
    },

    #[error("At least one service_id is required")]
    MissingService,

    #[error("Appointments can only be created as pending or confirmed, not {0}")]
    InvalidInitialStatus(AppointmentStatus),

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("Appointment {0} not found")]
    AppointmentNotFound(Uuid),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::SlotNotFound { start_time, .. } => {
                AppError::invalid_field("start_time", &start_time, message)
            }
            BookingError::SlotNoLongerAvailable { start_time } => AppError::Conflict {
                message,
                details: Some(json!({ "reason": "slot_no_longer_available", "start_time": start_time })),
            },
            BookingError::EndTimeMismatch { start_time, requested, expected } => AppError::Conflict {
                message,
                details: Some(json!({
                    "reason": "end_time_mismatch",
                    "requested_end_time": requested,
                    "start_time": start_time,
                    "end_time": expected,
                })),
            },
            BookingError::MissingService => AppError::invalid_field("service_id", "", message),
            BookingError::InvalidInitialStatus(status) => {
                AppError::invalid_field("status", &status.to_string(), message)
            }
            BookingError::InvalidStatusTransition { .. } => AppError::conflict(message),
            BookingError::AppointmentNotFound(_) => AppError::NotFound(message),
            BookingError::Forbidden(reason) => AppError::Forbidden(reason),
            BookingError::Scheduling(inner) => inner.into(),
            BookingError::Store(inner) => inner.into(),
        }
    }
}
