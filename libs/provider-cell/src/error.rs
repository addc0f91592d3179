use thiserror::Error;
use uuid::Uuid;

use availability_cell::SchedulingError;
use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("Coordinates out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Both latitude and longitude are required for distance ranking")]
    PartialCoordinates,

    #[error("min_rating must be between 0 and 5, got {0}")]
    InvalidMinRating(f64),

    #[error("Category {0} not found")]
    CategoryNotFound(Uuid),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RankingError> for AppError {
    fn from(err: RankingError) -> Self {
        let message = err.to_string();
        match err {
            RankingError::InvalidCoordinates { latitude, longitude } => {
                AppError::invalid_field("coordinates", &format!("{},{}", latitude, longitude), message)
            }
            RankingError::PartialCoordinates => AppError::invalid_field("coordinates", "", message),
            RankingError::InvalidMinRating(value) => AppError::invalid_field("min_rating", &value.to_string(), message),
            RankingError::CategoryNotFound(_) => AppError::NotFound(message),
            RankingError::Scheduling(inner) => inner.into(),
            RankingError::Store(inner) => inner.into(),
        }
    }
}
