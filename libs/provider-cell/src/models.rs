use serde::Deserialize;
use uuid::Uuid;

use availability_cell::models::requested_services;
use shared_models::error::AppError;
use shared_utils::validation::{parse_date_field, parse_uuid_field};

use crate::services::geo::Coordinates;
use crate::services::ranking::RankingRequest;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ProviderSearchQuery {
    #[serde(alias = "serviceId")]
    pub service_id: Option<String>,
    #[serde(alias = "serviceIds")]
    pub service_ids: Option<String>,
    #[serde(alias = "categoryId")]
    pub category_id: Option<String>,
    #[serde(alias = "nicheId")]
    pub niche_id: Option<String>,
    pub date: Option<String>,
    #[serde(alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(alias = "longitude", alias = "lon", alias = "lng")]
    pub long: Option<f64>,
    #[serde(alias = "minRating")]
    pub min_rating: Option<f64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn optional_uuid(field: &str, value: Option<&str>) -> Result<Option<Uuid>, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_uuid_field(field, v))
        .transpose()
}

impl ProviderSearchQuery {
    /// Validates inputs; `date` falls back to `default_date` when absent.
    pub fn into_request(
        self,
        default_limit: usize,
        default_date: Option<chrono::NaiveDate>,
    ) -> Result<RankingRequest, AppError> {
        let date = match self.date.as_deref() {
            Some(date) => Some(parse_date_field("date", date)?),
            None => default_date,
        };

        let origin = match (self.lat, self.long) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            (None, None) => None,
            _ => return Err(crate::RankingError::PartialCoordinates.into()),
        };

        Ok(RankingRequest {
            service_ids: requested_services(self.service_id.as_deref(), self.service_ids.as_deref())?,
            category_id: optional_uuid("category_id", self.category_id.as_deref())?,
            niche_id: optional_uuid("niche_id", self.niche_id.as_deref())?,
            date,
            origin,
            min_rating: self.min_rating.unwrap_or(0.0),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0),
        })
    }
}
