use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::scheduling::{AvailabilityRule, BlockedRange, NewAvailabilityRule};
use shared_utils::validation::{check_time_field, parse_date_field, parse_uuid_field, parse_uuid_list};

use crate::engine::{CandidateSlot, ScoredSlot};
use crate::error::ServiceDuration;

// Query parameters for the slot listings
#[derive(Debug, Deserialize)]
pub struct TimeSlotsQuery {
    pub date: String,
    #[serde(alias = "serviceId")]
    pub service_id: Option<String>,
    /// Comma separated, for multi-service bookings.
    #[serde(alias = "serviceIds")]
    pub service_ids: Option<String>,
    #[serde(alias = "durationMinutes", alias = "duration_minutes")]
    pub duration: Option<i32>,
}

impl TimeSlotsQuery {
    pub fn requested_services(&self) -> Result<Vec<Uuid>, AppError> {
        requested_services(self.service_id.as_deref(), self.service_ids.as_deref())
    }
}

/// `service_id` first, then any `service_ids` not already present.
pub fn requested_services(single: Option<&str>, many: Option<&str>) -> Result<Vec<Uuid>, AppError> {
    let mut ids = Vec::new();
    if let Some(id) = single.filter(|s| !s.trim().is_empty()) {
        ids.push(parse_uuid_field("service_id", id)?);
    }
    if let Some(list) = many {
        for id in parse_uuid_list("service_ids", list)? {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

#[derive(Debug, Serialize)]
pub struct TimeSlotsResponse {
    pub provider_id: Uuid,
    pub date: String,
    pub day_of_week: u8,
    pub timezone: String,
    pub service_duration: i32,
    pub services: Vec<ServiceDuration>,
    pub slots: Vec<CandidateSlot>,
    pub total: usize,
    pub available: usize,
}

#[derive(Debug, Serialize)]
pub struct SmartSlotsResponse {
    pub provider_id: Uuid,
    pub date: String,
    pub service_duration: i32,
    pub slots: Vec<ScoredSlot>,
    /// `"scored"` when the fragmentation pass ran, `"computed"` otherwise.
    pub source: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct HeldSlot {
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotCheckRequest {
    pub date: String,
    #[serde(alias = "serviceId")]
    pub service_id: Option<String>,
    #[serde(default, alias = "serviceIds")]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub slots: Vec<HeldSlot>,
}

impl SlotCheckRequest {
    pub fn requested_services(&self) -> Result<Vec<Uuid>, AppError> {
        let joined = self.service_ids.join(",");
        requested_services(self.service_id.as_deref(), Some(joined.as_str()))
    }
}

#[derive(Debug, Serialize)]
pub struct SlotCheckResponse {
    pub date: String,
    pub available_slots: Vec<CandidateSlot>,
    pub requested_count: usize,
    pub available_count: usize,
    pub unavailable_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RuleInput {
    #[serde(alias = "dayOfWeek")]
    pub day_of_week: Option<i16>,
    #[serde(alias = "specificDate")]
    pub specific_date: Option<String>,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    #[serde(alias = "isAvailable")]
    pub is_available: Option<bool>,
    #[serde(alias = "intervalMinutes")]
    pub interval_minutes: Option<i32>,
}

impl RuleInput {
    pub fn into_new_rule(self) -> Result<NewAvailabilityRule, AppError> {
        check_time_field("start_time", &self.start_time)?;
        check_time_field("end_time", &self.end_time)?;
        let specific_date = self
            .specific_date
            .as_deref()
            .map(|date| parse_date_field("specific_date", date))
            .transpose()?;

        Ok(NewAvailabilityRule {
            day_of_week: self.day_of_week,
            specific_date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_available: self.is_available.unwrap_or(true),
            interval_minutes: self.interval_minutes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchAvailabilityRequest {
    #[serde(alias = "providerId")]
    pub provider_id: Option<String>,
    pub rules: Vec<RuleInput>,
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub provider_id: Uuid,
    pub rules: Vec<AvailabilityRule>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    #[serde(alias = "providerId")]
    pub provider_id: Option<String>,
    pub date: String,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    pub reason: Option<String>,
    #[serde(default, alias = "repeatWeeks")]
    pub repeat_weeks: u32,
}

#[derive(Debug, Serialize)]
pub struct BlocksResponse {
    pub blocked_slots: Vec<BlockedRange>,
    pub recurrent_id: Option<Uuid>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteBlockQuery {
    #[serde(default)]
    pub series: bool,
}
