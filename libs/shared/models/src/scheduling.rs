// Persisted marketplace records consumed by the scheduling engine.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub name: String,
    pub timezone: Option<String>,
    /// 0-5, or 0-50 fixed point (tenths) for legacy settings rows.
    #[serde(default)]
    pub rating: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub niche_ids: Vec<Uuid>,
    #[serde(default)]
    pub services: Vec<ProviderService>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProviderProfile {
    pub fn offers(&self, service_id: Uuid) -> Option<&ProviderService> {
        self.services.iter().find(|s| s.service_id == service_id)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderService {
    pub service_id: Uuid,
    pub custom_duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTemplate {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub default_duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub niche_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub provider_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday; `None` for date-specific rules.
    pub day_of_week: Option<i16>,
    pub specific_date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub interval_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAvailabilityRule {
    pub day_of_week: Option<i16>,
    pub specific_date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub interval_minutes: Option<i32>,
}

impl NewAvailabilityRule {
    pub fn into_rule(self, provider_id: Uuid) -> AvailabilityRule {
        AvailabilityRule {
            id: Uuid::new_v4(),
            provider_id,
            day_of_week: self.day_of_week,
            specific_date: self.specific_date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_available: self.is_available,
            interval_minutes: self.interval_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Manual,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockedRange {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
    pub block_type: BlockType,
    pub recurrent_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBlockedRange {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
    pub block_type: BlockType,
    pub recurrent_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
}

impl NewBlockedRange {
    pub fn into_range(self) -> BlockedRange {
        BlockedRange {
            id: Uuid::new_v4(),
            provider_id: self.provider_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            reason: self.reason,
            block_type: self.block_type,
            recurrent_id: self.recurrent_id,
            appointment_id: self.appointment_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Executing,
    Completed,
    #[serde(alias = "cancelled")]
    Canceled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status occupies provider time.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Canceled | AppointmentStatus::NoShow)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Executing => write!(f, "executing"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Canceled => write!(f, "canceled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    #[serde(default)]
    pub additional_service_ids: Vec<Uuid>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn service_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.service_id];
        ids.extend(self.additional_service_ids.iter().copied());
        ids
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub additional_service_ids: Vec<Uuid>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
}

impl NewAppointment {
    pub fn into_appointment(self) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            provider_id: self.provider_id,
            client_id: self.client_id,
            service_id: self.service_id,
            additional_service_ids: self.additional_service_ids,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
            payment_status: self.payment_status,
            created_at: now,
            updated_at: now,
        }
    }
}

fn default_true() -> bool {
    true
}
