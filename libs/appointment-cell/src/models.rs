use serde::{Deserialize, Serialize};
use uuid::Uuid;

use availability_cell::engine::CandidateSlot;
use shared_models::scheduling::{Appointment, AppointmentStatus, BlockedRange};

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(alias = "providerId")]
    pub provider_id: String,
    /// Defaults to the caller.
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(alias = "serviceId")]
    pub service_id: Option<String>,
    #[serde(default, alias = "serviceIds", alias = "additionalServiceIds")]
    pub service_ids: Vec<String>,
    pub date: String,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: Option<String>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Serialize)]
pub struct CreateAppointmentResponse {
    pub appointment: Appointment,
    pub blocked_slots: Vec<CandidateSlot>,
    pub reservation: Option<BlockedRange>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub appointment: Appointment,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self { appointment }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub appointment_id: Uuid,
    pub status: AppointmentStatus,
    pub appointment: Appointment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_accepts_camel_case() {
        let request: CreateAppointmentRequest = serde_json::from_value(json!({
            "providerId": "a0f1c6a8-50f4-4f0c-9a53-7a4b1bb3a001",
            "serviceId": "a0f1c6a8-50f4-4f0c-9a53-7a4b1bb3a002",
            "date": "2025-03-10",
            "startTime": "09:00",
            "endTime": "10:00"
        }))
        .unwrap();

        assert_eq!(request.start_time, "09:00");
        assert_eq!(request.end_time.as_deref(), Some("10:00"));
        assert!(request.client_id.is_none());
        assert!(request.service_ids.is_empty());
        assert!(request.status.is_none());
    }
}
