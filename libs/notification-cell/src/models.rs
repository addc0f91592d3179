use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentBooked,
    AppointmentStatusChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(user_id: impl Into<String>, kind: NotificationKind, title: &str, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            kind,
            title: title.to_string(),
            message,
            appointment_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn for_appointment(mut self, appointment_id: Uuid) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingEmail {
    pub recipient: String,
    pub appointment_id: Uuid,
    pub provider_name: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl BookingEmail {
    pub fn subject(&self) -> String {
        format!("Booking confirmed with {}", self.provider_name)
    }

    pub fn body(&self) -> String {
        format!(
            "Your appointment with {} is booked for {} from {} to {}.\nReference: {}",
            self.provider_name, self.date, self.start_time, self.end_time, self.appointment_id
        )
    }
}
