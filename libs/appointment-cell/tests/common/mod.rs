#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::{AppointmentState, BookingRequest};
use availability_cell::SchedulingContext;
use notification_cell::{BroadcastNotifier, LogMailer};
use shared_database::InMemoryStore;
use shared_models::scheduling::{AppointmentStatus, ProviderProfile, ServiceTemplate};
use shared_utils::test_utils::{SchedulingFixtures, TestConfig};

pub const MONDAY: i16 = 1;

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<BroadcastNotifier>,
    pub mailer: Arc<LogMailer>,
    pub state: AppointmentState,
    pub provider: ProviderProfile,
    pub consultation: ServiceTemplate,
}

impl Harness {
    /// Provider open 08:00-12:00 on Mondays, offering a 60 minute consultation.
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let consultation = SchedulingFixtures::service("Consultation", 60);
        let mut provider = SchedulingFixtures::provider("Clinica Sol", "America/Sao_Paulo");
        SchedulingFixtures::offering(&mut provider, &consultation, None);

        store.insert_service(consultation.clone()).await;
        store.insert_provider(provider.clone()).await;
        store
            .insert_rule(SchedulingFixtures::weekly_rule(provider.id, MONDAY, "08:00", "12:00", 30))
            .await;

        Self::with_store(store, provider, consultation)
    }

    /// A second process over the same store: shared data, separate locks.
    pub fn sibling(&self) -> AppointmentState {
        Self::with_store(self.store.clone(), self.provider.clone(), self.consultation.clone()).state
    }

    fn with_store(store: Arc<InMemoryStore>, provider: ProviderProfile, consultation: ServiceTemplate) -> Self {
        let notifier = Arc::new(BroadcastNotifier::new());
        let mailer = Arc::new(LogMailer::new());
        let scheduling = SchedulingContext::new(TestConfig::default().to_arc(), store.clone());
        let state = AppointmentState::new(scheduling, notifier.clone(), mailer.clone());

        Self {
            store,
            notifier,
            mailer,
            state,
            provider,
            consultation,
        }
    }

    pub fn request(&self, start: &str, end: Option<&str>) -> BookingRequest {
        BookingRequest {
            provider_id: self.provider.id,
            client_id: Uuid::new_v4(),
            service_ids: vec![self.consultation.id],
            date: monday(),
            start_time: start.to_string(),
            end_time: end.map(String::from),
            status: AppointmentStatus::Pending,
            client_email: None,
        }
    }
}
