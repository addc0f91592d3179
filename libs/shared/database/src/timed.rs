use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityRule, BlockedRange, Category, NewAppointment,
    NewAvailabilityRule, NewBlockedRange, ProviderProfile, ServiceTemplate,
};

use crate::error::StoreError;
use crate::store::SchedulingStore;

/// Bounds every persistence call with a deadline.
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: SchedulingStore> TimedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn guard<T, F>(&self, op: &str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Store call {} exceeded {:?}", op, self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: SchedulingStore> SchedulingStore for TimedStore<S> {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>, StoreError> {
        self.guard("get_provider", self.inner.get_provider(provider_id)).await
    }

    async fn list_providers(&self) -> Result<Vec<ProviderProfile>, StoreError> {
        self.guard("list_providers", self.inner.list_providers()).await
    }

    async fn get_services(&self, service_ids: &[Uuid]) -> Result<Vec<ServiceTemplate>, StoreError> {
        self.guard("get_services", self.inner.get_services(service_ids)).await
    }

    async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, StoreError> {
        self.guard("get_category", self.inner.get_category(category_id)).await
    }

    async fn availability_rules(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        self.guard(
            "availability_rules",
            self.inner.availability_rules(provider_id, date, day_of_week),
        )
        .await
    }

    async fn list_availability_rules(&self, provider_id: Uuid) -> Result<Vec<AvailabilityRule>, StoreError> {
        self.guard("list_availability_rules", self.inner.list_availability_rules(provider_id))
            .await
    }

    async fn replace_availability_rules(
        &self,
        provider_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        self.guard(
            "replace_availability_rules",
            self.inner.replace_availability_rules(provider_id, rules),
        )
        .await
    }

    async fn blocked_ranges(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<BlockedRange>, StoreError> {
        self.guard("blocked_ranges", self.inner.blocked_ranges(provider_id, date)).await
    }

    async fn get_blocked_range(&self, block_id: Uuid) -> Result<Option<BlockedRange>, StoreError> {
        self.guard("get_blocked_range", self.inner.get_blocked_range(block_id)).await
    }

    async fn insert_blocked_ranges(&self, ranges: Vec<NewBlockedRange>) -> Result<Vec<BlockedRange>, StoreError> {
        self.guard("insert_blocked_ranges", self.inner.insert_blocked_ranges(ranges)).await
    }

    async fn delete_blocked_range(&self, block_id: Uuid) -> Result<bool, StoreError> {
        self.guard("delete_blocked_range", self.inner.delete_blocked_range(block_id)).await
    }

    async fn delete_blocked_series(&self, recurrent_id: Uuid) -> Result<usize, StoreError> {
        self.guard("delete_blocked_series", self.inner.delete_blocked_series(recurrent_id)).await
    }

    async fn delete_blocked_ranges_for_appointment(&self, appointment_id: Uuid) -> Result<usize, StoreError> {
        self.guard(
            "delete_blocked_ranges_for_appointment",
            self.inner.delete_blocked_ranges_for_appointment(appointment_id),
        )
        .await
    }

    async fn appointments(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, StoreError> {
        self.guard("appointments", self.inner.appointments(provider_id, date)).await
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.guard("get_appointment", self.inner.get_appointment(appointment_id)).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        self.guard("insert_appointment", self.inner.insert_appointment(appointment)).await
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        self.guard(
            "update_appointment_status",
            self.inner.update_appointment_status(appointment_id, status),
        )
        .await
    }
}
