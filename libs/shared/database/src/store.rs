use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityRule, BlockedRange, Category, NewAppointment,
    NewAvailabilityRule, NewBlockedRange, ProviderProfile, ServiceTemplate,
};

use crate::error::StoreError;

/// Persistence collaborator for the scheduling engine.
///
/// Every read is re-issued per request; implementations hold no scheduling
/// state beyond what they persist.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>, StoreError>;

    /// Active providers, the candidate set for search and ranking.
    async fn list_providers(&self) -> Result<Vec<ProviderProfile>, StoreError>;

    async fn get_services(&self, service_ids: &[Uuid]) -> Result<Vec<ServiceTemplate>, StoreError>;

    async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, StoreError>;

    /// Weekly rules for `day_of_week` plus date-specific rules for `date`.
    async fn availability_rules(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityRule>, StoreError>;

    async fn list_availability_rules(&self, provider_id: Uuid) -> Result<Vec<AvailabilityRule>, StoreError>;

    /// Replaces the provider's whole rule set in one atomic step.
    async fn replace_availability_rules(
        &self,
        provider_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>, StoreError>;

    async fn blocked_ranges(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<BlockedRange>, StoreError>;

    async fn get_blocked_range(&self, block_id: Uuid) -> Result<Option<BlockedRange>, StoreError>;

    async fn insert_blocked_ranges(&self, ranges: Vec<NewBlockedRange>) -> Result<Vec<BlockedRange>, StoreError>;

    async fn delete_blocked_range(&self, block_id: Uuid) -> Result<bool, StoreError>;

    async fn delete_blocked_series(&self, recurrent_id: Uuid) -> Result<usize, StoreError>;

    async fn delete_blocked_ranges_for_appointment(&self, appointment_id: Uuid) -> Result<usize, StoreError>;

    async fn appointments(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, StoreError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Fails with `UniqueViolation` when an active appointment already holds
    /// the same `(provider_id, date, start_time)`.
    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;
}
