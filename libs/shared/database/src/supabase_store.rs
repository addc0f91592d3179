use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityRule, BlockedRange, Category, NewAppointment,
    NewAvailabilityRule, NewBlockedRange, ProviderProfile, ServiceTemplate,
};

use crate::error::StoreError;
use crate::store::SchedulingStore;
use crate::supabase::{representation_headers, SupabaseClient};

const PROVIDER_SELECT: &str = "select=*,services:provider_services(service_id,custom_duration_minutes)";

/// PostgREST-backed store.
///
/// Expects a partial unique index on `appointments (provider_id, date, start_time)`
/// for active statuses, and the `replace_availability_rules` RPC that swaps a
/// provider's rules inside one transaction.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch<T>(&self, path: &str) -> Result<Vec<T>, StoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.supabase.request::<Vec<T>>(Method::GET, path, None, None).await
    }

    async fn delete_where(&self, filter: &str) -> Result<usize, StoreError> {
        let path = format!("/rest/v1/blocked_slots?{}", filter);
        let deleted: Vec<BlockedRange> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, None, Some(representation_headers()))
            .await?;
        Ok(deleted.len())
    }
}

#[async_trait]
impl SchedulingStore for SupabaseStore {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>, StoreError> {
        let path = format!("/rest/v1/providers?id=eq.{}&{}", provider_id, PROVIDER_SELECT);
        Ok(self.fetch::<ProviderProfile>(&path).await?.into_iter().next())
    }

    async fn list_providers(&self) -> Result<Vec<ProviderProfile>, StoreError> {
        let path = format!("/rest/v1/providers?is_active=eq.true&{}&order=name.asc", PROVIDER_SELECT);
        self.fetch(&path).await
    }

    async fn get_services(&self, service_ids: &[Uuid]) -> Result<Vec<ServiceTemplate>, StoreError> {
        if service_ids.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = service_ids.iter().map(Uuid::to_string).collect();
        let path = format!("/rest/v1/services?id=in.({})", ids.join(","));
        self.fetch(&path).await
    }

    async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, StoreError> {
        let path = format!("/rest/v1/categories?id=eq.{}", category_id);
        Ok(self.fetch::<Category>(&path).await?.into_iter().next())
    }

    async fn availability_rules(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let path = format!(
            "/rest/v1/availability_rules?provider_id=eq.{}&or=(and(day_of_week.eq.{},specific_date.is.null),specific_date.eq.{})&order=start_time.asc",
            provider_id, day_of_week, date
        );
        self.fetch(&path).await
    }

    async fn list_availability_rules(&self, provider_id: Uuid) -> Result<Vec<AvailabilityRule>, StoreError> {
        let path = format!(
            "/rest/v1/availability_rules?provider_id=eq.{}&order=day_of_week.asc,start_time.asc",
            provider_id
        );
        self.fetch(&path).await
    }

    async fn replace_availability_rules(
        &self,
        provider_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        debug!("Replacing availability rules for provider {}", provider_id);

        let body = json!({
            "p_provider_id": provider_id,
            "p_rules": rules,
        });

        self.supabase
            .request(Method::POST, "/rest/v1/rpc/replace_availability_rules", None, Some(body))
            .await
    }

    async fn blocked_ranges(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<BlockedRange>, StoreError> {
        let path = format!(
            "/rest/v1/blocked_slots?provider_id=eq.{}&date=eq.{}&order=start_time.asc",
            provider_id, date
        );
        self.fetch(&path).await
    }

    async fn get_blocked_range(&self, block_id: Uuid) -> Result<Option<BlockedRange>, StoreError> {
        let path = format!("/rest/v1/blocked_slots?id=eq.{}", block_id);
        Ok(self.fetch::<BlockedRange>(&path).await?.into_iter().next())
    }

    async fn insert_blocked_ranges(&self, ranges: Vec<NewBlockedRange>) -> Result<Vec<BlockedRange>, StoreError> {
        if ranges.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<BlockedRange> = ranges.into_iter().map(NewBlockedRange::into_range).collect();
        self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/blocked_slots",
                None,
                Some(serde_json::to_value(&rows)?),
                Some(representation_headers()),
            )
            .await
    }

    async fn delete_blocked_range(&self, block_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.delete_where(&format!("id=eq.{}", block_id)).await? > 0)
    }

    async fn delete_blocked_series(&self, recurrent_id: Uuid) -> Result<usize, StoreError> {
        self.delete_where(&format!("recurrent_id=eq.{}", recurrent_id)).await
    }

    async fn delete_blocked_ranges_for_appointment(&self, appointment_id: Uuid) -> Result<usize, StoreError> {
        self.delete_where(&format!("appointment_id=eq.{}", appointment_id)).await
    }

    async fn appointments(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&date=eq.{}&order=start_time.asc",
            provider_id, date
        );
        self.fetch(&path).await
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        Ok(self.fetch::<Appointment>(&path).await?.into_iter().next())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let row = appointment.into_appointment();

        let created: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                None,
                Some(serde_json::to_value(&row)?),
                Some(representation_headers()),
            )
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Api {
                status: 500,
                message: "insert returned no representation".to_string(),
            })
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let body = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let updated: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, None, Some(body), Some(representation_headers()))
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("appointment {}", appointment_id)))
    }
}
