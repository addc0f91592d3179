use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityRule, BlockedRange, Category, NewAppointment,
    NewAvailabilityRule, NewBlockedRange, ProviderProfile, ServiceTemplate,
};

use crate::error::StoreError;
use crate::store::SchedulingStore;

/// Seed data for fixture mode, usually loaded from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub providers: Vec<ProviderProfile>,
    #[serde(default)]
    pub services: Vec<ServiceTemplate>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub availability_rules: Vec<AvailabilityRule>,
    #[serde(default)]
    pub blocked_ranges: Vec<BlockedRange>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

#[derive(Default)]
struct Tables {
    providers: HashMap<Uuid, ProviderProfile>,
    services: HashMap<Uuid, ServiceTemplate>,
    categories: HashMap<Uuid, Category>,
    rules: Vec<AvailabilityRule>,
    blocks: Vec<BlockedRange>,
    appointments: Vec<Appointment>,
}

impl Tables {
    fn holds_active_start(&self, provider_id: Uuid, date: NaiveDate, start_time: &str, exclude: Option<Uuid>) -> bool {
        self.appointments.iter().any(|apt| {
            Some(apt.id) != exclude
                && apt.provider_id == provider_id
                && apt.date == date
                && apt.start_time == start_time
                && apt.status.is_active()
        })
    }
}

/// `RwLock`-guarded tables; used for fixture mode and tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(data: FixtureData) -> Self {
        let tables = Tables {
            providers: data.providers.into_iter().map(|p| (p.id, p)).collect(),
            services: data.services.into_iter().map(|s| (s.id, s)).collect(),
            categories: data.categories.into_iter().map(|c| (c.id, c)).collect(),
            rules: data.availability_rules,
            blocks: data.blocked_ranges,
            appointments: data.appointments,
        };

        Self {
            tables: RwLock::new(tables),
        }
    }

    pub async fn insert_provider(&self, provider: ProviderProfile) {
        self.tables.write().await.providers.insert(provider.id, provider);
    }

    pub async fn insert_service(&self, service: ServiceTemplate) {
        self.tables.write().await.services.insert(service.id, service);
    }

    pub async fn insert_category(&self, category: Category) {
        self.tables.write().await.categories.insert(category.id, category);
    }

    pub async fn insert_rule(&self, rule: AvailabilityRule) {
        self.tables.write().await.rules.push(rule);
    }

    /// Seeds an appointment as-is, bypassing the unique start check.
    pub async fn seed_appointment(&self, appointment: Appointment) {
        self.tables.write().await.appointments.push(appointment);
    }

    pub async fn appointment_count(&self) -> usize {
        self.tables.read().await.appointments.len()
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderProfile>, StoreError> {
        Ok(self.tables.read().await.providers.get(&provider_id).cloned())
    }

    async fn list_providers(&self) -> Result<Vec<ProviderProfile>, StoreError> {
        let tables = self.tables.read().await;
        let mut providers: Vec<ProviderProfile> =
            tables.providers.values().filter(|p| p.is_active).cloned().collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(providers)
    }

    async fn get_services(&self, service_ids: &[Uuid]) -> Result<Vec<ServiceTemplate>, StoreError> {
        let tables = self.tables.read().await;
        Ok(service_ids
            .iter()
            .filter_map(|id| tables.services.get(id).cloned())
            .collect())
    }

    async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, StoreError> {
        Ok(self.tables.read().await.categories.get(&category_id).cloned())
    }

    async fn availability_rules(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rules
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .filter(|r| {
                r.specific_date == Some(date)
                    || (r.specific_date.is_none() && r.day_of_week == Some(day_of_week as i16))
            })
            .cloned()
            .collect())
    }

    async fn list_availability_rules(&self, provider_id: Uuid) -> Result<Vec<AvailabilityRule>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rules
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn replace_availability_rules(
        &self,
        provider_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        // Single write guard: readers never observe the empty intermediate state.
        let mut tables = self.tables.write().await;
        tables.rules.retain(|r| r.provider_id != provider_id);

        let created: Vec<AvailabilityRule> = rules.into_iter().map(|r| r.into_rule(provider_id)).collect();
        tables.rules.extend(created.iter().cloned());

        debug!("Replaced availability for provider {} with {} rules", provider_id, created.len());
        Ok(created)
    }

    async fn blocked_ranges(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<BlockedRange>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .blocks
            .iter()
            .filter(|b| b.provider_id == provider_id && b.date == date)
            .cloned()
            .collect())
    }

    async fn get_blocked_range(&self, block_id: Uuid) -> Result<Option<BlockedRange>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.blocks.iter().find(|b| b.id == block_id).cloned())
    }

    async fn insert_blocked_ranges(&self, ranges: Vec<NewBlockedRange>) -> Result<Vec<BlockedRange>, StoreError> {
        let mut tables = self.tables.write().await;
        let created: Vec<BlockedRange> = ranges.into_iter().map(NewBlockedRange::into_range).collect();
        tables.blocks.extend(created.iter().cloned());
        Ok(created)
    }

    async fn delete_blocked_range(&self, block_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.blocks.len();
        tables.blocks.retain(|b| b.id != block_id);
        Ok(tables.blocks.len() < before)
    }

    async fn delete_blocked_series(&self, recurrent_id: Uuid) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.blocks.len();
        tables.blocks.retain(|b| b.recurrent_id != Some(recurrent_id));
        Ok(before - tables.blocks.len())
    }

    async fn delete_blocked_ranges_for_appointment(&self, appointment_id: Uuid) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.blocks.len();
        tables.blocks.retain(|b| b.appointment_id != Some(appointment_id));
        Ok(before - tables.blocks.len())
    }

    async fn appointments(&self, provider_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .iter()
            .filter(|a| a.provider_id == provider_id && a.date == date)
            .cloned()
            .collect())
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.iter().find(|a| a.id == appointment_id).cloned())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;

        if appointment.status.is_active()
            && tables.holds_active_start(appointment.provider_id, appointment.date, &appointment.start_time, None)
        {
            return Err(StoreError::UniqueViolation(format!(
                "provider {} already has an active appointment on {} at {}",
                appointment.provider_id, appointment.date, appointment.start_time
            )));
        }

        let created = appointment.into_appointment();
        tables.appointments.push(created.clone());
        Ok(created)
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;

        let (provider_id, date, start_time) = match tables.appointments.iter().find(|a| a.id == appointment_id) {
            Some(apt) => (apt.provider_id, apt.date, apt.start_time.clone()),
            None => return Err(StoreError::NotFound(format!("appointment {}", appointment_id))),
        };

        if status.is_active() && tables.holds_active_start(provider_id, date, &start_time, Some(appointment_id)) {
            return Err(StoreError::UniqueViolation(format!(
                "provider {} already has an active appointment on {} at {}",
                provider_id, date, start_time
            )));
        }

        let apt = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| StoreError::NotFound(format!("appointment {}", appointment_id)))?;
        apt.status = status;
        apt.updated_at = Utc::now();
        Ok(apt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::scheduling::PaymentStatus;

    fn booking(provider_id: Uuid, start: &str) -> NewAppointment {
        NewAppointment {
            provider_id,
            client_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            additional_service_ids: vec![],
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: start.to_string(),
            end_time: "10:00".to_string(),
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_unique_active_start_is_enforced() {
        let store = InMemoryStore::new();
        let provider_id = Uuid::new_v4();

        let first = store.insert_appointment(booking(provider_id, "09:30")).await.unwrap();
        let second = store.insert_appointment(booking(provider_id, "09:30")).await;
        assert_matches!(second, Err(StoreError::UniqueViolation(_)));

        // Once the first is canceled the start is free again.
        store.update_appointment_status(first.id, AppointmentStatus::Canceled).await.unwrap();
        store.insert_appointment(booking(provider_id, "09:30")).await.unwrap();

        // And the canceled one can no longer be reactivated onto it.
        let reactivate = store.update_appointment_status(first.id, AppointmentStatus::Pending).await;
        assert_matches!(reactivate, Err(StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_replace_rules_only_touches_one_provider() {
        let store = InMemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rule = NewAvailabilityRule {
            day_of_week: Some(1),
            specific_date: None,
            start_time: "08:00".to_string(),
            end_time: "12:00".to_string(),
            is_available: true,
            interval_minutes: Some(30),
        };

        store.replace_availability_rules(a, vec![rule.clone(), rule.clone()]).await.unwrap();
        store.replace_availability_rules(b, vec![rule.clone()]).await.unwrap();
        store.replace_availability_rules(a, vec![rule]).await.unwrap();

        assert_eq!(store.list_availability_rules(a).await.unwrap().len(), 1);
        assert_eq!(store.list_availability_rules(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rules_for_day_include_specific_dates() {
        let store = InMemoryStore::new();
        let provider_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        store
            .replace_availability_rules(
                provider_id,
                vec![
                    NewAvailabilityRule {
                        day_of_week: Some(1),
                        specific_date: None,
                        start_time: "08:00".to_string(),
                        end_time: "12:00".to_string(),
                        is_available: true,
                        interval_minutes: None,
                    },
                    NewAvailabilityRule {
                        day_of_week: None,
                        specific_date: Some(date),
                        start_time: "14:00".to_string(),
                        end_time: "16:00".to_string(),
                        is_available: true,
                        interval_minutes: None,
                    },
                    NewAvailabilityRule {
                        day_of_week: Some(2),
                        specific_date: None,
                        start_time: "08:00".to_string(),
                        end_time: "12:00".to_string(),
                        is_available: true,
                        interval_minutes: None,
                    },
                ],
            )
            .await
            .unwrap();

        let rules = store.availability_rules(provider_id, date, 1).await.unwrap();
        assert_eq!(rules.len(), 2);
    }

    #[tokio::test]
    async fn test_demo_fixture_loads() {
        let data: FixtureData = serde_json::from_str(include_str!("../../../../fixtures/demo.json")).unwrap();
        let store = InMemoryStore::from_fixture(data);

        let providers = store.list_providers().await.unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].name, "Barbearia Central");
        assert_eq!(store.list_availability_rules(providers[0].id).await.unwrap().len(), 2);
    }
}
