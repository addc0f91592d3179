use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_models::scheduling::ProviderProfile;

use crate::engine::{
    aggregate, busy_intervals, build_day_slots, day_of_week, free_intervals, select_windows,
    AvailabilityWindow, CandidateSlot, DurationBreakdown, Interval,
};
use crate::engine::timezone::parse_timezone;
use crate::error::SchedulingError;

#[derive(Debug, Clone, Default)]
pub struct DayRequest {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub service_ids: Vec<Uuid>,
    /// Used only when no service is requested.
    pub duration_minutes: Option<i32>,
    /// Ignore this appointment (and its reservation) when computing occupancy.
    pub exclude_appointment: Option<Uuid>,
}

/// One provider-day, freshly derived from the store.
#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    #[serde(skip)]
    pub provider: ProviderProfile,
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub timezone: String,
    pub duration: DurationBreakdown,
    pub windows: Vec<AvailabilityWindow>,
    pub busy: Vec<Interval>,
    pub free: Vec<Interval>,
    pub slots: Vec<CandidateSlot>,
}

impl DaySchedule {
    pub fn available_slots(&self) -> impl Iterator<Item = &CandidateSlot> {
        self.slots.iter().filter(|slot| slot.is_available)
    }

    pub fn available_count(&self) -> usize {
        self.available_slots().count()
    }

    pub fn slot_at(&self, start_time: &str) -> Option<&CandidateSlot> {
        self.slots.iter().find(|slot| slot.start_time == start_time)
    }

    /// Free intervals long enough for the requested duration.
    pub fn compatible_free(&self) -> impl Iterator<Item = &Interval> {
        let duration = self.duration.total_minutes;
        self.free.iter().filter(move |f| f.fits(duration))
    }
}

/// Computes candidate slots for a provider on a date.
///
/// Stateless: every call re-reads rules, bookings and blocks from the store.
pub struct SlotEngine {
    config: Arc<AppConfig>,
    store: Arc<dyn SchedulingStore>,
}

impl SlotEngine {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        Self { config, store }
    }

    /// The provider's stored zone, or the configured default when it is missing or unknown.
    pub fn provider_timezone(&self, provider: &ProviderProfile) -> String {
        match provider.timezone.as_deref().map(str::trim).filter(|tz| !tz.is_empty()) {
            Some(tz) if parse_timezone(tz).is_ok() => tz.to_string(),
            Some(tz) => {
                warn!(
                    "Provider {} has unknown timezone {:?}, using {}",
                    provider.id, tz, self.config.default_timezone
                );
                self.config.default_timezone.clone()
            }
            None => self.config.default_timezone.clone(),
        }
    }

    pub async fn load_provider(&self, provider_id: Uuid) -> Result<ProviderProfile, SchedulingError> {
        self.store
            .get_provider(provider_id)
            .await?
            .ok_or(SchedulingError::ProviderNotFound(provider_id))
    }

    pub async fn resolve_duration(
        &self,
        provider: &ProviderProfile,
        service_ids: &[Uuid],
        duration_minutes: Option<i32>,
        daily_limit: Option<i32>,
    ) -> Result<DurationBreakdown, SchedulingError> {
        if service_ids.is_empty() {
            let minutes = duration_minutes.unwrap_or(self.config.default_slot_interval_minutes);
            if minutes < 1 {
                return Err(SchedulingError::InvalidDuration(minutes));
            }
            if let Some(limit) = daily_limit {
                if minutes > limit {
                    return Err(SchedulingError::DurationExceedsDailyLimit {
                        total: minutes,
                        limit,
                        breakdown: vec![],
                    });
                }
            }
            return Ok(DurationBreakdown { total_minutes: minutes, services: vec![] });
        }

        let templates = self.store.get_services(service_ids).await?;
        aggregate(provider, service_ids, &templates, daily_limit)
    }

    pub async fn compute_day(&self, request: &DayRequest) -> Result<DaySchedule, SchedulingError> {
        let provider = self.load_provider(request.provider_id).await?;
        self.compute_day_for(provider, request).await
    }

    /// Same as [`compute_day`](Self::compute_day) for an already loaded provider.
    pub async fn compute_day_for(
        &self,
        provider: ProviderProfile,
        request: &DayRequest,
    ) -> Result<DaySchedule, SchedulingError> {
        let timezone = self.provider_timezone(&provider);
        let weekday = day_of_week(request.date, &timezone)?;

        let duration = self
            .resolve_duration(
                &provider,
                &request.service_ids,
                request.duration_minutes,
                Some(self.config.max_daily_minutes),
            )
            .await?;

        let rules = self.store.availability_rules(provider.id, request.date, weekday).await?;
        let windows = select_windows(
            &rules,
            request.date,
            weekday,
            self.config.default_slot_interval_minutes,
        )?;

        let (appointments, blocks) = if windows.is_empty() {
            (vec![], vec![])
        } else {
            tokio::try_join!(
                self.store.appointments(provider.id, request.date),
                self.store.blocked_ranges(provider.id, request.date),
            )?
        };

        let busy = busy_intervals(&appointments, &blocks, request.exclude_appointment)?;
        let free: Vec<Interval> = windows
            .iter()
            .flat_map(|window| free_intervals(window.range, &busy))
            .collect();
        let slots = build_day_slots(&windows, duration.total_minutes, &busy);

        debug!(
            "Provider {} on {} (weekday {}, {}): {} windows, {} busy, {}/{} slots available",
            provider.id,
            request.date,
            weekday,
            timezone,
            windows.len(),
            busy.len(),
            slots.iter().filter(|s| s.is_available).count(),
            slots.len()
        );

        Ok(DaySchedule {
            provider,
            date: request.date,
            day_of_week: weekday,
            timezone,
            duration,
            windows,
            busy,
            free,
            slots,
        })
    }
}
