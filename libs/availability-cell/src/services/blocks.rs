use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::{Appointment, BlockType, BlockedRange, NewBlockedRange};

use crate::engine::time_codec::to_range;
use crate::error::SchedulingError;

pub const MAX_REPEAT_WEEKS: u32 = 52;

#[derive(Debug, Clone)]
pub struct ManualBlock {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
    /// Extra weekly occurrences after `date`.
    pub repeat_weeks: u32,
}

pub struct BlockService {
    store: Arc<dyn SchedulingStore>,
}

impl BlockService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, block_id: Uuid) -> Result<BlockedRange, SchedulingError> {
        self.store
            .get_blocked_range(block_id)
            .await?
            .ok_or(SchedulingError::BlockNotFound(block_id))
    }

    pub async fn create_manual(&self, block: ManualBlock) -> Result<Vec<BlockedRange>, SchedulingError> {
        let (start, end) = to_range(&block.start_time, &block.end_time)?;
        if start >= end {
            return Err(SchedulingError::InvalidTimeRange {
                start: block.start_time,
                end: block.end_time,
            });
        }
        if block.repeat_weeks > MAX_REPEAT_WEEKS {
            return Err(SchedulingError::InvalidRule(format!(
                "repeat_weeks must be between 0 and {}",
                MAX_REPEAT_WEEKS
            )));
        }
        if self.store.get_provider(block.provider_id).await?.is_none() {
            return Err(SchedulingError::ProviderNotFound(block.provider_id));
        }

        let recurrent_id = (block.repeat_weeks > 0).then(Uuid::new_v4);
        let ranges: Vec<NewBlockedRange> = (0..=block.repeat_weeks)
            .map(|week| NewBlockedRange {
                provider_id: block.provider_id,
                date: block.date + Duration::weeks(week as i64),
                start_time: block.start_time.clone(),
                end_time: block.end_time.clone(),
                reason: block.reason.clone(),
                block_type: BlockType::Manual,
                recurrent_id,
                appointment_id: None,
            })
            .collect();

        let created = self.store.insert_blocked_ranges(ranges).await?;
        info!(
            "Blocked {}-{} for provider {} on {} date(s) from {}",
            block.start_time,
            block.end_time,
            block.provider_id,
            created.len(),
            block.date
        );
        Ok(created)
    }

    /// Removes a manual block, or its whole series when `series` is set.
    pub async fn delete_manual(&self, block: &BlockedRange, series: bool) -> Result<usize, SchedulingError> {
        if block.block_type == BlockType::System {
            return Err(SchedulingError::SystemBlockLocked(block.id));
        }

        let deleted = match (series, block.recurrent_id) {
            (true, Some(recurrent_id)) => self.store.delete_blocked_series(recurrent_id).await?,
            _ => usize::from(self.store.delete_blocked_range(block.id).await?),
        };

        info!("Deleted {} blocked slot(s) for provider {}", deleted, block.provider_id);
        Ok(deleted)
    }

    /// Reserves the appointment's `[start, end)` as a system block.
    pub async fn reserve(&self, appointment: &Appointment) -> Result<BlockedRange, SchedulingError> {
        let range = NewBlockedRange {
            provider_id: appointment.provider_id,
            date: appointment.date,
            start_time: appointment.start_time.clone(),
            end_time: appointment.end_time.clone(),
            reason: Some(format!("appointment {}", appointment.id)),
            block_type: BlockType::System,
            recurrent_id: None,
            appointment_id: Some(appointment.id),
        };

        self.store
            .insert_blocked_ranges(vec![range])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::CorruptRecord("reservation insert returned no row".to_string()))
    }

    pub async fn release(&self, appointment_id: Uuid) -> Result<usize, SchedulingError> {
        let released = self.store.delete_blocked_ranges_for_appointment(appointment_id).await?;
        debug!("Released {} reservation(s) for appointment {}", released, appointment_id);
        Ok(released)
    }
}
