pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::SchedulingStore;

pub use error::{SchedulingError, ServiceDuration};
pub use services::{BlockService, DayRequest, DaySchedule, RuleService, SlotEngine};

/// Shared handler state for every scheduling cell.
#[derive(Clone)]
pub struct SchedulingContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SchedulingStore>,
}

impl SchedulingContext {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        Self { config, store }
    }

    pub fn slot_engine(&self) -> SlotEngine {
        SlotEngine::new(self.config.clone(), self.store.clone())
    }
}
