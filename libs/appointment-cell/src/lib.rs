pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use availability_cell::SchedulingContext;
use notification_cell::{Mailer, Notifier};

pub use error::BookingError;
pub use services::booking::{BookingOutcome, BookingRequest, BookingService};
pub use services::lifecycle::LifecycleService;
pub use services::locks::ProviderLocks;

/// Handler state: scheduling context plus the booking collaborators.
#[derive(Clone)]
pub struct AppointmentState {
    pub scheduling: SchedulingContext,
    pub locks: Arc<ProviderLocks>,
    pub notifier: Arc<dyn Notifier>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppointmentState {
    pub fn new(scheduling: SchedulingContext, notifier: Arc<dyn Notifier>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            scheduling,
            locks: Arc::new(ProviderLocks::new()),
            notifier,
            mailer,
        }
    }

    pub fn booking(&self) -> BookingService {
        BookingService::new(self)
    }

    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self)
    }
}
