use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::error::NotificationError;
use crate::models::BookingEmail;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_booking_confirmation(&self, email: &BookingEmail) -> Result<(), NotificationError>;
}

/// Writes confirmation emails to the log instead of an SMTP relay.
#[derive(Default)]
pub struct LogMailer {
    sent: AtomicUsize,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_booking_confirmation(&self, email: &BookingEmail) -> Result<(), NotificationError> {
        info!(
            recipient = %email.recipient,
            appointment_id = %email.appointment_id,
            "{}: {}",
            email.subject(),
            email.body()
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
