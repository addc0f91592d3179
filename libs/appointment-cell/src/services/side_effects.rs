use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use notification_cell::{BookingEmail, Mailer, NotificationEvent, Notifier};

/// Fire-and-forget delivery, detached from the request that produced it.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
    events: Vec<NotificationEvent>,
    email: Option<BookingEmail>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for event in events {
            let user_id = event.user_id.clone();
            match notifier.publish(event).await {
                Ok(delivered) => debug!("Notification for {} reached {} connection(s)", user_id, delivered),
                Err(e) => warn!("Notification for {} failed: {}", user_id, e),
            }
        }

        if let Some(email) = email {
            if let Err(e) = mailer.send_booking_confirmation(&email).await {
                warn!("Confirmation email for appointment {} failed: {}", email.appointment_id, e);
            }
        }
    })
}
