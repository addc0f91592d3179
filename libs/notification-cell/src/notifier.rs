use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::error::NotificationError;
use crate::models::NotificationEvent;

pub type NotificationReceiver = broadcast::Receiver<NotificationEvent>;

const CHANNEL_CAPACITY: usize = 64;

/// Pub/sub capability the booking flow depends on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Subscribes a live connection for `user_id`.
    async fn register(&self, user_id: &str) -> NotificationReceiver;

    /// Returns how many live connections received the event.
    async fn publish(&self, event: NotificationEvent) -> Result<usize, NotificationError>;
}

/// In-process notifier with one broadcast channel per user.
#[derive(Default)]
pub struct BroadcastNotifier {
    channels: RwLock<HashMap<String, broadcast::Sender<NotificationEvent>>>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_users(&self) -> Vec<String> {
        self.channels
            .read()
            .await
            .iter()
            .filter(|(_, sender)| sender.receiver_count() > 0)
            .map(|(user_id, _)| user_id.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn register(&self, user_id: &str) -> NotificationReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);

        debug!("Registered notification receiver for user {}", user_id);
        sender.subscribe()
    }

    async fn publish(&self, event: NotificationEvent) -> Result<usize, NotificationError> {
        let user_id = event.user_id.clone();
        let mut channels = self.channels.write().await;

        let Some(sender) = channels.get(&user_id) else {
            debug!("No live connection for user {}, dropping {:?}", user_id, event.kind);
            return Ok(0);
        };

        match sender.send(event) {
            Ok(delivered) => Ok(delivered),
            Err(_) => {
                // Every receiver is gone.
                channels.remove(&user_id);
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use assert_matches::assert_matches;

    fn event(user_id: &str) -> NotificationEvent {
        NotificationEvent::new(user_id, NotificationKind::AppointmentBooked, "New booking", "09:00".to_string())
    }

    #[tokio::test]
    async fn test_publish_reaches_every_connection_of_the_user() {
        let notifier = BroadcastNotifier::new();
        let mut phone = notifier.register("provider-1").await;
        let mut browser = notifier.register("provider-1").await;
        let mut other = notifier.register("provider-2").await;

        assert_eq!(notifier.publish(event("provider-1")).await.unwrap(), 2);

        assert_eq!(phone.recv().await.unwrap().user_id, "provider-1");
        assert_eq!(browser.recv().await.unwrap().title, "New booking");
        assert_matches!(other.try_recv(), Err(broadcast::error::TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_publish_without_connections_is_not_an_error() {
        let notifier = BroadcastNotifier::new();
        assert_eq!(notifier.publish(event("nobody")).await.unwrap(), 0);

        let receiver = notifier.register("gone").await;
        drop(receiver);
        assert_eq!(notifier.publish(event("gone")).await.unwrap(), 0);
        assert!(notifier.active_users().await.is_empty());
    }
}
