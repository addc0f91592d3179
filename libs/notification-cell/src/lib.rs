pub mod error;
pub mod mailer;
pub mod models;
pub mod notifier;

pub use error::NotificationError;
pub use mailer::{LogMailer, Mailer};
pub use models::{BookingEmail, NotificationEvent, NotificationKind};
pub use notifier::{BroadcastNotifier, NotificationReceiver, Notifier};
