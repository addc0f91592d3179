use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to deliver notification to {user_id}: {reason}")]
    Delivery { user_id: String, reason: String },

    #[error("Failed to send email to {recipient}: {reason}")]
    Mail { recipient: String, reason: String },
}
