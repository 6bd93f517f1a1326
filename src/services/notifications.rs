//! Fire-and-forget user notifications, driven from the event processor.
//! Delivery channels (email, push) live behind the [`Notifier`] trait;
//! workflows never await delivery.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, message: &str);
}

/// Default notifier: logs the notification and drops it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: Uuid, message: &str) {
        info!(user_id = %user_id, message = message, "Notification dispatched");
    }
}
