use crate::db::DbPool;
use crate::entities::campaign::Entity as CampaignEntity;
use crate::entities::order::Entity as OrderEntity;
use crate::entities::withdrawal::Entity as WithdrawalEntity;
use crate::services::notifications::Notifier;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Events emitted by the workflow services. Carried ids are looked up by the
// processor; workflows never block on notification delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Campaign events
    CampaignCreated(Uuid),

    // Order lifecycle events
    OrderCreated(Uuid),
    ReviewSubmitted(Uuid),
    ReviewApproved(Uuid),
    ReviewRejected(Uuid),

    // Wallet events
    WalletToppedUp(Uuid),
    WithdrawalPaid(Uuid),
    WithdrawalRejected(Uuid),
}

/// Processes incoming events and dispatches user notifications.
pub async fn process_events(
    mut rx: mpsc::Receiver<Event>,
    db_pool: Arc<DbPool>,
    notifier: Arc<dyn Notifier>,
) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::CampaignCreated(campaign_id) => {
                notify_campaign_owner(
                    &db_pool,
                    &*notifier,
                    campaign_id,
                    "Your campaign is live and accepting applications",
                )
                .await;
            }
            Event::OrderCreated(order_id) => {
                notify_order_party(
                    &db_pool,
                    &*notifier,
                    order_id,
                    OrderParty::Talent,
                    "Your application was approved; the product is on its way",
                )
                .await;
            }
            Event::ReviewSubmitted(order_id) => {
                notify_order_party(
                    &db_pool,
                    &*notifier,
                    order_id,
                    OrderParty::Founder,
                    "A review was submitted and is waiting for your approval",
                )
                .await;
            }
            Event::ReviewApproved(order_id) => {
                notify_order_party(
                    &db_pool,
                    &*notifier,
                    order_id,
                    OrderParty::Talent,
                    "Your review was approved and your payment has been credited",
                )
                .await;
            }
            Event::ReviewRejected(order_id) => {
                notify_order_party(
                    &db_pool,
                    &*notifier,
                    order_id,
                    OrderParty::Talent,
                    "A revision was requested for your review",
                )
                .await;
            }
            Event::WalletToppedUp(user_id) => {
                notifier
                    .notify(user_id, "Your wallet top-up has been credited")
                    .await;
            }
            Event::WithdrawalPaid(withdrawal_id) => {
                notify_withdrawal_owner(
                    &db_pool,
                    &*notifier,
                    withdrawal_id,
                    "Your withdrawal has been paid out",
                )
                .await;
            }
            Event::WithdrawalRejected(withdrawal_id) => {
                notify_withdrawal_owner(
                    &db_pool,
                    &*notifier,
                    withdrawal_id,
                    "Your withdrawal could not be processed; the funds were returned",
                )
                .await;
            }
        }
    }

    warn!("Event channel closed, stopping event processing loop");
}

enum OrderParty {
    Talent,
    Founder,
}

async fn notify_order_party(
    db_pool: &DbPool,
    notifier: &dyn Notifier,
    order_id: Uuid,
    party: OrderParty,
    message: &str,
) {
    match OrderEntity::find_by_id(order_id).one(db_pool).await {
        Ok(Some(order)) => {
            let user_id = match party {
                OrderParty::Talent => order.talent_id,
                OrderParty::Founder => order.founder_id,
            };
            notifier.notify(user_id, message).await;
        }
        Ok(None) => warn!(order_id = %order_id, "Order for event no longer exists"),
        Err(e) => error!(error = %e, order_id = %order_id, "Failed to load order for event"),
    }
}

async fn notify_campaign_owner(
    db_pool: &DbPool,
    notifier: &dyn Notifier,
    campaign_id: Uuid,
    message: &str,
) {
    match CampaignEntity::find_by_id(campaign_id).one(db_pool).await {
        Ok(Some(campaign)) => notifier.notify(campaign.founder_id, message).await,
        Ok(None) => warn!(campaign_id = %campaign_id, "Campaign for event no longer exists"),
        Err(e) => {
            error!(error = %e, campaign_id = %campaign_id, "Failed to load campaign for event")
        }
    }
}

async fn notify_withdrawal_owner(
    db_pool: &DbPool,
    notifier: &dyn Notifier,
    withdrawal_id: Uuid,
    message: &str,
) {
    match WithdrawalEntity::find_by_id(withdrawal_id).one(db_pool).await {
        Ok(Some(withdrawal)) => notifier.notify(withdrawal.user_id, message).await,
        Ok(None) => warn!(withdrawal_id = %withdrawal_id, "Withdrawal for event no longer exists"),
        Err(e) => {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to load withdrawal for event")
        }
    }
}
