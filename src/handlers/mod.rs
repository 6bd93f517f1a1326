pub mod campaigns;
pub mod health;
pub mod orders;
pub mod wallet;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::media::MediaStore;
use crate::services::payouts::PayoutProvider;
use std::sync::Arc;
use uuid::Uuid;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub campaigns: Arc<crate::services::campaigns::CampaignService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub settlement: Arc<crate::services::settlement::SettlementService>,
    pub wallet: Arc<crate::services::wallet::WalletService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        platform_account_id: Uuid,
        payout_provider: Arc<dyn PayoutProvider>,
        media_store: Arc<dyn MediaStore>,
    ) -> Self {
        let campaigns = Arc::new(crate::services::campaigns::CampaignService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let settlement = Arc::new(crate::services::settlement::SettlementService::new(
            db_pool.clone(),
            platform_account_id,
            media_store,
            Some(event_sender.clone()),
        ));
        let wallet = Arc::new(crate::services::wallet::WalletService::new(
            db_pool,
            platform_account_id,
            payout_provider,
            Some(event_sender),
        ));

        Self {
            campaigns,
            orders,
            settlement,
            wallet,
        }
    }
}
