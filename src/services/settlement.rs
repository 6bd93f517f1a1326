use crate::{
    db::DbPool,
    entities::campaign::Entity as CampaignEntity,
    entities::earning::{ActiveModel as EarningActiveModel, EarningStatus},
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, OrderStatus, ReviewMedia,
    },
    entities::profile::{self, Entity as ProfileEntity},
    entities::transaction::{
        ActiveModel as TransactionActiveModel, EntryType, TransactionCategory,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::media::MediaStore,
    services::orders::{model_to_response, OrderResponse},
    services::pricing,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettlementResponse {
    pub order: OrderResponse,
    pub talent_payment: Decimal,
    pub founder_charge: Decimal,
    pub admin_fee: Decimal,
}

/// Review settlement: converts an approved review into ledger entries and
/// balance movements, or rejects it back for revision.
///
/// This service (together with the wallet service) is the only writer of
/// ledger records. All money movement for one approval happens inside a
/// single database transaction.
#[derive(Clone)]
pub struct SettlementService {
    db_pool: Arc<DbPool>,
    platform_account_id: Uuid,
    media_store: Arc<dyn MediaStore>,
    event_sender: Option<Arc<EventSender>>,
}

impl SettlementService {
    pub fn new(
        db_pool: Arc<DbPool>,
        platform_account_id: Uuid,
        media_store: Arc<dyn MediaStore>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            platform_account_id,
            media_store,
            event_sender,
        }
    }

    /// Founder approves the submitted review.
    ///
    /// In one database transaction: order → `completed`, a paid Earning, the
    /// three ledger entries (talent credit, founder debit incl. fee, platform
    /// fee credit), and the guarded balance updates. Any failure rolls the
    /// whole set back. Of two concurrent approvals exactly one wins; the
    /// loser's guarded order update matches no row.
    #[instrument(skip(self), fields(order_id = %order_id, founder_id = %founder_id))]
    pub async fn approve_review(
        &self,
        order_id: Uuid,
        founder_id: Uuid,
    ) -> Result<SettlementResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start settlement transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order for settlement");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order.founder_id != founder_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another founder".to_string(),
            ));
        }
        if order.status != OrderStatus::ReviewSubmitted {
            return Err(ServiceError::InvalidTransition {
                from: order.status.as_str().to_string(),
                to: OrderStatus::Completed.as_str().to_string(),
            });
        }

        let campaign = CampaignEntity::find_by_id(order.campaign_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, campaign_id = %order.campaign_id, "Failed to fetch campaign for settlement");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Campaign not found".to_string()))?;

        let talent_payment = order.payout;
        let admin_fee = pricing::admin_fee(talent_payment);
        let founder_charge = pricing::amount_with_fee(talent_payment);

        // Check the founder can cover the charge before touching anything, so
        // the common failure surfaces with the actual shortfall.
        let founder = ProfileEntity::find_by_id(founder_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, founder_id = %founder_id, "Failed to fetch founder profile");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Founder profile not found".to_string()))?;
        if founder.wallet_balance < founder_charge {
            return Err(ServiceError::InsufficientBalance {
                required: founder_charge,
                available: founder.wallet_balance,
            });
        }

        // 1. Guarded order update; a concurrent approval already moved it.
        let updated = OrderEntity::update_many()
            .set(OrderActiveModel {
                status: Set(OrderStatus::Completed),
                updated_at: Set(Some(now)),
                version: Set(order.version + 1),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::ReviewSubmitted))
            .filter(order::Column::Version.eq(order.version))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to complete order");
                ServiceError::DatabaseError(e)
            })?;
        if updated.rows_affected != 1 {
            warn!(order_id = %order_id, "Concurrent settlement won the race");
            return Err(ServiceError::InvalidTransition {
                from: OrderStatus::ReviewSubmitted.as_str().to_string(),
                to: OrderStatus::Completed.as_str().to_string(),
            });
        }

        // 2. Talent-facing earning, immediately paid.
        EarningActiveModel {
            id: Set(Uuid::new_v4()),
            talent_id: Set(order.talent_id),
            order_id: Set(order_id),
            campaign_title: Set(campaign.title.clone()),
            amount: Set(talent_payment),
            status: Set(EarningStatus::Paid),
            earned_at: Set(now),
            paid_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            // The unique index on earnings.order_id makes a second earning
            // for the same order impossible; the whole transaction unwinds.
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                warn!(order_id = %order_id, "Order already has an earning recorded");
                ServiceError::Conflict("Order has already been settled".to_string())
            } else {
                error!(error = %e, order_id = %order_id, "Failed to insert earning");
                ServiceError::DatabaseError(e)
            }
        })?;

        // 3-5. The three ledger entries.
        insert_transaction(
            &txn,
            order.talent_id,
            EntryType::Credit,
            TransactionCategory::TalentPayment,
            talent_payment,
            format!("Payment for review of '{}'", campaign.title),
            Some(order_id),
        )
        .await?;
        insert_transaction(
            &txn,
            founder_id,
            EntryType::Debit,
            TransactionCategory::CampaignPayout,
            founder_charge,
            format!("Campaign payout for '{}' (incl. platform fee)", campaign.title),
            Some(order_id),
        )
        .await?;
        insert_transaction(
            &txn,
            self.platform_account_id,
            EntryType::Credit,
            TransactionCategory::AdminFee,
            admin_fee,
            format!("Platform fee for review of '{}'", campaign.title),
            Some(order_id),
        )
        .await?;

        // 6. Credit the talent's balances in a single guarded statement.
        let talent_update = ProfileEntity::update_many()
            .col_expr(
                profile::Column::AvailableEarnings,
                Expr::col(profile::Column::AvailableEarnings).add(talent_payment),
            )
            .col_expr(
                profile::Column::LifetimeEarnings,
                Expr::col(profile::Column::LifetimeEarnings).add(talent_payment),
            )
            .filter(profile::Column::Id.eq(order.talent_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, talent_id = %order.talent_id, "Failed to credit talent earnings");
                ServiceError::DatabaseError(e)
            })?;
        if talent_update.rows_affected != 1 {
            return Err(ServiceError::NotFound(
                "Talent profile not found".to_string(),
            ));
        }

        // 7. Debit the founder wallet; the balance guard makes overdraw
        // impossible even against a concurrent spender.
        let founder_update = ProfileEntity::update_many()
            .col_expr(
                profile::Column::WalletBalance,
                Expr::col(profile::Column::WalletBalance).sub(founder_charge),
            )
            .filter(profile::Column::Id.eq(founder_id))
            .filter(profile::Column::WalletBalance.gte(founder_charge))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, founder_id = %founder_id, "Failed to debit founder wallet");
                ServiceError::DatabaseError(e)
            })?;
        if founder_update.rows_affected != 1 {
            warn!(founder_id = %founder_id, required = %founder_charge, "Wallet guard rejected settlement debit");
            return Err(ServiceError::InsufficientBalance {
                required: founder_charge,
                available: founder.wallet_balance,
            });
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit settlement");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            talent_payment = %talent_payment,
            founder_charge = %founder_charge,
            admin_fee = %admin_fee,
            "Review approved and settled"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ReviewApproved(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send review approved event");
            }
        }

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        Ok(SettlementResponse {
            order: model_to_response(order),
            talent_payment,
            founder_charge,
            admin_fee,
        })
    }

    /// Founder requests a revision: the order returns to `delivered`, the
    /// submission is cleared, and deletion of the uploaded media is requested
    /// best-effort after commit. No ledger effect.
    #[instrument(skip(self), fields(order_id = %order_id, founder_id = %founder_id))]
    pub async fn reject_review(
        &self,
        order_id: Uuid,
        founder_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order for rejection");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order.founder_id != founder_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another founder".to_string(),
            ));
        }
        if order.status != OrderStatus::ReviewSubmitted {
            return Err(ServiceError::InvalidTransition {
                from: order.status.as_str().to_string(),
                to: OrderStatus::Delivered.as_str().to_string(),
            });
        }

        let media: Vec<ReviewMedia> = order.review_media();

        let updated = OrderEntity::update_many()
            .set(OrderActiveModel {
                status: Set(OrderStatus::Delivered),
                review_submission: Set(None),
                review_submitted_at: Set(None),
                review_notes: Set(None),
                updated_at: Set(Some(now)),
                version: Set(order.version + 1),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::ReviewSubmitted))
            .filter(order::Column::Version.eq(order.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to reject review");
                ServiceError::DatabaseError(e)
            })?;
        if updated.rows_affected != 1 {
            warn!(order_id = %order_id, "Concurrent settlement won the race");
            return Err(ServiceError::InvalidTransition {
                from: OrderStatus::ReviewSubmitted.as_str().to_string(),
                to: OrderStatus::Delivered.as_str().to_string(),
            });
        }

        info!(order_id = %order_id, media_count = media.len(), "Review rejected, revision requested");

        // Best-effort cleanup of the rejected uploads; the order state change
        // stands even if the storage backend is down.
        for item in &media {
            if let Err(e) = self.media_store.delete_object(&item.url).await {
                warn!(error = %e, url = %item.url, "Failed to request media deletion");
            }
        }

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ReviewRejected(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send review rejected event");
            }
        }

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        Ok(model_to_response(order))
    }
}

async fn insert_transaction(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    entry_type: EntryType,
    category: TransactionCategory,
    amount: Decimal,
    description: String,
    order_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    TransactionActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        entry_type: Set(entry_type),
        category: Set(category),
        amount: Set(amount),
        description: Set(description),
        order_id: Set(order_id),
        withdrawal_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "Failed to insert ledger entry");
        ServiceError::DatabaseError(e)
    })?;
    Ok(())
}
