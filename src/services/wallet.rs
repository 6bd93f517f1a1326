use crate::{
    db::DbPool,
    entities::profile::{self, Entity as ProfileEntity, Model as ProfileModel, ProfileRole},
    entities::transaction::{
        self, ActiveModel as TransactionActiveModel, Entity as TransactionEntity, EntryType,
        Model as TransactionModel, TransactionCategory,
    },
    entities::withdrawal::{
        self, ActiveModel as WithdrawalActiveModel, Entity as WithdrawalEntity,
        Model as WithdrawalModel, WithdrawalStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::payouts::{self, PayoutError, PayoutProvider, PayoutRequest},
    services::pricing,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const CURRENCY: &str = "MYR";

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct TopUpRequest {
    pub founder_id: Uuid,
    pub amount: Decimal,
    /// Reference of the already-completed external charge being recorded.
    #[validate(length(min = 1, message = "Charge reference is required"))]
    pub charge_reference: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RequestWithdrawalRequest {
    pub talent_id: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Bank name is required"))]
    pub bank_name: String,
    #[validate(length(min = 1, message = "Bank code is required"))]
    pub bank_code: String,
    #[validate(length(min = 1, message = "Account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "Account holder is required"))]
    pub account_holder: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub role: ProfileRole,
    pub wallet_balance: Decimal,
    pub available_earnings: Decimal,
    pub lifetime_earnings: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_type: EntryType,
    pub category: TransactionCategory,
    pub amount: Decimal,
    pub description: String,
    pub order_id: Option<Uuid>,
    pub withdrawal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub admin_fee: Decimal,
    pub net_amount: Decimal,
    pub bank_name: String,
    pub account_number: String,
    pub status: WithdrawalStatus,
    pub provider_reference: Option<String>,
    pub provider_error: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Wallet and payout workflows: founder top-ups and talent withdrawals.
///
/// Withdrawals run as a saga: funds are reserved first, the provider is
/// called outside any database transaction, and the outcome is recorded in a
/// second transaction (or compensated on failure). This service and the
/// settlement service are the only writers of ledger records.
#[derive(Clone)]
pub struct WalletService {
    db_pool: Arc<DbPool>,
    platform_account_id: Uuid,
    payout_provider: Arc<dyn PayoutProvider>,
    event_sender: Option<Arc<EventSender>>,
}

impl WalletService {
    pub fn new(
        db_pool: Arc<DbPool>,
        platform_account_id: Uuid,
        payout_provider: Arc<dyn PayoutProvider>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            platform_account_id,
            payout_provider,
            event_sender,
        }
    }

    /// Records a completed external charge as wallet funds. No fee.
    #[instrument(skip(self, request), fields(founder_id = %request.founder_id, amount = %request.amount))]
    pub async fn top_up(&self, request: TopUpRequest) -> Result<BalanceResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Top-up amount must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start top-up transaction");
            ServiceError::DatabaseError(e)
        })?;

        TransactionActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.founder_id),
            entry_type: Set(EntryType::Credit),
            category: Set(TransactionCategory::WalletTopup),
            amount: Set(request.amount),
            description: Set(format!("Wallet top-up ({})", request.charge_reference)),
            order_id: Set(None),
            withdrawal_id: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert top-up ledger entry");
            ServiceError::DatabaseError(e)
        })?;

        let updated = ProfileEntity::update_many()
            .col_expr(
                profile::Column::WalletBalance,
                Expr::col(profile::Column::WalletBalance).add(request.amount),
            )
            .filter(profile::Column::Id.eq(request.founder_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to credit wallet balance");
                ServiceError::DatabaseError(e)
            })?;
        if updated.rows_affected != 1 {
            return Err(ServiceError::NotFound(
                "Founder profile not found".to_string(),
            ));
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit top-up");
            ServiceError::DatabaseError(e)
        })?;

        info!(founder_id = %request.founder_id, amount = %request.amount, "Wallet topped up");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::WalletToppedUp(request.founder_id))
                .await
            {
                warn!(error = %e, "Failed to send wallet topped up event");
            }
        }

        self.get_balance(request.founder_id).await
    }

    /// Talent withdraws earnings to their bank account through the payout
    /// provider. The gross amount leaves `available_earnings`; the provider
    /// transfers the net (gross minus the 10% fee).
    #[instrument(skip(self, request), fields(talent_id = %request.talent_id, amount = %request.amount))]
    pub async fn request_withdrawal(
        &self,
        request: RequestWithdrawalRequest,
    ) -> Result<WithdrawalResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let withdrawal_id = Uuid::new_v4();
        let admin_fee = pricing::admin_fee(request.amount);
        let net_amount = request.amount - admin_fee;

        // Reserve the funds and record the pending withdrawal atomically, so
        // a crash between here and the provider call can be reconciled from
        // the pending row.
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start withdrawal transaction");
            ServiceError::DatabaseError(e)
        })?;

        let talent = ProfileEntity::find_by_id(request.talent_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch talent profile");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Talent profile not found".to_string()))?;

        let reserved = ProfileEntity::update_many()
            .col_expr(
                profile::Column::AvailableEarnings,
                Expr::col(profile::Column::AvailableEarnings).sub(request.amount),
            )
            .filter(profile::Column::Id.eq(request.talent_id))
            .filter(profile::Column::AvailableEarnings.gte(request.amount))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to reserve withdrawal funds");
                ServiceError::DatabaseError(e)
            })?;
        if reserved.rows_affected != 1 {
            return Err(ServiceError::InsufficientBalance {
                required: request.amount,
                available: talent.available_earnings,
            });
        }

        let pending = WithdrawalActiveModel {
            id: Set(withdrawal_id),
            user_id: Set(request.talent_id),
            amount: Set(request.amount),
            admin_fee: Set(admin_fee),
            bank_name: Set(request.bank_name.clone()),
            bank_code: Set(request.bank_code.clone()),
            account_number: Set(request.account_number.clone()),
            account_holder: Set(request.account_holder.clone()),
            status: Set(WithdrawalStatus::Pending),
            provider_reference: Set(None),
            provider_status: Set(None),
            provider_error: Set(None),
            requested_at: Set(now),
            processed_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to insert withdrawal");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to commit withdrawal reservation");
            ServiceError::DatabaseError(e)
        })?;

        info!(withdrawal_id = %withdrawal_id, gross = %request.amount, net = %net_amount, "Withdrawal reserved, submitting to provider");

        let payout_request = PayoutRequest {
            reference: withdrawal_id,
            amount: net_amount,
            currency: CURRENCY.to_string(),
            bank_name: request.bank_name,
            bank_code: request.bank_code,
            account_number: request.account_number,
            account_holder: request.account_holder,
        };

        match payouts::submit_with_retry(&*self.payout_provider, &payout_request).await {
            Ok(receipt) => {
                let paid = self
                    .finalize_paid(pending, receipt.provider_reference, receipt.status)
                    .await?;

                if let Some(event_sender) = &self.event_sender {
                    if let Err(e) = event_sender.send(Event::WithdrawalPaid(withdrawal_id)).await {
                        warn!(error = %e, "Failed to send withdrawal paid event");
                    }
                }

                Ok(withdrawal_to_response(paid))
            }
            Err(payout_error) => {
                let reason = payout_error.to_string();
                self.compensate_rejected(pending, &reason).await?;

                if let Some(event_sender) = &self.event_sender {
                    if let Err(e) = event_sender
                        .send(Event::WithdrawalRejected(withdrawal_id))
                        .await
                    {
                        warn!(error = %e, "Failed to send withdrawal rejected event");
                    }
                }

                match payout_error {
                    PayoutError::Transient(r) | PayoutError::Terminal(r) => {
                        Err(ServiceError::ProviderError(r))
                    }
                }
            }
        }
    }

    /// Provider accepted the transfer: mark the withdrawal paid and write the
    /// two ledger entries in one transaction.
    async fn finalize_paid(
        &self,
        pending: WithdrawalModel,
        provider_reference: String,
        provider_status: String,
    ) -> Result<WithdrawalModel, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let withdrawal_id = pending.id;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to start settlement of withdrawal");
            ServiceError::DatabaseError(e)
        })?;

        let mut active: WithdrawalActiveModel = pending.clone().into();
        active.status = Set(WithdrawalStatus::Paid);
        active.provider_reference = Set(Some(provider_reference));
        active.provider_status = Set(Some(provider_status));
        active.processed_at = Set(Some(now));
        let paid = active.update(&txn).await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to mark withdrawal paid");
            ServiceError::DatabaseError(e)
        })?;

        TransactionActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(pending.user_id),
            entry_type: Set(EntryType::Debit),
            category: Set(TransactionCategory::Withdrawal),
            amount: Set(pending.amount),
            description: Set(format!("Withdrawal to {}", pending.bank_name)),
            order_id: Set(None),
            withdrawal_id: Set(Some(withdrawal_id)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to insert withdrawal debit");
            ServiceError::DatabaseError(e)
        })?;

        TransactionActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.platform_account_id),
            entry_type: Set(EntryType::Credit),
            category: Set(TransactionCategory::AdminFee),
            amount: Set(pending.admin_fee),
            description: Set("Withdrawal processing fee".to_string()),
            order_id: Set(None),
            withdrawal_id: Set(Some(withdrawal_id)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to insert withdrawal fee credit");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to commit withdrawal settlement");
            ServiceError::DatabaseError(e)
        })?;

        info!(withdrawal_id = %withdrawal_id, "Withdrawal paid");
        Ok(paid)
    }

    /// Provider refused or stayed unreachable: mark the withdrawal rejected
    /// and restore the reserved earnings. No ledger entries are written.
    async fn compensate_rejected(
        &self,
        pending: WithdrawalModel,
        reason: &str,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let withdrawal_id = pending.id;
        let user_id = pending.user_id;
        let amount = pending.amount;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to start withdrawal compensation");
            ServiceError::DatabaseError(e)
        })?;

        let mut active: WithdrawalActiveModel = pending.into();
        active.status = Set(WithdrawalStatus::Rejected);
        active.provider_error = Set(Some(reason.to_string()));
        active.processed_at = Set(Some(now));
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to mark withdrawal rejected");
            ServiceError::DatabaseError(e)
        })?;

        ProfileEntity::update_many()
            .col_expr(
                profile::Column::AvailableEarnings,
                Expr::col(profile::Column::AvailableEarnings).add(amount),
            )
            .filter(profile::Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to restore reserved earnings");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, withdrawal_id = %withdrawal_id, "Failed to commit withdrawal compensation");
            ServiceError::DatabaseError(e)
        })?;

        warn!(withdrawal_id = %withdrawal_id, reason = reason, "Withdrawal rejected, earnings restored");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_balance(&self, user_id: Uuid) -> Result<BalanceResponse, ServiceError> {
        let db = &*self.db_pool;

        let profile = ProfileEntity::find_by_id(user_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to fetch profile");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Profile not found".to_string()))?;

        Ok(profile_to_balance(profile))
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<TransactionListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = TransactionEntity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .order_by_desc(transaction::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count transactions");
            ServiceError::DatabaseError(e)
        })?;

        let transactions = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch transactions page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(TransactionListResponse {
            transactions: transactions
                .into_iter()
                .map(transaction_to_response)
                .collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_withdrawals(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<WithdrawalResponse>, ServiceError> {
        let db = &*self.db_pool;

        let withdrawals = WithdrawalEntity::find()
            .filter(withdrawal::Column::UserId.eq(user_id))
            .order_by_desc(withdrawal::Column::RequestedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch withdrawals");
                ServiceError::DatabaseError(e)
            })?;

        Ok(withdrawals.into_iter().map(withdrawal_to_response).collect())
    }

    #[instrument(skip(self), fields(withdrawal_id = %withdrawal_id))]
    pub async fn get_withdrawal(
        &self,
        withdrawal_id: Uuid,
    ) -> Result<Option<WithdrawalResponse>, ServiceError> {
        let db = &*self.db_pool;

        let withdrawal = WithdrawalEntity::find_by_id(withdrawal_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch withdrawal");
                ServiceError::DatabaseError(e)
            })?;

        Ok(withdrawal.map(withdrawal_to_response))
    }
}

fn profile_to_balance(profile: ProfileModel) -> BalanceResponse {
    BalanceResponse {
        user_id: profile.id,
        role: profile.role,
        wallet_balance: profile.wallet_balance,
        available_earnings: profile.available_earnings,
        lifetime_earnings: profile.lifetime_earnings,
    }
}

fn transaction_to_response(model: TransactionModel) -> TransactionResponse {
    TransactionResponse {
        id: model.id,
        user_id: model.user_id,
        entry_type: model.entry_type,
        category: model.category,
        amount: model.amount,
        description: model.description,
        order_id: model.order_id,
        withdrawal_id: model.withdrawal_id,
        created_at: model.created_at,
    }
}

fn withdrawal_to_response(model: WithdrawalModel) -> WithdrawalResponse {
    let net_amount = model.net_amount();
    WithdrawalResponse {
        id: model.id,
        user_id: model.user_id,
        amount: model.amount,
        admin_fee: model.admin_fee,
        net_amount,
        bank_name: model.bank_name,
        account_number: model.account_number,
        status: model.status,
        provider_reference: model.provider_reference,
        provider_error: model.provider_error,
        requested_at: model.requested_at,
        processed_at: model.processed_at,
    }
}
