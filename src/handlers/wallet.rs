use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::wallet::{
    BalanceResponse, RequestWithdrawalRequest, TopUpRequest, TransactionListResponse,
    WithdrawalResponse,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState, ListQuery};

#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawalListParams {
    pub user_id: Uuid,
}

/// Credit a founder wallet after a confirmed card charge.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/topup",
    request_body = TopUpRequest,
    responses(
        (status = 200, description = "Wallet credited", body = ApiResponse<BalanceResponse>),
        (status = 400, description = "Validation error")
    ),
    tag = "wallet"
)]
pub async fn top_up(
    State(state): State<AppState>,
    Json(payload): Json<TopUpRequest>,
) -> ApiResult<BalanceResponse> {
    let balance = state.services.wallet.top_up(payload).await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// Fetch the stored balances for a profile.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}",
    params(("user_id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Balances", body = ApiResponse<BalanceResponse>),
        (status = 404, description = "Profile not found")
    ),
    tag = "wallet"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<BalanceResponse> {
    let balance = state.services.wallet.get_balance(user_id).await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// List the ledger entries for a profile, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}/transactions",
    params(("user_id" = Uuid, Path, description = "Profile id")),
    responses((status = 200, description = "Transaction history", body = ApiResponse<TransactionListResponse>)),
    tag = "wallet"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(list): Query<ListQuery>,
) -> ApiResult<TransactionListResponse> {
    let per_page = list.limit.min(state.config.api_max_page_size);
    let transactions = state
        .services
        .wallet
        .list_transactions(user_id, list.page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(transactions)))
}

/// Request a withdrawal of available earnings to a bank account.
#[utoipa::path(
    post,
    path = "/api/v1/withdrawals",
    request_body = RequestWithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal paid out", body = ApiResponse<WithdrawalResponse>),
        (status = 422, description = "Available earnings are insufficient"),
        (status = 502, description = "Payout provider rejected the transfer; funds were returned")
    ),
    tag = "wallet"
)]
pub async fn request_withdrawal(
    State(state): State<AppState>,
    Json(payload): Json<RequestWithdrawalRequest>,
) -> ApiResult<WithdrawalResponse> {
    let withdrawal = state.services.wallet.request_withdrawal(payload).await?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// List withdrawals for a profile, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/withdrawals",
    responses((status = 200, description = "Withdrawal history", body = ApiResponse<Vec<WithdrawalResponse>>)),
    tag = "wallet"
)]
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(params): Query<WithdrawalListParams>,
) -> ApiResult<Vec<WithdrawalResponse>> {
    let withdrawals = state
        .services
        .wallet
        .list_withdrawals(params.user_id)
        .await?;
    Ok(Json(ApiResponse::success(withdrawals)))
}

/// Fetch a single withdrawal.
#[utoipa::path(
    get,
    path = "/api/v1/withdrawals/{id}",
    params(("id" = Uuid, Path, description = "Withdrawal id")),
    responses(
        (status = 200, description = "Withdrawal", body = ApiResponse<WithdrawalResponse>),
        (status = 404, description = "Withdrawal not found")
    ),
    tag = "wallet"
)]
pub async fn get_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WithdrawalResponse> {
    let withdrawal = state
        .services
        .wallet
        .get_withdrawal(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Withdrawal not found".to_string()))?;
    Ok(Json(ApiResponse::success(withdrawal)))
}
