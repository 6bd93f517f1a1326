use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::orders::{
    CreateOrderRequest, OrderFilter, OrderListResponse, OrderResponse, RecordShipmentRequest,
    SubmitReviewRequest,
};
use crate::services::settlement::SettlementResponse;
use crate::{default_limit, default_page, errors::ServiceError, ApiResponse, ApiResult, AppState};

// Query deserialization cannot flatten numeric fields, so pagination is inlined.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub talent_id: Option<Uuid>,
    pub founder_id: Option<Uuid>,
    pub status: Option<crate::entities::order::OrderStatus>,
}

/// Founder-supplied body for review approval / rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewDecisionRequest {
    pub founder_id: Uuid,
}

/// Create an order for an approved application. Payout is fixed from the
/// campaign price at creation time.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Campaign not found"),
        (status = 409, description = "Talent already has an active order for this campaign")
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<OrderResponse> {
    let order = state.services.orders.create_order(payload).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// List orders with optional talent/founder/status filters.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "Order list", body = ApiResponse<OrderListResponse>)),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> ApiResult<OrderListResponse> {
    let per_page = params.limit.min(state.config.api_max_page_size);
    let filter = OrderFilter {
        talent_id: params.talent_id,
        founder_id: params.founder_id,
        status: params.status,
    };
    let orders = state
        .services
        .orders
        .list_orders(filter, params.page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Fetch a single order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
    Ok(Json(ApiResponse::success(order)))
}

/// Record the product shipment with tracking details.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/shipment",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = RecordShipmentRequest,
    responses(
        (status = 200, description = "Shipment recorded", body = ApiResponse<OrderResponse>),
        (status = 409, description = "Order is not awaiting shipment")
    ),
    tag = "orders"
)]
pub async fn record_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordShipmentRequest>,
) -> ApiResult<OrderResponse> {
    let order = state.services.orders.record_shipment(id, payload).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Mark the shipment as received by the talent.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/delivered",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Delivery confirmed", body = ApiResponse<OrderResponse>),
        (status = 409, description = "Order has not been shipped")
    ),
    tag = "orders"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    let order = state.services.orders.mark_delivered(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Submit the review media for founder approval.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/review",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review submitted", body = ApiResponse<OrderResponse>),
        (status = 409, description = "Order is not awaiting a review")
    ),
    tag = "orders"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitReviewRequest>,
) -> ApiResult<OrderResponse> {
    let order = state.services.orders.submit_review(id, payload).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Approve the submitted review and settle the payment in one transaction.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/review/approve",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ReviewDecisionRequest,
    responses(
        (status = 200, description = "Review approved and settled", body = ApiResponse<SettlementResponse>),
        (status = 409, description = "No review is awaiting approval"),
        (status = 422, description = "Founder wallet balance is insufficient")
    ),
    tag = "orders"
)]
pub async fn approve_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> ApiResult<SettlementResponse> {
    let settlement = state
        .services
        .settlement
        .approve_review(id, payload.founder_id)
        .await?;
    Ok(Json(ApiResponse::success(settlement)))
}

/// Reject the submitted review and request a revision.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/review/reject",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ReviewDecisionRequest,
    responses(
        (status = 200, description = "Revision requested", body = ApiResponse<OrderResponse>),
        (status = 409, description = "No review is awaiting approval")
    ),
    tag = "orders"
)]
pub async fn reject_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .settlement
        .reject_review(id, payload.founder_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}
