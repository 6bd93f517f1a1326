use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::campaigns::{CampaignListResponse, CampaignResponse, CreateCampaignRequest};
use crate::{default_limit, default_page, errors::ServiceError, ApiResponse, ApiResult, AppState};

// Query deserialization cannot flatten numeric fields, so pagination is inlined.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CampaignListParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub founder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseCampaignRequest {
    pub founder_id: Uuid,
}

/// Create a campaign. The price is derived from the rate level and duration.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 200, description = "Campaign created", body = ApiResponse<CampaignResponse>),
        (status = 400, description = "Validation error")
    ),
    tag = "campaigns"
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(payload): Json<CreateCampaignRequest>,
) -> ApiResult<CampaignResponse> {
    let campaign = state.services.campaigns.create_campaign(payload).await?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// List campaigns, optionally filtered by founder.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns",
    responses((status = 200, description = "Campaign list", body = ApiResponse<CampaignListResponse>)),
    tag = "campaigns"
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(params): Query<CampaignListParams>,
) -> ApiResult<CampaignListResponse> {
    let per_page = params.limit.min(state.config.api_max_page_size);
    let campaigns = state
        .services
        .campaigns
        .list_campaigns(params.founder_id, params.page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(campaigns)))
}

/// Fetch a single campaign.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign", body = ApiResponse<CampaignResponse>),
        (status = 404, description = "Campaign not found")
    ),
    tag = "campaigns"
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CampaignResponse> {
    let campaign = state
        .services
        .campaigns
        .get_campaign(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Campaign not found".to_string()))?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// Close a campaign to new applications.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/close",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = CloseCampaignRequest,
    responses((status = 200, description = "Campaign closed", body = ApiResponse<CampaignResponse>)),
    tag = "campaigns"
)]
pub async fn close_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseCampaignRequest>,
) -> ApiResult<CampaignResponse> {
    let campaign = state
        .services
        .campaigns
        .close_campaign(id, payload.founder_id)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}
