use crate::{
    db::DbPool,
    entities::campaign::{
        self, ActiveModel as CampaignActiveModel, CampaignStatus, Entity as CampaignEntity,
        Model as CampaignModel, RateLevel, VideoDuration,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCampaignRequest {
    pub founder_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub rate_level: RateLevel,
    pub duration: VideoDuration,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub founder_id: Uuid,
    pub title: String,
    pub rate_level: RateLevel,
    pub duration: VideoDuration,
    pub price: Decimal,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignListResponse {
    pub campaigns: Vec<CampaignResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for founder review campaigns.
#[derive(Clone)]
pub struct CampaignService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CampaignService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a campaign, fixing its price from the pricing table.
    #[instrument(skip(self, request), fields(founder_id = %request.founder_id))]
    pub async fn create_campaign(
        &self,
        request: CreateCampaignRequest,
    ) -> Result<CampaignResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let campaign_id = Uuid::new_v4();
        let price = pricing::campaign_price(request.rate_level, request.duration);

        let campaign = CampaignActiveModel {
            id: Set(campaign_id),
            founder_id: Set(request.founder_id),
            title: Set(request.title.clone()),
            rate_level: Set(request.rate_level),
            duration: Set(request.duration),
            price: Set(price),
            status: Set(CampaignStatus::Open),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = campaign.insert(db).await.map_err(|e| {
            error!(error = %e, campaign_id = %campaign_id, "Failed to create campaign");
            ServiceError::DatabaseError(e)
        })?;

        info!(campaign_id = %campaign_id, price = %price, "Campaign created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CampaignCreated(campaign_id)).await {
                warn!(error = %e, campaign_id = %campaign_id, "Failed to send campaign created event");
            }
        }

        Ok(model_to_response(model))
    }

    #[instrument(skip(self), fields(campaign_id = %campaign_id))]
    pub async fn get_campaign(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignResponse>, ServiceError> {
        let db = &*self.db_pool;

        let campaign = CampaignEntity::find_by_id(campaign_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, campaign_id = %campaign_id, "Failed to fetch campaign");
                ServiceError::DatabaseError(e)
            })?;

        Ok(campaign.map(model_to_response))
    }

    /// Lists campaigns, optionally scoped to one founder.
    #[instrument(skip(self))]
    pub async fn list_campaigns(
        &self,
        founder_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<CampaignListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = CampaignEntity::find().order_by_desc(campaign::Column::CreatedAt);
        if let Some(founder_id) = founder_id {
            query = query.filter(campaign::Column::FounderId.eq(founder_id));
        }

        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count campaigns");
            ServiceError::DatabaseError(e)
        })?;

        let campaigns = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch campaigns page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(CampaignListResponse {
            campaigns: campaigns.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Closes a campaign to new applications. Existing orders are unaffected.
    #[instrument(skip(self), fields(campaign_id = %campaign_id, founder_id = %founder_id))]
    pub async fn close_campaign(
        &self,
        campaign_id: Uuid,
        founder_id: Uuid,
    ) -> Result<CampaignResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let campaign = CampaignEntity::find_by_id(campaign_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, campaign_id = %campaign_id, "Failed to fetch campaign for close");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Campaign not found".to_string()))?;

        if campaign.founder_id != founder_id {
            return Err(ServiceError::Forbidden(
                "Campaign belongs to another founder".to_string(),
            ));
        }

        let mut active: CampaignActiveModel = campaign.into();
        active.status = Set(CampaignStatus::Closed);
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, campaign_id = %campaign_id, "Failed to close campaign");
            ServiceError::DatabaseError(e)
        })?;

        info!(campaign_id = %campaign_id, "Campaign closed");

        Ok(model_to_response(updated))
    }
}

fn model_to_response(model: CampaignModel) -> CampaignResponse {
    CampaignResponse {
        id: model.id,
        founder_id: model.founder_id,
        title: model.title,
        rate_level: model.rate_level,
        duration: model.duration,
        price: model.price,
        status: model.status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
