use crate::{
    db::DbPool,
    entities::campaign::{CampaignStatus, Entity as CampaignEntity},
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        OrderStatus, ReviewMedia,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub campaign_id: Uuid,
    pub talent_id: Uuid,
    pub founder_id: Uuid,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordShipmentRequest {
    pub founder_id: Uuid,
    pub delivery_address: Option<String>,
    #[validate(length(min = 1, message = "Tracking number is required"))]
    pub tracking_number: String,
    #[validate(length(min = 1, message = "Courier is required"))]
    pub courier: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    pub talent_id: Uuid,
    pub media: Vec<ReviewMedia>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub talent_id: Uuid,
    pub founder_id: Uuid,
    pub status: OrderStatus,
    pub payout: Decimal,
    pub delivery_address: Option<String>,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
    pub review_submission: Vec<ReviewMedia>,
    pub review_submitted_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderFilter {
    pub talent_id: Option<Uuid>,
    pub founder_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

/// Service for the campaign fulfillment order lifecycle.
///
/// Every status change goes through a guarded UPDATE filtered on the expected
/// current status and version; a concurrent writer losing the race observes
/// zero affected rows and the call fails with `InvalidTransition`.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Founder approves a talent application: creates the fulfillment order
    /// with its payout fixed from the campaign price.
    #[instrument(skip(self, request), fields(campaign_id = %request.campaign_id, talent_id = %request.talent_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let campaign = CampaignEntity::find_by_id(request.campaign_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, campaign_id = %request.campaign_id, "Failed to fetch campaign");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Campaign not found".to_string()))?;

        if campaign.founder_id != request.founder_id {
            return Err(ServiceError::Forbidden(
                "Campaign belongs to another founder".to_string(),
            ));
        }
        if campaign.status != CampaignStatus::Open {
            return Err(ServiceError::InvalidInput(
                "Campaign is closed to new orders".to_string(),
            ));
        }

        // At most one live order per (campaign, talent)
        let existing = OrderEntity::find()
            .filter(order::Column::CampaignId.eq(request.campaign_id))
            .filter(order::Column::TalentId.eq(request.talent_id))
            .filter(order::Column::Status.ne(OrderStatus::Completed))
            .count(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check for duplicate order");
                ServiceError::DatabaseError(e)
            })?;
        if existing > 0 {
            return Err(ServiceError::Conflict(
                "Talent already has an active order for this campaign".to_string(),
            ));
        }

        let order = OrderActiveModel {
            id: Set(order_id),
            campaign_id: Set(request.campaign_id),
            talent_id: Set(request.talent_id),
            founder_id: Set(request.founder_id),
            status: Set(OrderStatus::PendingShipment),
            payout: Set(campaign.price),
            delivery_address: Set(request.delivery_address),
            tracking_number: Set(None),
            courier: Set(None),
            review_submission: Set(None),
            review_submitted_at: Set(None),
            review_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };

        // The partial unique index on (campaign_id, talent_id) backs the
        // pre-check when two creates race past it.
        let model = order.insert(&txn).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                warn!(order_id = %order_id, "Concurrent order creation lost the race");
                ServiceError::Conflict(
                    "Talent already has an active order for this campaign".to_string(),
                )
            } else {
                error!(error = %e, order_id = %order_id, "Failed to create order");
                ServiceError::DatabaseError(e)
            }
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, payout = %model.payout, "Order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
        }

        Ok(model_to_response(model))
    }

    /// Founder records the product shipment: `pending_shipment → shipped`.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn record_shipment(
        &self,
        order_id: Uuid,
        request: RecordShipmentRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let order = self.load_order(order_id).await?;
        if order.founder_id != request.founder_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another founder".to_string(),
            ));
        }
        require_transition(order.status, OrderStatus::Shipped)?;

        let mut changes = OrderActiveModel {
            status: Set(OrderStatus::Shipped),
            tracking_number: Set(Some(request.tracking_number.clone())),
            courier: Set(Some(request.courier)),
            updated_at: Set(Some(now)),
            version: Set(order.version + 1),
            ..Default::default()
        };
        if let Some(address) = request.delivery_address {
            changes.delivery_address = Set(Some(address));
        }

        let result = OrderEntity::update_many()
            .set(changes)
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::PendingShipment))
            .filter(order::Column::Version.eq(order.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to record shipment");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected != 1 {
            return Err(transition_lost(order_id, OrderStatus::Shipped));
        }

        info!(order_id = %order_id, "Shipment recorded");
        self.reload_response(order_id).await
    }

    /// Marks the shipment as received by the talent: `shipped → delivered`.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_delivered(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let order = self.load_order(order_id).await?;
        require_transition(order.status, OrderStatus::Delivered)?;

        let result = OrderEntity::update_many()
            .set(OrderActiveModel {
                status: Set(OrderStatus::Delivered),
                updated_at: Set(Some(now)),
                version: Set(order.version + 1),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::Shipped))
            .filter(order::Column::Version.eq(order.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to mark order delivered");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected != 1 {
            return Err(transition_lost(order_id, OrderStatus::Delivered));
        }

        info!(order_id = %order_id, "Order delivered");
        self.reload_response(order_id).await
    }

    /// Talent submits their review: `delivered → review_submitted`.
    #[instrument(skip(self, request), fields(order_id = %order_id, talent_id = %request.talent_id))]
    pub async fn submit_review(
        &self,
        order_id: Uuid,
        request: SubmitReviewRequest,
    ) -> Result<OrderResponse, ServiceError> {
        if request.media.is_empty() {
            return Err(ServiceError::ValidationError(
                "Review submission requires at least one media item".to_string(),
            ));
        }
        for item in &request.media {
            if item.url.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Review media url must not be empty".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let order = self.load_order(order_id).await?;
        if order.talent_id != request.talent_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another talent".to_string(),
            ));
        }
        require_transition(order.status, OrderStatus::ReviewSubmitted)?;
        if order.review_submission.is_some() {
            return Err(ServiceError::Conflict(
                "Order already has a review submission".to_string(),
            ));
        }

        let submission = serde_json::to_value(&request.media)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let result = OrderEntity::update_many()
            .set(OrderActiveModel {
                status: Set(OrderStatus::ReviewSubmitted),
                review_submission: Set(Some(submission)),
                review_submitted_at: Set(Some(now)),
                review_notes: Set(request.notes),
                updated_at: Set(Some(now)),
                version: Set(order.version + 1),
                ..Default::default()
            })
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::Delivered))
            .filter(order::Column::Version.eq(order.version))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to submit review");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected != 1 {
            return Err(transition_lost(order_id, OrderStatus::ReviewSubmitted));
        }

        info!(order_id = %order_id, media_count = request.media.len(), "Review submitted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ReviewSubmitted(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send review submitted event");
            }
        }

        self.reload_response(order_id).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?;

        Ok(order.map(model_to_response))
    }

    /// Lists orders with optional talent/founder/status filters.
    #[instrument(skip(self, filter))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(talent_id) = filter.talent_id {
            query = query.filter(order::Column::TalentId.eq(talent_id));
        }
        if let Some(founder_id) = filter.founder_id {
            query = query.filter(order::Column::FounderId.eq(founder_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;

        let orders = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch orders page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    async fn load_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;
        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }

    async fn reload_response(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        Ok(model_to_response(self.load_order(order_id).await?))
    }
}

/// Checks the transition table up front so callers get a precise error before
/// the guarded UPDATE runs.
fn require_transition(from: OrderStatus, to: OrderStatus) -> Result<(), ServiceError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Error for a guarded UPDATE that matched no row: a concurrent writer moved
/// the order first.
fn transition_lost(order_id: Uuid, to: OrderStatus) -> ServiceError {
    warn!(order_id = %order_id, to = %to, "Guarded status update matched no row; concurrent writer won");
    ServiceError::InvalidTransition {
        from: "concurrently-modified".to_string(),
        to: to.as_str().to_string(),
    }
}

pub(crate) fn model_to_response(model: OrderModel) -> OrderResponse {
    let review_submission = model.review_media();
    OrderResponse {
        id: model.id,
        campaign_id: model.campaign_id,
        talent_id: model.talent_id,
        founder_id: model.founder_id,
        status: model.status,
        payout: model.payout,
        delivery_address: model.delivery_address,
        tracking_number: model.tracking_number,
        courier: model.courier,
        review_submission,
        review_submitted_at: model.review_submitted_at,
        review_notes: model.review_notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
        version: model.version,
    }
}
