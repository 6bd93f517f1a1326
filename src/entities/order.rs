use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle states of a campaign fulfillment order.
///
/// The only legal forward path is
/// `pending_shipment → shipped → delivered → review_submitted → completed`,
/// with the single back-edge `review_submitted → delivered` when the founder
/// requests a revision. `completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending_shipment")]
    PendingShipment,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "review_submitted")]
    ReviewSubmitted,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingShipment => "pending_shipment",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::ReviewSubmitted => "review_submitted",
            OrderStatus::Completed => "completed",
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingShipment, Shipped)
                | (Shipped, Delivered)
                | (Delivered, ReviewSubmitted)
                | (ReviewSubmitted, Completed)
                // Revision requested: review rejected, back to delivered
                | (ReviewSubmitted, Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media kind of a single review submission item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

/// One uploaded review artifact (stored as part of the order's
/// `review_submission` JSON payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReviewMedia {
    pub url: String,
    pub media_type: MediaType,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub campaign_id: Uuid,
    pub talent_id: Uuid,
    pub founder_id: Uuid,
    pub status: OrderStatus,

    /// Payout owed to the talent, fixed from the campaign price at creation.
    /// Immutable for the lifetime of the order.
    pub payout: Decimal,

    pub delivery_address: Option<String>,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,

    /// JSON array of [`ReviewMedia`]; only present in `review_submitted`
    /// and `completed`.
    pub review_submission: Option<Json>,
    pub review_submitted_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Optimistic lock; bumped on every mutation.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
    #[sea_orm(has_many = "super::earning::Entity")]
    Earnings,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl Related<super::earning::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Earnings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the review submission payload, if any.
    pub fn review_media(&self) -> Vec<ReviewMedia> {
        self.review_submission
            .as_ref()
            .and_then(|json| serde_json::from_value(json.clone()).ok())
            .unwrap_or_default()
    }
}
