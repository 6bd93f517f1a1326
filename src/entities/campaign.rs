use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Talent rate tier chosen by the founder when creating a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RateLevel {
    #[sea_orm(string_value = "level_1")]
    Level1,
    #[sea_orm(string_value = "level_2")]
    Level2,
    #[sea_orm(string_value = "level_3")]
    Level3,
}

/// Requested review-video duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum VideoDuration {
    #[sea_orm(string_value = "30sec")]
    #[serde(rename = "30sec")]
    ThirtySeconds,
    #[sea_orm(string_value = "1min")]
    #[serde(rename = "1min")]
    OneMinute,
    #[sea_orm(string_value = "3min")]
    #[serde(rename = "3min")]
    ThreeMinutes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub founder_id: Uuid,
    pub title: String,
    pub rate_level: RateLevel,
    pub duration: VideoDuration,

    /// Fixed from the pricing table at creation.
    pub price: Decimal,

    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::FounderId",
        to = "super::profile::Column::Id"
    )]
    Founder,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Founder.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
