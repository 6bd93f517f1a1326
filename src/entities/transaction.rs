use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of a ledger entry from the owning user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    #[sea_orm(string_value = "credit")]
    Credit,
    #[sea_orm(string_value = "debit")]
    Debit,
}

/// Business meaning of a ledger entry. Always tagged explicitly at write
/// time; consumers must never infer the category from the description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    /// Credit to the talent for an approved review.
    #[sea_orm(string_value = "talent_payment")]
    TalentPayment,
    /// Debit from the founder covering payout plus admin fee.
    #[sea_orm(string_value = "campaign_payout")]
    CampaignPayout,
    /// Credit to the platform account.
    #[sea_orm(string_value = "admin_fee")]
    AdminFee,
    /// Founder wallet funding; no fee.
    #[sea_orm(string_value = "wallet_topup")]
    WalletTopup,
    /// Gross debit from the talent on a paid withdrawal.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
}

/// Append-only ledger row. Never updated or deleted after insert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub entry_type: EntryType,
    pub category: TransactionCategory,

    /// Always positive; direction comes from `entry_type`.
    pub amount: Decimal,

    pub description: String,
    pub order_id: Option<Uuid>,
    pub withdrawal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Amount with its sign applied: credits positive, debits negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(entry_type: EntryType, amount: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_type,
            category: TransactionCategory::TalentPayment,
            amount,
            description: "test".into(),
            order_id: None,
            withdrawal_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn signed_amount_applies_direction() {
        assert_eq!(row(EntryType::Credit, dec!(100)).signed_amount(), dec!(100));
        assert_eq!(row(EntryType::Debit, dec!(110)).signed_amount(), dec!(-110));
    }

    #[test]
    fn category_serializes_as_snake_case_tag() {
        let json = serde_json::to_value(TransactionCategory::CampaignPayout).unwrap();
        assert_eq!(json, serde_json::json!("campaign_payout"));
        let back: TransactionCategory = serde_json::from_value(json).unwrap();
        assert_eq!(back, TransactionCategory::CampaignPayout);
    }
}
