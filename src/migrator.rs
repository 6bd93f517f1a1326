use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_profiles_table::Migration),
            Box::new(m20240101_000002_create_campaigns_table::Migration),
            Box::new(m20240101_000003_create_orders_table::Migration),
            Box::new(m20240101_000004_create_transactions_table::Migration),
            Box::new(m20240101_000005_create_earnings_table::Migration),
            Box::new(m20240101_000006_create_withdrawals_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_profiles_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_profiles_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create profiles table aligned with entities::profile Model
            manager
                .create_table(
                    Table::create()
                        .table(Profiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Profiles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Profiles::DisplayName).string().not_null())
                        .col(ColumnDef::new(Profiles::Role).string().not_null())
                        .col(
                            ColumnDef::new(Profiles::WalletBalance)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Profiles::AvailableEarnings)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Profiles::LifetimeEarnings)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Profiles::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Profiles::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_profiles_role")
                        .table(Profiles::Table)
                        .col(Profiles::Role)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Profiles::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Profiles {
        Table,
        Id,
        DisplayName,
        Role,
        WalletBalance,
        AvailableEarnings,
        LifetimeEarnings,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_campaigns_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_campaigns_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create campaigns table aligned with entities::campaign Model
            manager
                .create_table(
                    Table::create()
                        .table(Campaigns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Campaigns::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Campaigns::FounderId).uuid().not_null())
                        .col(ColumnDef::new(Campaigns::Title).string().not_null())
                        .col(ColumnDef::new(Campaigns::RateLevel).string().not_null())
                        .col(ColumnDef::new(Campaigns::Duration).string().not_null())
                        .col(ColumnDef::new(Campaigns::Price).decimal().not_null())
                        .col(ColumnDef::new(Campaigns::Status).string().not_null())
                        .col(ColumnDef::new(Campaigns::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Campaigns::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_campaigns_founder_id")
                        .table(Campaigns::Table)
                        .col(Campaigns::FounderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_campaigns_status")
                        .table(Campaigns::Table)
                        .col(Campaigns::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Campaigns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Campaigns {
        Table,
        Id,
        FounderId,
        Title,
        RateLevel,
        Duration,
        Price,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create orders table aligned with entities::order Model
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::CampaignId).uuid().not_null())
                        .col(ColumnDef::new(Orders::TalentId).uuid().not_null())
                        .col(ColumnDef::new(Orders::FounderId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(ColumnDef::new(Orders::Payout).decimal().not_null())
                        .col(ColumnDef::new(Orders::DeliveryAddress).string().null())
                        .col(ColumnDef::new(Orders::TrackingNumber).string().null())
                        .col(ColumnDef::new(Orders::Courier).string().null())
                        .col(ColumnDef::new(Orders::ReviewSubmission).json().null())
                        .col(
                            ColumnDef::new(Orders::ReviewSubmittedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::ReviewNotes).string().null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .col(
                            ColumnDef::new(Orders::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_campaign_id")
                        .table(Orders::Table)
                        .col(Orders::CampaignId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_talent_id")
                        .table(Orders::Table)
                        .col(Orders::TalentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_founder_id")
                        .table(Orders::Table)
                        .col(Orders::FounderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            // At most one live order per (campaign, talent); completed orders
            // do not block a new engagement.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_orders_campaign_talent_active")
                        .table(Orders::Table)
                        .col(Orders::CampaignId)
                        .col(Orders::TalentId)
                        .unique()
                        .and_where(Expr::col(Orders::Status).ne("completed"))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        CampaignId,
        TalentId,
        FounderId,
        Status,
        Payout,
        DeliveryAddress,
        TrackingNumber,
        Courier,
        ReviewSubmission,
        ReviewSubmittedAt,
        ReviewNotes,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20240101_000004_create_transactions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Append-only ledger; no updated_at by design of the schema
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::UserId).uuid().not_null())
                        .col(ColumnDef::new(Transactions::EntryType).string().not_null())
                        .col(ColumnDef::new(Transactions::Category).string().not_null())
                        .col(ColumnDef::new(Transactions::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(Transactions::Description)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::OrderId).uuid().null())
                        .col(ColumnDef::new(Transactions::WithdrawalId).uuid().null())
                        .col(
                            ColumnDef::new(Transactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transactions_user_id")
                        .table(Transactions::Table)
                        .col(Transactions::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transactions_category")
                        .table(Transactions::Table)
                        .col(Transactions::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transactions_order_id")
                        .table(Transactions::Table)
                        .col(Transactions::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Transactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Transactions {
        Table,
        Id,
        UserId,
        EntryType,
        Category,
        Amount,
        Description,
        OrderId,
        WithdrawalId,
        CreatedAt,
    }
}

mod m20240101_000005_create_earnings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_earnings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Earnings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Earnings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Earnings::TalentId).uuid().not_null())
                        .col(ColumnDef::new(Earnings::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(Earnings::CampaignTitle)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Earnings::Amount).decimal().not_null())
                        .col(ColumnDef::new(Earnings::Status).string().not_null())
                        .col(ColumnDef::new(Earnings::EarnedAt).timestamp().not_null())
                        .col(ColumnDef::new(Earnings::PaidAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_earnings_talent_id")
                        .table(Earnings::Table)
                        .col(Earnings::TalentId)
                        .to_owned(),
                )
                .await?;

            // One earning per settled order
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_earnings_order_id")
                        .table(Earnings::Table)
                        .col(Earnings::OrderId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Earnings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Earnings {
        Table,
        Id,
        TalentId,
        OrderId,
        CampaignTitle,
        Amount,
        Status,
        EarnedAt,
        PaidAt,
    }
}

mod m20240101_000006_create_withdrawals_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_withdrawals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Withdrawals::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Withdrawals::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Withdrawals::UserId).uuid().not_null())
                        .col(ColumnDef::new(Withdrawals::Amount).decimal().not_null())
                        .col(ColumnDef::new(Withdrawals::AdminFee).decimal().not_null())
                        .col(ColumnDef::new(Withdrawals::BankName).string().not_null())
                        .col(ColumnDef::new(Withdrawals::BankCode).string().not_null())
                        .col(
                            ColumnDef::new(Withdrawals::AccountNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Withdrawals::AccountHolder)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Withdrawals::Status).string().not_null())
                        .col(
                            ColumnDef::new(Withdrawals::ProviderReference)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Withdrawals::ProviderStatus)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Withdrawals::ProviderError)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Withdrawals::RequestedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Withdrawals::ProcessedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_withdrawals_user_id")
                        .table(Withdrawals::Table)
                        .col(Withdrawals::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_withdrawals_status")
                        .table(Withdrawals::Table)
                        .col(Withdrawals::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Withdrawals {
        Table,
        Id,
        UserId,
        Amount,
        AdminFee,
        BankName,
        BankCode,
        AccountNumber,
        AccountHolder,
        Status,
        ProviderReference,
        ProviderStatus,
        ProviderError,
        RequestedAt,
        ProcessedAt,
    }
}

// Database migration CLI runner
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    let result = Migrator::up(&db, None).await;

    match result {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
