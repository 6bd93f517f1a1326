use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TalentLink API",
        version = "0.1.0",
        description = r#"
# TalentLink Marketplace API

Backend service for a talent marketplace connecting founders running product
campaigns with talents who review their products.

## Features

- **Campaigns**: Fixed pricing from rate level and video duration
- **Orders**: Product fulfillment lifecycle with optimistic concurrency
- **Review Settlement**: Atomic payment settlement on review approval
- **Wallet**: Founder top-ups backed by an append-only transaction ledger
- **Withdrawals**: Bank payouts of talent earnings with a 10% platform fee

## Error Handling

The API uses consistent error response formats with appropriate HTTP status
codes:

```json
{
  "error": "Conflict",
  "message": "Cannot transition order from 'shipped' to 'completed'",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints support pagination with the following query parameters:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 20, max: 100)
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "campaigns", description = "Campaign management endpoints"),
        (name = "orders", description = "Order lifecycle and review settlement endpoints"),
        (name = "wallet", description = "Wallet, ledger, and withdrawal endpoints"),
        (name = "health", description = "Service health probes")
    ),
    paths(
        // Campaigns
        crate::handlers::campaigns::create_campaign,
        crate::handlers::campaigns::list_campaigns,
        crate::handlers::campaigns::get_campaign,
        crate::handlers::campaigns::close_campaign,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::record_shipment,
        crate::handlers::orders::mark_delivered,
        crate::handlers::orders::submit_review,
        crate::handlers::orders::approve_review,
        crate::handlers::orders::reject_review,

        // Wallet
        crate::handlers::wallet::top_up,
        crate::handlers::wallet::get_balance,
        crate::handlers::wallet::list_transactions,
        crate::handlers::wallet::request_withdrawal,
        crate::handlers::wallet::list_withdrawals,
        crate::handlers::wallet::get_withdrawal,

        // Health
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::ListQuery,

            // Campaign types
            crate::services::campaigns::CreateCampaignRequest,
            crate::services::campaigns::CampaignResponse,
            crate::services::campaigns::CampaignListResponse,
            crate::handlers::campaigns::CloseCampaignRequest,
            crate::entities::campaign::RateLevel,
            crate::entities::campaign::VideoDuration,
            crate::entities::campaign::CampaignStatus,

            // Order types
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::RecordShipmentRequest,
            crate::services::orders::SubmitReviewRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderListResponse,
            crate::handlers::orders::ReviewDecisionRequest,
            crate::services::settlement::SettlementResponse,
            crate::entities::order::OrderStatus,
            crate::entities::order::ReviewMedia,
            crate::entities::order::MediaType,

            // Wallet types
            crate::services::wallet::TopUpRequest,
            crate::services::wallet::RequestWithdrawalRequest,
            crate::services::wallet::BalanceResponse,
            crate::services::wallet::TransactionResponse,
            crate::services::wallet::TransactionListResponse,
            crate::services::wallet::WithdrawalResponse,
            crate::entities::transaction::EntryType,
            crate::entities::transaction::TransactionCategory,
            crate::entities::withdrawal::WithdrawalStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
