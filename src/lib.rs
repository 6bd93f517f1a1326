//! TalentLink API Library
//!
//! Backend service for a talent marketplace: campaign pricing, order
//! fulfillment, review settlement, and wallet/payout workflows backed by an
//! append-only transaction ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{response::Json, routing::get, routing::post, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub(crate) fn default_page() -> u64 {
    1
}
pub(crate) fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All v1 routes, nested under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    let campaigns = Router::new()
        .route(
            "/campaigns",
            post(handlers::campaigns::create_campaign).get(handlers::campaigns::list_campaigns),
        )
        .route("/campaigns/:id", get(handlers::campaigns::get_campaign))
        .route(
            "/campaigns/:id/close",
            post(handlers::campaigns::close_campaign),
        );

    let orders = Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/shipment",
            post(handlers::orders::record_shipment),
        )
        .route(
            "/orders/:id/delivered",
            post(handlers::orders::mark_delivered),
        )
        .route("/orders/:id/review", post(handlers::orders::submit_review))
        .route(
            "/orders/:id/review/approve",
            post(handlers::orders::approve_review),
        )
        .route(
            "/orders/:id/review/reject",
            post(handlers::orders::reject_review),
        );

    let wallet = Router::new()
        .route("/wallet/topup", post(handlers::wallet::top_up))
        .route("/wallet/:user_id", get(handlers::wallet::get_balance))
        .route(
            "/wallet/:user_id/transactions",
            get(handlers::wallet::list_transactions),
        )
        .route(
            "/withdrawals",
            post(handlers::wallet::request_withdrawal).get(handlers::wallet::list_withdrawals),
        )
        .route("/withdrawals/:id", get(handlers::wallet::get_withdrawal));

    Router::new().merge(campaigns).merge(orders).merge(wallet)
}

/// Root banner for quick manual checks.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "talentlink-api",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger-ui",
        "health": "/health",
    }))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_carries_data_and_timestamp() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        let meta = response.meta.expect("metadata expected");
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_has_no_data() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn validation_errors_are_listed() {
        let response = ApiResponse::<()>::validation_errors(vec!["missing".into()]);
        assert!(!response.success);
        assert_eq!(response.errors.as_deref(), Some(&["missing".to_string()][..]));
    }
}
