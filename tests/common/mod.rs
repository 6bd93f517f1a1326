#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    routing::get,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use talentlink_api::{
    api_v1_routes,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        campaign::{RateLevel, VideoDuration},
        profile::{self, ProfileRole},
    },
    events::{self, EventSender},
    handlers::{self, AppServices},
    services::{
        campaigns::CampaignResponse,
        media::MediaStore,
        notifications::{LogNotifier, Notifier},
        orders::{CreateOrderRequest, OrderResponse},
        payouts::{PayoutError, PayoutProvider, PayoutReceipt, PayoutRequest},
    },
    AppState,
};

/// How the mock payout provider should respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutBehavior {
    Succeed,
    FailTerminal,
    FailTransient,
}

/// In-process payout provider that records every instruction it receives.
pub struct MockPayoutProvider {
    pub behavior: Mutex<PayoutBehavior>,
    pub requests: Mutex<Vec<PayoutRequest>>,
}

impl MockPayoutProvider {
    pub fn new(behavior: PayoutBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: PayoutBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn recorded_requests(&self) -> Vec<PayoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayoutProvider for MockPayoutProvider {
    async fn submit_payout(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutError> {
        self.requests.lock().unwrap().push(request.clone());
        match *self.behavior.lock().unwrap() {
            PayoutBehavior::Succeed => Ok(PayoutReceipt {
                provider_reference: format!("mock-{}", request.reference),
                status: "success".to_string(),
            }),
            PayoutBehavior::FailTerminal => {
                Err(PayoutError::Terminal("invalid bank account".to_string()))
            }
            PayoutBehavior::FailTransient => {
                Err(PayoutError::Transient("connection reset".to_string()))
            }
        }
    }
}

/// Media store that records delete requests instead of calling storage.
#[derive(Default)]
pub struct RecordingMediaStore {
    pub deleted: Mutex<Vec<String>>,
}

impl RecordingMediaStore {
    pub fn deleted_urls(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn delete_object(&self, url: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Test harness backed by a single-connection in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub platform_account_id: Uuid,
    pub payout_provider: Arc<MockPayoutProvider>,
    pub media_store: Arc<RecordingMediaStore>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_payout_behavior(PayoutBehavior::Succeed).await
    }

    pub async fn with_payout_behavior(behavior: PayoutBehavior) -> Self {
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let platform_account_id = Uuid::new_v4();

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let event_task = tokio::spawn(events::process_events(
            event_rx,
            db_arc.clone(),
            notifier,
        ));

        let payout_provider = Arc::new(MockPayoutProvider::new(behavior));
        let media_store = Arc::new(RecordingMediaStore::default());

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            platform_account_id,
            payout_provider.clone(),
            media_store.clone(),
        );

        let config = test_config(platform_account_id);
        let state = AppState {
            db: db_arc.clone(),
            config,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/health", get(handlers::health::health_check))
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        let app = Self {
            router,
            state,
            platform_account_id,
            payout_provider,
            media_store,
            _event_task: event_task,
        };
        app.seed_platform_account().await;
        app
    }

    async fn seed_platform_account(&self) {
        let now = Utc::now();
        profile::ActiveModel {
            id: Set(self.platform_account_id),
            display_name: Set("TalentLink".to_string()),
            role: Set(ProfileRole::Platform),
            wallet_balance: Set(Decimal::ZERO),
            available_earnings: Set(Decimal::ZERO),
            lifetime_earnings: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed platform account");
    }

    /// Inserts a profile and returns its id.
    pub async fn seed_profile(
        &self,
        role: ProfileRole,
        wallet_balance: Decimal,
        available_earnings: Decimal,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        profile::ActiveModel {
            id: Set(id),
            display_name: Set(format!("user-{id}")),
            role: Set(role),
            wallet_balance: Set(wallet_balance),
            available_earnings: Set(available_earnings),
            lifetime_earnings: Set(available_earnings),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed profile");
        id
    }

    pub async fn seed_campaign(
        &self,
        founder_id: Uuid,
        rate_level: RateLevel,
        duration: VideoDuration,
    ) -> CampaignResponse {
        self.state
            .services
            .campaigns
            .create_campaign(talentlink_api::services::campaigns::CreateCampaignRequest {
                founder_id,
                title: "Matcha powder unboxing".to_string(),
                rate_level,
                duration,
            })
            .await
            .expect("failed to seed campaign")
    }

    pub async fn seed_order(
        &self,
        campaign_id: Uuid,
        talent_id: Uuid,
        founder_id: Uuid,
    ) -> OrderResponse {
        self.state
            .services
            .orders
            .create_order(CreateOrderRequest {
                campaign_id,
                talent_id,
                founder_id,
                delivery_address: Some("12 Jalan Ampang, Kuala Lumpur".to_string()),
            })
            .await
            .expect("failed to seed order")
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

/// Parses a JSON money field (serialized as a decimal string) for numeric
/// comparison regardless of scale ("110" vs "110.00").
pub fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .expect("parse decimal")
}

/// Reads a response body as JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

fn test_config(platform_account_id: Uuid) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        platform_account_id,
        payout_base_url: "http://localhost:0".to_string(),
        payout_api_key: String::new(),
        media_storage_api_key: String::new(),
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
        event_channel_capacity: 64,
        api_default_page_size: 20,
        api_max_page_size: 100,
    }
}
