mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, SqlErr};
use serde_json::json;
use uuid::Uuid;

use common::{read_json, TestApp};
use talentlink_api::entities::{
    campaign::{RateLevel, VideoDuration},
    order::{self, OrderStatus},
    profile::ProfileRole,
};

#[tokio::test]
async fn order_walks_the_full_fulfillment_chain() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let campaign = app
        .seed_campaign(founder, RateLevel::Level1, VideoDuration::ThirtySeconds)
        .await;

    // Create: payout frozen from the campaign price at creation time
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "campaign_id": campaign.id,
                "talent_id": talent,
                "founder_id": founder,
                "delivery_address": "12 Jalan Ampang, Kuala Lumpur"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending_shipment");
    assert_eq!(body["data"]["payout"], "100");

    // Ship
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/shipment"),
            Some(json!({
                "founder_id": founder,
                "tracking_number": "MY123456789",
                "courier": "PosLaju"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "shipped");
    assert_eq!(body["data"]["tracking_number"], "MY123456789");

    // Deliver
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/delivered"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "delivered");

    // Review
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/review"),
            Some(json!({
                "talent_id": talent,
                "media": [
                    {"url": "https://cdn.example.com/reviews/clip.mp4", "media_type": "video"}
                ],
                "notes": "Uploaded the 30s cut"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "review_submitted");
    assert_eq!(
        body["data"]["review_submission"][0]["url"],
        "https://cdn.example.com/reviews/clip.mp4"
    );

    // Version increments once per transition
    assert_eq!(body["data"]["version"], 4);
}

#[tokio::test]
async fn skipping_states_is_rejected() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let campaign = app
        .seed_campaign(founder, RateLevel::Level1, VideoDuration::ThirtySeconds)
        .await;
    let order = app.seed_order(campaign.id, talent, founder).await;

    // pending_shipment → delivered is not a legal edge
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/delivered", order.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Neither is submitting a review before delivery
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/review", order.id),
            Some(json!({
                "talent_id": talent,
                "media": [{"url": "https://cdn.example.com/x.jpg", "media_type": "image"}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_active_order_for_campaign_and_talent_conflicts() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let campaign = app
        .seed_campaign(founder, RateLevel::Level2, VideoDuration::OneMinute)
        .await;
    app.seed_order(campaign.id, talent, founder).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "campaign_id": campaign.id,
                "talent_id": talent,
                "founder_id": founder
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn schema_blocks_a_second_active_order_without_the_service_check() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let campaign = app
        .seed_campaign(founder, RateLevel::Level1, VideoDuration::ThirtySeconds)
        .await;
    let existing = app.seed_order(campaign.id, talent, founder).await;
    let db = &*app.state.db;

    // A raw insert that bypasses the service-level duplicate check still
    // fails on the partial unique index, so racing creates cannot both land.
    let now = Utc::now();
    let duplicate = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        campaign_id: Set(campaign.id),
        talent_id: Set(talent),
        founder_id: Set(founder),
        status: Set(OrderStatus::PendingShipment),
        payout: Set(dec!(100)),
        delivery_address: Set(None),
        tracking_number: Set(None),
        courier: Set(None),
        review_submission: Set(None),
        review_submitted_at: Set(None),
        review_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(Some(now)),
        version: Set(1),
    };
    let err = duplicate.insert(db).await.unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));

    // A completed order does not block a new engagement.
    let model = order::Entity::find_by_id(existing.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut completed: order::ActiveModel = model.into();
    completed.status = Set(OrderStatus::Completed);
    completed.update(db).await.unwrap();

    app.seed_order(campaign.id, talent, founder).await;
}

#[tokio::test]
async fn shipment_by_wrong_founder_is_forbidden() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let other = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let campaign = app
        .seed_campaign(founder, RateLevel::Level1, VideoDuration::ThreeMinutes)
        .await;
    let order = app.seed_order(campaign.id, talent, founder).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/shipment", order.id),
            Some(json!({
                "founder_id": other,
                "tracking_number": "MY1",
                "courier": "PosLaju"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn campaign_price_table_drives_order_payout() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(5000), dec!(0)).await;

    for (level, duration, expected) in [
        (RateLevel::Level1, VideoDuration::OneMinute, "150"),
        (RateLevel::Level2, VideoDuration::ThreeMinutes, "500"),
        (RateLevel::Level3, VideoDuration::ThirtySeconds, "500"),
        (RateLevel::Level3, VideoDuration::ThreeMinutes, "1000"),
    ] {
        let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
        let campaign = app.seed_campaign(founder, level, duration).await;
        assert_eq!(campaign.price.to_string(), expected);

        let order = app.seed_order(campaign.id, talent, founder).await;
        assert_eq!(order.payout.to_string(), expected);
    }
}

#[tokio::test]
async fn listing_filters_by_talent_and_status() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(500), dec!(0)).await;
    let talent_a = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let talent_b = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(0)).await;
    let campaign = app
        .seed_campaign(founder, RateLevel::Level1, VideoDuration::ThirtySeconds)
        .await;
    let order_a = app.seed_order(campaign.id, talent_a, founder).await;
    app.seed_order(campaign.id, talent_b, founder).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders?talent_id={talent_a}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["orders"][0]["id"], order_a.id.to_string());

    let response = app
        .request(
            Method::GET,
            "/api/v1/orders?status=pending_shipment",
            None,
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 2);
}
