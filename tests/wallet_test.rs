mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use common::{money, read_json, PayoutBehavior, TestApp};
use talentlink_api::entities::{
    profile::{Entity as ProfileEntity, ProfileRole},
    transaction::{self, Entity as TransactionEntity, EntryType, TransactionCategory},
    withdrawal::{Entity as WithdrawalEntity, WithdrawalStatus},
};

#[tokio::test]
async fn top_up_credits_wallet_and_writes_ledger_entry() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(40), dec!(0)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/wallet/topup",
            Some(json!({
                "founder_id": founder,
                "amount": "200",
                "charge_reference": "ch_abc123"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(money(&body["data"]["wallet_balance"]), dec!(240));

    let entries = TransactionEntity::find()
        .filter(transaction::Column::UserId.eq(founder))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, EntryType::Credit);
    assert_eq!(entries[0].category, TransactionCategory::WalletTopup);
    assert_eq!(entries[0].amount, dec!(200));
    assert!(entries[0].description.contains("ch_abc123"));
}

#[tokio::test]
async fn top_up_rejects_non_positive_amounts() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(0), dec!(0)).await;

    for amount in ["0", "-50"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/wallet/topup",
                Some(json!({
                    "founder_id": founder,
                    "amount": amount,
                    "charge_reference": "ch_x"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn withdrawal_pays_net_amount_and_splits_the_fee() {
    let app = TestApp::new().await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(80)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/withdrawals",
            Some(json!({
                "talent_id": talent,
                "amount": "50",
                "bank_name": "Maybank",
                "bank_code": "MBB",
                "account_number": "1234567890",
                "account_holder": "Aisha"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(money(&body["data"]["amount"]), dec!(50));
    assert_eq!(money(&body["data"]["admin_fee"]), dec!(5));
    assert_eq!(money(&body["data"]["net_amount"]), dec!(45));
    assert!(body["data"]["provider_reference"]
        .as_str()
        .unwrap()
        .starts_with("mock-"));

    // The provider was instructed to transfer the net amount once
    let requests = app.payout_provider.recorded_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, dec!(45));
    assert_eq!(requests[0].currency, "MYR");

    // Gross debit for the talent, fee credit for the platform
    let db = &*app.state.db;
    let talent_profile = ProfileEntity::find_by_id(talent).one(db).await.unwrap().unwrap();
    assert_eq!(talent_profile.available_earnings, dec!(30));

    let talent_entries = TransactionEntity::find()
        .filter(transaction::Column::UserId.eq(talent))
        .all(db)
        .await
        .unwrap();
    assert_eq!(talent_entries.len(), 1);
    assert_eq!(talent_entries[0].entry_type, EntryType::Debit);
    assert_eq!(talent_entries[0].category, TransactionCategory::Withdrawal);
    assert_eq!(talent_entries[0].amount, dec!(50));

    let platform_entries = TransactionEntity::find()
        .filter(transaction::Column::UserId.eq(app.platform_account_id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(platform_entries.len(), 1);
    assert_eq!(platform_entries[0].entry_type, EntryType::Credit);
    assert_eq!(platform_entries[0].category, TransactionCategory::AdminFee);
    assert_eq!(platform_entries[0].amount, dec!(5));
}

#[tokio::test]
async fn over_withdrawal_is_rejected_without_any_records() {
    let app = TestApp::new().await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(30)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/withdrawals",
            Some(json!({
                "talent_id": talent,
                "amount": "50",
                "bank_name": "Maybank",
                "bank_code": "MBB",
                "account_number": "1234567890",
                "account_holder": "Aisha"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Provider never called, nothing persisted
    assert!(app.payout_provider.recorded_requests().is_empty());

    let db = &*app.state.db;
    let talent_profile = ProfileEntity::find_by_id(talent).one(db).await.unwrap().unwrap();
    assert_eq!(talent_profile.available_earnings, dec!(30));

    let withdrawals = WithdrawalEntity::find().all(db).await.unwrap();
    assert!(withdrawals.is_empty());
    let entries = TransactionEntity::find()
        .filter(transaction::Column::UserId.eq(talent))
        .all(db)
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn provider_rejection_restores_funds_and_records_the_failure() {
    let app = TestApp::with_payout_behavior(PayoutBehavior::FailTerminal).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(80)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/withdrawals",
            Some(json!({
                "talent_id": talent,
                "amount": "50",
                "bank_name": "Maybank",
                "bank_code": "MBB",
                "account_number": "0000",
                "account_holder": "Aisha"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let db = &*app.state.db;

    // Funds restored by the compensating update
    let talent_profile = ProfileEntity::find_by_id(talent).one(db).await.unwrap().unwrap();
    assert_eq!(talent_profile.available_earnings, dec!(80));

    // The withdrawal survives as an audit record with the provider error
    let withdrawals = WithdrawalEntity::find().all(db).await.unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].status, WithdrawalStatus::Rejected);
    assert!(withdrawals[0]
        .provider_error
        .as_deref()
        .unwrap()
        .contains("invalid bank account"));
    assert!(withdrawals[0].processed_at.is_some());

    // A failed withdrawal leaves no ledger entries
    let entries = TransactionEntity::find().all(db).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn transient_provider_outage_exhausts_retries_and_compensates() {
    let app = TestApp::with_payout_behavior(PayoutBehavior::FailTransient).await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(80)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/withdrawals",
            Some(json!({
                "talent_id": talent,
                "amount": "50",
                "bank_name": "Maybank",
                "bank_code": "MBB",
                "account_number": "1234567890",
                "account_holder": "Aisha"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // Every attempt reached the provider before giving up
    assert_eq!(app.payout_provider.recorded_requests().len(), 3);

    let db = &*app.state.db;
    let talent_profile = ProfileEntity::find_by_id(talent).one(db).await.unwrap().unwrap();
    assert_eq!(talent_profile.available_earnings, dec!(80));

    let withdrawals = WithdrawalEntity::find().all(db).await.unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].status, WithdrawalStatus::Rejected);
    assert!(withdrawals[0]
        .provider_error
        .as_deref()
        .unwrap()
        .contains("connection reset"));

    let entries = TransactionEntity::find().all(db).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn withdrawal_history_and_lookup() {
    let app = TestApp::new().await;
    let talent = app.seed_profile(ProfileRole::Talent, dec!(0), dec!(200)).await;

    for amount in ["50", "30"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/withdrawals",
                Some(json!({
                    "talent_id": talent,
                    "amount": amount,
                    "bank_name": "Maybank",
                    "bank_code": "MBB",
                    "account_number": "1234567890",
                    "account_holder": "Aisha"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/withdrawals?user_id={talent}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let id = body["data"][0]["id"].as_str().unwrap().to_string();
    let response = app
        .request(Method::GET, &format!("/api/v1/withdrawals/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["id"], id);
}

#[tokio::test]
async fn balance_and_transaction_history_endpoints() {
    let app = TestApp::new().await;
    let founder = app.seed_profile(ProfileRole::Founder, dec!(100), dec!(0)).await;

    for reference in ["ch_1", "ch_2", "ch_3"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/wallet/topup",
                Some(json!({
                    "founder_id": founder,
                    "amount": "10",
                    "charge_reference": reference
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .request(Method::GET, &format!("/api/v1/wallet/{founder}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(money(&body["data"]["wallet_balance"]), dec!(130));
    assert_eq!(body["data"]["role"], "founder");

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/wallet/{founder}/transactions?page=1&limit=2"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);
}
