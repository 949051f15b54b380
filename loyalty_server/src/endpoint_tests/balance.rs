use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{NewWithdrawal, OrderNumber, Withdrawal},
    BalanceApi,
    StoreError,
};
use mockall::predicate::eq;
use serde_json::json as js;

use super::{
    helpers::{balance, get_request, json, post_json},
    mocks::MockAccountManager,
};
use crate::routes::{BalanceRoute, WithdrawRoute, WithdrawalsRoute};

fn configure(db: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = BalanceApi::new(db);
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/api")
                .service(BalanceRoute::<MockAccountManager>::new())
                .service(WithdrawRoute::<MockAccountManager>::new())
                .service(WithdrawalsRoute::<MockAccountManager>::new()),
        );
    }
}

#[actix_web::test]
async fn fetch_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_balance()
        .with(eq("alice"))
        .times(1)
        .returning(|owner| Ok(Some(balance(owner, Points::from(50050), Points::from_whole(42)))));
    let (status, body) = get_request("/api/user/alice/balance", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), js!({"current": 500.5, "withdrawn": 42.0}));
}

#[actix_web::test]
async fn unknown_users_have_an_empty_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_balance().times(1).returning(|_| Ok(None));
    let (status, body) = get_request("/api/user/nobody/balance", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), js!({"current": 0.0, "withdrawn": 0.0}));
}

#[actix_web::test]
async fn withdraw() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    let expected = NewWithdrawal::new("2377225624".parse::<OrderNumber>().unwrap(), Points::from_whole(751));
    db.expect_withdraw()
        .with(eq("alice"), eq(expected))
        .times(1)
        .returning(|owner, _| Ok(balance(owner, Points::from(4950), Points::from_whole(751))));
    let body = js!({"order": "2377225624", "sum": 751});
    let (status, body) = post_json("/api/user/alice/balance/withdraw", body, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), js!({"current": 49.5, "withdrawn": 751.0}));
}

#[actix_web::test]
async fn withdraw_more_than_the_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_withdraw().times(1).returning(|_, w| {
        Err(StoreError::InsufficientFunds { available: Points::from_whole(10), requested: w.amount })
    });
    let body = js!({"order": "2377225624", "sum": 10.01});
    let (status, body) = post_json("/api/user/alice/balance/withdraw", body, configure(db)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json(&body)["error"], "Insufficient funds. 10.01 was requested, but only 10.00 is available");
}

#[actix_web::test]
async fn withdraw_against_an_invalid_order_number() {
    let _ = env_logger::try_init().ok();
    // The backend is never reached
    let db = MockAccountManager::new();
    let body = js!({"order": "2377225625", "sum": 1});
    let (status, _) = post_json("/api/user/alice/balance/withdraw", body, configure(db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn withdraw_nothing() {
    let _ = env_logger::try_init().ok();
    let db = MockAccountManager::new();
    let body = js!({"order": "2377225624", "sum": 0});
    let (status, _) = post_json("/api/user/alice/balance/withdraw", body, configure(db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn withdraw_twice_against_one_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_withdraw().times(1).returning(|_, w| Err(StoreError::DuplicateWithdrawal(w.order_number)));
    let body = js!({"order": "2377225624", "sum": 5});
    let (status, _) = post_json("/api/user/alice/balance/withdraw", body, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdrawal_history() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_withdrawals_for_user().with(eq("alice")).times(1).returning(|owner| {
        Ok(vec![Withdrawal {
            id: 1,
            owner: owner.to_string(),
            order_number: "2377225624".parse().unwrap(),
            amount: Points::from_whole(500),
            processed_at: Utc.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap(),
        }])
    });
    let (status, body) = get_request("/api/user/alice/withdrawals", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), js!([{"order": "2377225624", "sum": 500.0, "processed_at": "2024-06-02T09:30:00Z"}]));
}

#[actix_web::test]
async fn no_withdrawals_is_no_content() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_withdrawals_for_user().times(1).returning(|_| Ok(vec![]));
    let (status, _) = get_request("/api/user/bob/withdrawals", configure(db)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
