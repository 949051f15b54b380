use actix_web::{http::StatusCode, web, web::ServiceConfig};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType},
    InsertOrderResult,
    OrdersApi,
    StoreError,
};
use mockall::predicate::eq;

use super::{
    helpers::{get_request, json, order, post_text},
    mocks::MockAccountManager,
};
use crate::routes::{OrdersRoute, SubmitOrderRoute};

fn configure(db: MockAccountManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = OrdersApi::new(db);
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/api")
                .service(SubmitOrderRoute::<MockAccountManager>::new())
                .service(OrdersRoute::<MockAccountManager>::new()),
        );
    }
}

#[actix_web::test]
async fn new_order_is_accepted() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_submit_order()
        .with(eq("alice"), eq("12345678903".parse::<OrderNumber>().unwrap()))
        .times(1)
        .returning(|owner, number| {
            let o = order(1, number.as_str(), owner, OrderStatusType::New, Points::default());
            Ok(InsertOrderResult::Inserted(o))
        });
    let (status, body) = post_text("/api/user/alice/orders", "12345678903\n", configure(db)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let body = json(&body);
    assert_eq!(body["number"], "12345678903");
    assert_eq!(body["status"], "NEW");
    assert!(body.get("accrual").is_none());
}

#[actix_web::test]
async fn resubmitted_order_is_ok() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_submit_order().times(1).returning(|owner, number| {
        let o = order(1, number.as_str(), owner, OrderStatusType::Processing, Points::default());
        Ok(InsertOrderResult::AlreadySubmitted(o))
    });
    let (status, body) = post_text("/api/user/alice/orders", "12345678903", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "PROCESSING");
}

#[actix_web::test]
async fn someone_elses_order_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_submit_order().times(1).returning(|_, _| Ok(InsertOrderResult::OwnedByAnotherUser));
    let (status, body) = post_text("/api/user/mallory/orders", "12345678903", configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "Order 12345678903 has already been submitted by another user");
}

#[actix_web::test]
async fn invalid_order_numbers_are_unprocessable() {
    let _ = env_logger::try_init().ok();
    for number in ["12345678901", "1234-5678", ""] {
        // The backend is never reached
        let db = MockAccountManager::new();
        let (status, _) = post_text("/api/user/alice/orders", number, configure(db)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{number}");
    }
}

#[actix_web::test]
async fn list_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_orders_for_user().with(eq("alice")).times(1).returning(|owner| {
        Ok(vec![
            order(2, "79927398713", owner, OrderStatusType::Processed, Points::from(72998)),
            order(1, "12345678903", owner, OrderStatusType::Invalid, Points::default()),
        ])
    });
    let (status, body) = get_request("/api/user/alice/orders", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"[{"number":"79927398713","status":"PROCESSED","accrual":729.98,"uploaded_at":"2024-06-01T12:00:00Z"},{"number":"12345678903","status":"INVALID","uploaded_at":"2024-06-01T12:00:00Z"}]"#
    );
}

#[actix_web::test]
async fn no_orders_is_no_content() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_orders_for_user().times(1).returning(|_| Ok(vec![]));
    let (status, body) = get_request("/api/user/bob/orders", configure(db)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn backend_errors_are_server_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAccountManager::new();
    db.expect_fetch_orders_for_user().times(1).returning(|_| Err(StoreError::DatabaseError("database is locked".into())));
    let (status, body) = get_request("/api/user/bob/orders", configure(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("database is locked"));
}
