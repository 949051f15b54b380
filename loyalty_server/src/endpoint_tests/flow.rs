//! End-to-end request flows against a real database.
use actix_web::{http::StatusCode, web, web::ServiceConfig};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType},
    test_utils::prepare_test_db,
    BalanceApi,
    OrderStore,
    OrdersApi,
    SqliteDatabase,
};
use serde_json::json as js;

use super::helpers::{get_request, json, post_json, post_text};
use crate::routes::{BalanceRoute, OrdersRoute, SubmitOrderRoute, WithdrawRoute, WithdrawalsRoute};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(OrdersApi::new(db.clone())))
            .app_data(web::Data::new(BalanceApi::new(db)))
            .service(
                web::scope("/api")
                    .service(SubmitOrderRoute::<SqliteDatabase>::new())
                    .service(OrdersRoute::<SqliteDatabase>::new())
                    .service(BalanceRoute::<SqliteDatabase>::new())
                    .service(WithdrawRoute::<SqliteDatabase>::new())
                    .service(WithdrawalsRoute::<SqliteDatabase>::new()),
            );
    }
}

#[actix_web::test]
async fn submit_process_and_spend() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;

    let (status, _) = post_text("/api/user/alice/orders", "12345678903", configure(db.clone())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = post_text("/api/user/alice/orders", "12345678903", configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_text("/api/user/bob/orders", "12345678903", configure(db.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = get_request("/api/user/bob/orders", configure(db.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The accrual worker would do this
    let number = "12345678903".parse::<OrderNumber>().unwrap();
    db.apply_resolution(&number, OrderStatusType::Processed, Points::from_whole(500)).await.unwrap();

    let (status, body) = get_request("/api/user/alice/orders", configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    assert_eq!(orders[0]["status"], "PROCESSED");
    assert_eq!(orders[0]["accrual"], js!(500.0));

    let body = js!({"order": "2377225624", "sum": 500});
    let (status, body) = post_json("/api/user/alice/balance/withdraw", body, configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), js!({"current": 0.0, "withdrawn": 500.0}));

    let body = js!({"order": "9278923470", "sum": 0.01});
    let (status, _) = post_json("/api/user/alice/balance/withdraw", body, configure(db.clone())).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let (status, body) = get_request("/api/user/alice/withdrawals", configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let withdrawals = json(&body);
    assert_eq!(withdrawals.as_array().map(Vec::len), Some(1));
    assert_eq!(withdrawals[0]["order"], "2377225624");

    let (status, body) = get_request("/api/user/alice/balance", configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), js!({"current": 0.0, "withdrawn": 500.0}));
}
