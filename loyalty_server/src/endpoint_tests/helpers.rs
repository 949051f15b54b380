use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use loyalty_common::Points;
use loyalty_engine::db_types::{Order, OrderStatusType, UserBalance};
use serde_json::Value;

pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), configure).await
}

pub async fn post_text<F>(path: &str, body: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post().uri(path).insert_header(ContentType::plaintext()).set_payload(body.to_string());
    send_request(req, configure).await
}

pub async fn post_json<F>(path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::post().uri(path).set_json(body), configure).await
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Invalid JSON response: {body}. {e}"))
}

pub fn order(id: i64, number: &str, owner: &str, status: OrderStatusType, accrual: Points) -> Order {
    let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Order { id, number: number.parse().unwrap(), owner: owner.into(), status, accrual, uploaded_at: t, updated_at: t }
}

pub fn balance(owner: &str, current: Points, withdrawn: Points) -> UserBalance {
    let mut balance = UserBalance::empty(owner);
    balance.current_balance = current;
    balance.total_withdrawn = withdrawn;
    balance
}
