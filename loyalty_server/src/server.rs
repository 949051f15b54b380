use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{AccrualClient, BalanceApi, OrdersApi, SqliteDatabase};
use tokio::sync::watch;

use crate::{
    accrual_worker::start_accrual_worker,
    config::ServerConfig,
    errors::ServerError,
    routes::{health, BalanceRoute, OrdersRoute, SubmitOrderRoute, WithdrawRoute, WithdrawalsRoute},
};

/// Opens the database, starts the accrual worker and serves requests until the server is stopped (e.g. with Ctrl-C).
/// The accrual worker is then asked to stop, and is given the chance to finish its current pass.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let client = AccrualClient::new(config.accrual.client_config())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("📡️ Using the accrual service at {}", config.accrual.base_url);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let worker = start_accrual_worker(db.clone(), client, config.accrual.worker_config(), shutdown_rx);
    let srv = create_server_instance(config, db)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    info!("🔄️ Server stopped. Waiting for the accrual worker to finish");
    if shutdown.send(true).is_err() {
        warn!("🔄️ The accrual worker had already stopped");
    }
    if let Err(e) = worker.await {
        error!("🔄️ The accrual worker did not shut down cleanly. {e}");
    }
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrdersApi::new(db.clone());
        let balance_api = BalanceApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(BalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(WithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lp::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(balance_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
