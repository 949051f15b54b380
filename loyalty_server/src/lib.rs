//! # Loyalty points server
//! This crate hosts the server for the loyalty points backend. It is responsible for:
//! * Accepting purchase order numbers from users, and serving their order lists, balances and withdrawals.
//! * Running the accrual worker, a background task that reconciles every unresolved order with the external accrual
//!   service and credits balances when orders are processed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/{login}/orders`: Submit (POST) and list (GET) orders.
//! * `/api/user/{login}/balance`: The user's current balance and withdrawn total.
//! * `/api/user/{login}/balance/withdraw`: Spend points against an order number.
//! * `/api/user/{login}/withdrawals`: The user's withdrawal history.
pub mod accrual_worker;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
