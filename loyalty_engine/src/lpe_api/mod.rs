//! # Loyalty engine public API
//!
//! The `lpe_api` module exposes the programmatic API used by the request-serving side of the backend.
//!
//! * [`orders_api`] accepts order numbers from users and lists their orders.
//! * [`balance_api`] reports balances and spends points.
//!
//! As with the storage traits, an API instance is created by supplying a backend that implements
//! [`crate::AccountManagement`]:
//!
//! ```rust,ignore
//! use loyalty_engine::{OrdersApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrdersApi::new(db);
//! let result = api.submit_order("alice", "12345678903").await?;
//! ```
pub mod balance_api;
pub mod errors;
pub mod orders_api;
