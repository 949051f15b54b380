//! #  Storage backends
//!
//! This module provides the interfaces that define the contracts of the loyalty engine storage *backends*.
//!
//! * [`OrderStore`] is everything the reconciliation engine needs: the set of unresolved orders, and an atomic,
//!   status-guarded update that resolves an order and (if the order was processed) credits its owner in the same unit
//!   of work.
//! * [`AccountManagement`] serves the request side of the backend: accepting new orders, and querying and spending
//!   balances.
mod account_management;
mod data_objects;
mod order_store;
mod store_error;

pub use account_management::AccountManagement;
pub use data_objects::{InsertOrderResult, ResolutionOutcome};
pub use order_store::OrderStore;
pub use store_error::StoreError;
