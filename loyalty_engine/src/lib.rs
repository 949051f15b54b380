//! Loyalty Engine
//!
//! The loyalty engine holds the core logic for the loyalty points backend: users submit purchase order numbers, and
//! an external, independently operated accrual service decides how many points each order is worth. This library is
//! responsible for storing orders and balances, and for reconciling the state of every unresolved order with the
//! accrual service.
//!
//! The library is divided into the following sections:
//! 1. Storage ([`traits`] and the SQLite backend). Backends implement [`OrderStore`], which is all the reconciliation
//!    engine needs, and [`AccountManagement`], which serves the user-facing order intake and balance queries.
//!    The data types used in storage are defined in [`db_types`] and are public.
//! 2. The accrual service client ([`accrual`]). [`AccrualClient`] issues one status query per order and collapses
//!    every transport or protocol outcome into an [`AccrualResponse`].
//! 3. Reconciliation ([`reconciliation`]). The [`PollScheduler`] decides which pending orders may be queried and owns
//!    the process-wide poll deadline imposed by rate limiting. The [`StatusResolver`] applies a single accrual response
//!    to a single order, crediting the owner's balance exactly once when an order is processed.
//! 4. The public API ([`OrdersApi`] and [`BalanceApi`]) used by the request-serving side of the backend.
//!
//! Driving the reconciliation loop is left to the host process; see the `loyalty_server` crate.
pub mod accrual;
pub mod db_types;
pub mod helpers;
pub mod reconciliation;
pub mod traits;

mod lpe_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use accrual::{
    AccrualClient,
    AccrualClientConfig,
    AccrualClientError,
    AccrualResponse,
    AccrualService,
    AccrualStatus,
};
pub use lpe_api::{
    balance_api::BalanceApi,
    errors::{BalanceApiError, OrdersApiError},
    orders_api::OrdersApi,
};
pub use reconciliation::{PollScheduler, Resolution, StatusResolver};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AccountManagement, InsertOrderResult, OrderStore, ResolutionOutcome, StoreError};
