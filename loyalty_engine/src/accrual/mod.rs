//! # Accrual service client
//!
//! The accrual service is an external, independently operated system that decides how many points each purchase
//! order is worth. It is slow, and it may refuse to answer (rate limiting) or be unreachable for a while.
//!
//! [`AccrualService`] is the seam the reconciliation engine talks through. [`AccrualClient`] is the HTTP
//! implementation. Every outcome of a query, including transport failures and garbage responses, is collapsed into
//! an [`AccrualResponse`], so callers never have to deal with errors from this layer.
use loyalty_common::Points;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderNumber, OrderStatusType};

mod client;

pub use client::{AccrualClient, AccrualClientConfig, AccrualClientError};

/// The order statuses reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The order is known to the service, but calculation has not started.
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl AccrualStatus {
    /// The local order status this report corresponds to. A registered order is still `NEW` as far as we are concerned.
    pub fn target_status(&self) -> OrderStatusType {
        match self {
            AccrualStatus::Registered => OrderStatusType::New,
            AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
            AccrualStatus::Processed => OrderStatusType::Processed,
        }
    }
}

/// The outcome of a single status query against the accrual service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualResponse {
    /// The service reported a status for the order. `accrual` is zero unless the order has been processed.
    Resolved { status: AccrualStatus, accrual: Points },
    /// The service does not know about this order (yet).
    Unknown,
    /// The service asked us to back off. `retry_after` is in seconds, if the service said how long to wait.
    RateLimited { retry_after: Option<u64> },
    /// The query failed, or the response could not be understood.
    Unavailable(String),
}

impl AccrualResponse {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AccrualResponse::RateLimited { .. })
    }
}

/// Anything that can report the accrual status of an order.
///
/// Implementations must not have side effects beyond the query itself, and must not fail: every problem is reported
/// as [`AccrualResponse::Unavailable`].
#[allow(async_fn_in_trait)]
pub trait AccrualService {
    async fn query(&self, number: &OrderNumber) -> AccrualResponse;
}
