//! # Reconciliation
//!
//! Orders sit in `NEW` or `PROCESSING` until the accrual service says otherwise. Reconciliation is the process of
//! repeatedly asking the accrual service about every unresolved order and folding its answers back into the store.
//!
//! * [`PollScheduler`] picks which orders are eligible for a query, in which order, and holds the poll deadline: the
//!   instant before which nobody may query the accrual service because it told us to back off.
//! * [`StatusResolver`] applies one accrual response to one order.
//!
//! The loop that ties these together with an [`crate::AccrualService`] lives in the host process.
mod resolver;
mod scheduler;

pub use resolver::{Resolution, StatusResolver};
pub use scheduler::{PollScheduler, DEFAULT_RETRY_AFTER};
