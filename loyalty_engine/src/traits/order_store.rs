use loyalty_common::Points;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType},
    traits::{ResolutionOutcome, StoreError},
};

/// The storage behaviour consumed by the reconciliation engine.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Fetches every order that is still `NEW` or `PROCESSING`, oldest upload first.
    async fn list_pending(&self) -> Result<Vec<Order>, StoreError>;

    /// Resolves an order, in a single atomic unit of work:
    /// * The order's status is set to `new_status`, but only if the current status is one of
    ///   [`OrderStatusType::predecessors`] of `new_status`. Otherwise nothing is written and
    ///   [`ResolutionOutcome::NotApplicable`] is returned.
    /// * If `new_status` is `Processed`, the order's accrual is set to `accrual`, and the same amount is added to the
    ///   owner's current balance. For any other status `accrual` is ignored.
    ///
    /// Because the write is guarded on the current status, replaying a resolution is a no-op.
    async fn apply_resolution(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
        accrual: Points,
    ) -> Result<ResolutionOutcome, StoreError>;

    /// Fetches a single order by number. If it does not exist, `None` is returned.
    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, StoreError>;
}
