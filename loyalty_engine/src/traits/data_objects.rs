use loyalty_common::Points;

use crate::db_types::{Order, OrderStatusType};

/// The result of submitting an order number for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order is new, and has been stored with `NEW` status.
    Inserted(Order),
    /// The same user submitted this order number before. Nothing was changed.
    AlreadySubmitted(Order),
    /// Order numbers are unique across all users, and this one belongs to someone else. Nothing was changed.
    OwnedByAnotherUser,
}

/// The result of a status-guarded resolution write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The order moved to `status`, and `credited` points were added to `owner`'s balance in the same transaction.
    Applied { owner: String, status: OrderStatusType, credited: Points },
    /// The order was not in one of the states the new status may be reached from (e.g. it has already been resolved),
    /// so nothing was written.
    NotApplicable,
}
