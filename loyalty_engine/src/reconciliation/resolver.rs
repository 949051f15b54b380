use log::*;
use loyalty_common::Points;

use crate::{
    accrual::AccrualResponse,
    db_types::{Order, OrderStatusType, Transition},
    traits::{OrderStore, ResolutionOutcome, StoreError},
};

/// What applying an accrual response to an order did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The order was processed and its accrual was added to the owner's balance.
    Credited { owner: String, amount: Points },
    /// The order moved to a new status, without any balance effect.
    Updated { status: OrderStatusType },
    /// Nothing was written.
    Unchanged,
    /// The response asked for a status change that is not allowed. Nothing was written.
    Rejected { from: OrderStatusType, to: OrderStatusType },
}

/// Applies accrual service responses to orders.
///
/// The resolver checks the transition table against its view of the order before writing, and the store guards the
/// write on the order's current status, so a stale view or a replayed response can never move an order backwards or
/// credit a balance twice.
#[derive(Debug, Clone)]
pub struct StatusResolver<S> {
    store: S,
}

impl<S> StatusResolver<S>
where S: OrderStore
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn apply(&self, order: &Order, response: &AccrualResponse) -> Result<Resolution, StoreError> {
        let (status, accrual) = match response {
            AccrualResponse::Resolved { status, accrual } => (status.target_status(), *accrual),
            AccrualResponse::Unknown | AccrualResponse::RateLimited { .. } | AccrualResponse::Unavailable(_) => {
                trace!("⚖️ No resolution for order {} from {response:?}", order.number);
                return Ok(Resolution::Unchanged);
            },
        };
        match order.status.transition_to(status) {
            Transition::NoOp => {
                trace!("⚖️ Order {} is still {status}", order.number);
                Ok(Resolution::Unchanged)
            },
            Transition::Forbidden => {
                warn!(
                    "⚖️ The accrual service reported {status} for order {}, which is {}. This transition is not allowed. \
                     Ignoring it.",
                    order.number, order.status
                );
                Ok(Resolution::Rejected { from: order.status, to: status })
            },
            Transition::Apply => {
                let outcome = self.store.apply_resolution(&order.number, status, accrual).await?;
                let resolution = match outcome {
                    ResolutionOutcome::Applied { owner, status: OrderStatusType::Processed, credited } => {
                        info!("⚖️ Order {} processed. {credited} points credited to {owner}", order.number);
                        Resolution::Credited { owner, amount: credited }
                    },
                    ResolutionOutcome::Applied { status, .. } => {
                        debug!("⚖️ Order {} is now {status}", order.number);
                        Resolution::Updated { status }
                    },
                    ResolutionOutcome::NotApplicable => {
                        debug!("⚖️ Order {} was resolved by someone else in the meantime", order.number);
                        Resolution::Unchanged
                    },
                };
                Ok(resolution)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mockall::{mock, predicate::eq};

    use super::*;
    use crate::{accrual::AccrualStatus, db_types::OrderNumber};

    mock! {
        pub Store {}
        impl OrderStore for Store {
            async fn list_pending(&self) -> Result<Vec<Order>, StoreError>;
            async fn apply_resolution(
                &self,
                number: &OrderNumber,
                new_status: OrderStatusType,
                accrual: Points,
            ) -> Result<ResolutionOutcome, StoreError>;
            async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, StoreError>;
        }
    }

    fn order(status: OrderStatusType) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            number: "12345678903".parse().unwrap(),
            owner: "alice".into(),
            status,
            accrual: Points::default(),
            uploaded_at: now,
            updated_at: now,
        }
    }

    fn resolved(status: AccrualStatus, accrual: i64) -> AccrualResponse {
        AccrualResponse::Resolved { status, accrual: Points::from_whole(accrual) }
    }

    #[tokio::test]
    async fn processed_credits_owner() {
        let mut store = MockStore::new();
        let number: OrderNumber = "12345678903".parse().unwrap();
        store
            .expect_apply_resolution()
            .with(eq(number), eq(OrderStatusType::Processed), eq(Points::from_whole(500)))
            .times(1)
            .returning(|_, status, credited| Ok(ResolutionOutcome::Applied { owner: "alice".into(), status, credited }));
        let resolver = StatusResolver::new(store);
        let res = resolver.apply(&order(OrderStatusType::New), &resolved(AccrualStatus::Processed, 500)).await.unwrap();
        assert_eq!(res, Resolution::Credited { owner: "alice".into(), amount: Points::from_whole(500) });
    }

    #[tokio::test]
    async fn processing_and_invalid_update_status() {
        let mut store = MockStore::new();
        store
            .expect_apply_resolution()
            .times(2)
            .returning(|_, status, _| Ok(ResolutionOutcome::Applied { owner: "alice".into(), status, credited: Points::default() }));
        let resolver = StatusResolver::new(store);
        let res = resolver.apply(&order(OrderStatusType::New), &resolved(AccrualStatus::Processing, 0)).await.unwrap();
        assert_eq!(res, Resolution::Updated { status: OrderStatusType::Processing });
        let res =
            resolver.apply(&order(OrderStatusType::Processing), &resolved(AccrualStatus::Invalid, 0)).await.unwrap();
        assert_eq!(res, Resolution::Updated { status: OrderStatusType::Invalid });
    }

    #[tokio::test]
    async fn no_writes_for_non_answers() {
        // No expectations: any store call panics
        let resolver = StatusResolver::new(MockStore::new());
        let o = order(OrderStatusType::New);
        for response in [
            AccrualResponse::Unknown,
            AccrualResponse::RateLimited { retry_after: Some(60) },
            AccrualResponse::Unavailable("connection refused".into()),
            resolved(AccrualStatus::Registered, 0),
        ] {
            assert_eq!(resolver.apply(&o, &response).await.unwrap(), Resolution::Unchanged);
        }
        let o = order(OrderStatusType::Processing);
        let res = resolver.apply(&o, &resolved(AccrualStatus::Processing, 0)).await.unwrap();
        assert_eq!(res, Resolution::Unchanged);
    }

    #[tokio::test]
    async fn forbidden_transitions_are_rejected() {
        let resolver = StatusResolver::new(MockStore::new());
        let res =
            resolver.apply(&order(OrderStatusType::Processing), &resolved(AccrualStatus::Registered, 0)).await.unwrap();
        assert_eq!(res, Resolution::Rejected { from: OrderStatusType::Processing, to: OrderStatusType::New });
        let res =
            resolver.apply(&order(OrderStatusType::Processed), &resolved(AccrualStatus::Processed, 10)).await.unwrap();
        assert_eq!(res, Resolution::Rejected { from: OrderStatusType::Processed, to: OrderStatusType::Processed });
        let res = resolver.apply(&order(OrderStatusType::Invalid), &resolved(AccrualStatus::Processing, 0)).await.unwrap();
        assert_eq!(res, Resolution::Rejected { from: OrderStatusType::Invalid, to: OrderStatusType::Processing });
    }

    #[tokio::test]
    async fn lost_race_is_unchanged() {
        let mut store = MockStore::new();
        store.expect_apply_resolution().times(1).returning(|_, _, _| Ok(ResolutionOutcome::NotApplicable));
        let resolver = StatusResolver::new(store);
        let res = resolver.apply(&order(OrderStatusType::New), &resolved(AccrualStatus::Processed, 5)).await.unwrap();
        assert_eq!(res, Resolution::Unchanged);
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let mut store = MockStore::new();
        store
            .expect_apply_resolution()
            .times(1)
            .returning(|_, _, _| Err(StoreError::DatabaseError("disk on fire".into())));
        let resolver = StatusResolver::new(store);
        let res = resolver.apply(&order(OrderStatusType::New), &resolved(AccrualStatus::Invalid, 0)).await;
        assert!(matches!(res, Err(StoreError::DatabaseError(_))));
    }
}
