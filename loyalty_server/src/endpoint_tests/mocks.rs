use loyalty_engine::{
    db_types::{NewWithdrawal, Order, OrderNumber, UserBalance, Withdrawal},
    AccountManagement,
    InsertOrderResult,
    StoreError,
};
use mockall::mock;

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn submit_order(&self, owner: &str, number: &OrderNumber) -> Result<InsertOrderResult, StoreError>;
        async fn fetch_orders_for_user(&self, owner: &str) -> Result<Vec<Order>, StoreError>;
        async fn fetch_balance(&self, owner: &str) -> Result<Option<UserBalance>, StoreError>;
        async fn withdraw(&self, owner: &str, withdrawal: NewWithdrawal) -> Result<UserBalance, StoreError>;
        async fn fetch_withdrawals_for_user(&self, owner: &str) -> Result<Vec<Withdrawal>, StoreError>;
    }
}
