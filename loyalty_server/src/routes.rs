//! Request handler definitions
//!
//! Define each route and its handler here. Every user-facing route is scoped by the user's login. Authentication is
//! handled upstream of this server, so the login in the path is trusted.
//!
//! Handlers must never block the worker thread. Anything that touches the database is async.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use loyalty_engine::{traits::InsertOrderResult, AccountManagement, BalanceApi, OrdersApi};

use crate::{
    data_objects::{BalanceResult, OrderResult, WithdrawRequest, WithdrawalResult},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/user/{login}/orders" impl AccountManagement);
/// Submits a purchase order number for the user. The body is the order number as plain text.
///
/// * `202 Accepted`: the order is new, and will be reconciled with the accrual service in the background.
/// * `200 OK`: this user has already submitted this order.
/// * `409 Conflict`: another user has already submitted this order.
/// * `422 Unprocessable Entity`: the order number is not a valid (Luhn checksummed) number.
pub async fn submit_order<B: AccountManagement>(
    path: web::Path<String>,
    body: String,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let login = path.into_inner();
    let number = body.trim();
    debug!("💻️ POST order {number} for {login}");
    match api.submit_order(&login, number).await? {
        InsertOrderResult::Inserted(order) => Ok(HttpResponse::Accepted().json(OrderResult::from(order))),
        InsertOrderResult::AlreadySubmitted(order) => Ok(HttpResponse::Ok().json(OrderResult::from(order))),
        InsertOrderResult::OwnedByAnotherUser => Err(ServerError::OrderOwnedByAnotherUser(number.to_string())),
    }
}

route!(orders => Get "/user/{login}/orders" impl AccountManagement);
/// All the user's orders, newest first. `204 No Content` if there are none.
pub async fn orders<B: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let login = path.into_inner();
    debug!("💻️ GET orders for {login}");
    let orders = api.orders_for_user(&login).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let result = orders.into_iter().map(OrderResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(balance => Get "/user/{login}/balance" impl AccountManagement);
pub async fn balance<B: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let login = path.into_inner();
    debug!("💻️ GET balance for {login}");
    let balance = api.balance(&login).await?;
    Ok(HttpResponse::Ok().json(BalanceResult::from(balance)))
}

route!(withdraw => Post "/user/{login}/balance/withdraw" impl AccountManagement);
/// Spends points against an order number.
///
/// * `200 OK`: the points were withdrawn. The body holds the new balance.
/// * `402 Payment Required`: the balance is too low.
/// * `409 Conflict`: points have already been spent against this order number.
/// * `422 Unprocessable Entity`: the order number or the amount is invalid.
pub async fn withdraw<B: AccountManagement>(
    path: web::Path<String>,
    body: web::Json<WithdrawRequest>,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let login = path.into_inner();
    let WithdrawRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} points against order {order} for {login}");
    let balance = api.withdraw(&login, &order, sum).await?;
    Ok(HttpResponse::Ok().json(BalanceResult::from(balance)))
}

route!(withdrawals => Get "/user/{login}/withdrawals" impl AccountManagement);
/// The user's withdrawal history, newest first. `204 No Content` if there is none.
pub async fn withdrawals<B: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let login = path.into_inner();
    debug!("💻️ GET withdrawals for {login}");
    let withdrawals = api.withdrawals(&login).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let result = withdrawals.into_iter().map(WithdrawalResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(result))
}
