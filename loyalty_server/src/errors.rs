use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use loyalty_engine::{BalanceApiError, OrdersApiError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(String),
    #[error("Invalid amount. {0}")]
    InvalidAmount(String),
    #[error("Order {0} has already been submitted by another user")]
    OrderOwnedByAnotherUser(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    DuplicateWithdrawal(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderOwnedByAnotherUser(_) => StatusCode::CONFLICT,
            Self::DuplicateWithdrawal(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrdersApiError> for ServerError {
    fn from(e: OrdersApiError) -> Self {
        match e {
            OrdersApiError::InvalidOrderNumber(e) => Self::InvalidOrderNumber(e.to_string()),
            OrdersApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<BalanceApiError> for ServerError {
    fn from(e: BalanceApiError) -> Self {
        match e {
            BalanceApiError::InvalidOrderNumber(e) => Self::InvalidOrderNumber(e.to_string()),
            BalanceApiError::InvalidAmount(_) => Self::InvalidAmount(e.to_string()),
            BalanceApiError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            BalanceApiError::DuplicateWithdrawal(_) => Self::DuplicateWithdrawal(e.to_string()),
            BalanceApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}
