use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn_checksum_is_valid;

/// Order numbers longer than this are rejected outright.
pub const MAX_ORDER_NUMBER_LENGTH: usize = 64;

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// A purchase order number: a non-empty string of ASCII digits that passes the Luhn checksum.
///
/// The only way to construct an `OrderNumber` from user input is via [`FromStr`], which validates it. Values read back
/// from the database are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("The order number is empty")]
    Empty,
    #[error("The order number may only contain digits")]
    NotNumeric,
    #[error("The order number is longer than {MAX_ORDER_NUMBER_LENGTH} digits")]
    TooLong,
    #[error("The order number {0} fails the Luhn checksum")]
    ChecksumFailed(String),
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OrderNumberError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::NotNumeric);
        }
        if s.len() > MAX_ORDER_NUMBER_LENGTH {
            return Err(OrderNumberError::TooLong);
        }
        if !luhn_checksum_is_valid(s) {
            return Err(OrderNumberError::ChecksumFailed(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been accepted, but the accrual service has not started on it yet.
    New,
    /// The accrual service is calculating the reward for the order.
    Processing,
    /// The accrual service refused to reward the order. Terminal.
    Invalid,
    /// The reward has been calculated and credited to the owner. Terminal.
    Processed,
}

/// The result of looking up a status change in the order transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The change is allowed and must be written.
    Apply,
    /// The order is already in the requested non-terminal state. Nothing to write.
    NoOp,
    /// The change is not in the table and must never be written.
    Forbidden,
}

impl OrderStatusType {
    pub const PENDING: [OrderStatusType; 2] = [OrderStatusType::New, OrderStatusType::Processing];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// The order transition table.
    ///
    /// | From \ To  | New   | Processing | Invalid | Processed |
    /// |------------|-------|------------|---------|-----------|
    /// | New        | NoOp  | Apply      | Apply   | Apply     |
    /// | Processing | ✗     | NoOp       | Apply   | Apply     |
    /// | Invalid    | ✗     | ✗          | ✗       | ✗         |
    /// | Processed  | ✗     | ✗          | ✗       | ✗         |
    pub fn transition_to(self, next: OrderStatusType) -> Transition {
        use OrderStatusType::*;
        match (self, next) {
            (New, New) | (Processing, Processing) => Transition::NoOp,
            (New, Processing | Invalid | Processed) => Transition::Apply,
            (Processing, Invalid | Processed) => Transition::Apply,
            _ => Transition::Forbidden,
        }
    }

    /// The states from which an order may move into `self`. Storage backends use this set to guard their conditional
    /// updates, so it must agree with [`Self::transition_to`].
    pub fn predecessors(self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            New => &[],
            Processing => &[New],
            Invalid | Processed => &[New, Processing],
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to NEW");
            OrderStatusType::New
        })
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    /// The login of the user that submitted the order
    pub owner: String,
    pub status: OrderStatusType,
    /// Points credited for this order. Always zero unless the order is `Processed`.
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

//--------------------------------------     UserBalance       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserBalance {
    pub owner: String,
    /// Credited accrual minus everything withdrawn. Never negative.
    pub current_balance: Points,
    /// Running total of all withdrawals.
    pub total_withdrawn: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserBalance {
    /// The balance of a user that has never submitted an order.
    pub fn empty(owner: &str) -> Self {
        let now = Utc::now();
        Self {
            owner: owner.to_string(),
            current_balance: Points::default(),
            total_withdrawn: Points::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

//--------------------------------------     Withdrawal        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    /// The order the points are being spent against
    pub order_number: OrderNumber,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new(order_number: OrderNumber, amount: Points) -> Self {
        Self { order_number, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    pub owner: String,
    pub order_number: OrderNumber,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}
