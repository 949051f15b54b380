use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

const MINOR_UNITS: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// An amount of loyalty points, stored as an integer number of hundredths of a point.
///
/// On the wire, points are plain JSON numbers (`729.98`), so (de)serialization goes through `f64` and is rounded to
/// the nearest hundredth.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Value cannot be represented as points: {0}")]
pub struct PointsConversionError(String);

/// Converts from hundredths of a point.
impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / MINOR_UNITS as u64, abs % MINOR_UNITS as u64)
    }
}

impl Points {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_whole(points: i64) -> Self {
        Self(points * MINOR_UNITS)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, returning `None` if the sum does not fit.
    pub fn checked_add(self, rhs: Points) -> Option<Points> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS as f64
    }

    /// Converts a non-negative, finite amount into points, rounding to the nearest hundredth.
    pub fn try_from_f64(value: f64) -> Result<Self, PointsConversionError> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        if value < 0.0 {
            return Err(PointsConversionError(format!("{value} is negative")));
        }
        let minor = (value * MINOR_UNITS as f64).round();
        if minor > i64::MAX as f64 {
            return Err(PointsConversionError(format!("{value} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(minor as i64))
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from_f64(value).map_err(de::Error::custom)
    }
}
