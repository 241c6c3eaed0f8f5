//! ValueType trait for type-safe value conversions
//!
//! `ValueType` maps Rust field types to their `sea_query::Value` variant and back.
//! It drives both directions of the persistence layer: parameter bindings are
//! produced with [`ValueType::into_value`], row cells are read back with
//! [`ValueType::try_from_value`].
//!
//! Extraction distinguishes a SQL NULL ([`ValueExtractionError::NullValue`]) from
//! a value of the wrong type. `Option<T>` turns NULL into `None`, so an entity
//! field declared as `Option<i32>` accepts NULL while a plain `i32` rejects it.
//!
//! Integer extraction widens (`SmallInt` into `i32`, `Int` into `i64`) but never
//! narrows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_query::Value;
use uuid::Uuid;

use super::key::is_null;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch { expected: String, actual: String },
    /// Value conversion failed (e.g., overflow)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, got {actual}")
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {msg}")
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for mapping Rust types to their corresponding `sea_query::Value` variant.
///
/// # Example
///
/// ```
/// use incidentdb::ValueType;
/// use sea_query::Value;
///
/// let value = 42i32.into_value();
/// assert_eq!(i32::try_from_value(&value), Ok(42));
///
/// // NULL is only accepted through Option
/// let null = <Option<i32>>::null_value();
/// assert!(i32::try_from_value(&null).is_err());
/// assert_eq!(<Option<i32>>::try_from_value(&null), Ok(None));
/// ```
pub trait ValueType: Sized {
    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Extract this type from a `sea_query::Value`.
    ///
    /// Returns `NullValue` for SQL NULL, `TypeMismatch` when the variant is not
    /// convertible to `Self`.
    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError>;

    /// The typed NULL for this type, used when binding `None`.
    fn null_value() -> Value;
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    if is_null(value) {
        return ValueExtractionError::NullValue;
    }
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{value:?}"),
    }
}

fn out_of_range(target: &str, value: impl std::fmt::Display) -> ValueExtractionError {
    ValueExtractionError::ConversionError(format!("{value} is out of range for {target}"))
}

impl ValueType for bool {
    fn into_value(self) -> Value {
        Value::Bool(Some(self))
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(Some(b)) => Ok(*b),
            _ => Err(mismatch("Bool", value)),
        }
    }

    fn null_value() -> Value {
        Value::Bool(None)
    }
}

impl ValueType for i16 {
    fn into_value(self) -> Value {
        Value::SmallInt(Some(self))
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::SmallInt(Some(v)) => Ok(*v),
            Value::TinyInt(Some(v)) => Ok(i16::from(*v)),
            Value::TinyUnsigned(Some(v)) => Ok(i16::from(*v)),
            _ => Err(mismatch("SmallInt", value)),
        }
    }

    fn null_value() -> Value {
        Value::SmallInt(None)
    }
}

impl ValueType for i32 {
    fn into_value(self) -> Value {
        Value::Int(Some(self))
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Int(Some(v)) => Ok(*v),
            Value::SmallInt(Some(v)) => Ok(i32::from(*v)),
            Value::TinyInt(Some(v)) => Ok(i32::from(*v)),
            Value::SmallUnsigned(Some(v)) => Ok(i32::from(*v)),
            Value::TinyUnsigned(Some(v)) => Ok(i32::from(*v)),
            _ => Err(mismatch("Int", value)),
        }
    }

    fn null_value() -> Value {
        Value::Int(None)
    }
}

impl ValueType for i64 {
    fn into_value(self) -> Value {
        Value::BigInt(Some(self))
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::BigInt(Some(v)) => Ok(*v),
            Value::Int(Some(v)) => Ok(i64::from(*v)),
            Value::SmallInt(Some(v)) => Ok(i64::from(*v)),
            Value::TinyInt(Some(v)) => Ok(i64::from(*v)),
            Value::Unsigned(Some(v)) => Ok(i64::from(*v)),
            Value::SmallUnsigned(Some(v)) => Ok(i64::from(*v)),
            Value::TinyUnsigned(Some(v)) => Ok(i64::from(*v)),
            Value::BigUnsigned(Some(v)) => i64::try_from(*v).map_err(|_| out_of_range("i64", v)),
            _ => Err(mismatch("BigInt", value)),
        }
    }

    fn null_value() -> Value {
        Value::BigInt(None)
    }
}

impl ValueType for f32 {
    fn into_value(self) -> Value {
        Value::Float(Some(self))
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Float(Some(v)) => Ok(*v),
            _ => Err(mismatch("Float", value)),
        }
    }

    fn null_value() -> Value {
        Value::Float(None)
    }
}

impl ValueType for f64 {
    fn into_value(self) -> Value {
        Value::Double(Some(self))
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Double(Some(v)) => Ok(*v),
            Value::Float(Some(v)) => Ok(f64::from(*v)),
            _ => Err(mismatch("Double", value)),
        }
    }

    fn null_value() -> Value {
        Value::Double(None)
    }
}

impl ValueType for String {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(s)) => {
                let s: &str = s;
                Ok(s.to_owned())
            }
            Value::Char(Some(c)) => Ok(c.to_string()),
            _ => Err(mismatch("String", value)),
        }
    }

    fn null_value() -> Value {
        Value::String(None)
    }
}

impl ValueType for Vec<u8> {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bytes(Some(b)) => {
                let b: &[u8] = b;
                Ok(b.to_vec())
            }
            _ => Err(mismatch("Bytes", value)),
        }
    }

    fn null_value() -> Value {
        Value::Bytes(None)
    }
}

impl ValueType for serde_json::Value {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(j)) => {
                let j: &serde_json::Value = j;
                Ok(j.clone())
            }
            _ => Err(mismatch("Json", value)),
        }
    }

    fn null_value() -> Value {
        Value::Json(None)
    }
}

impl ValueType for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::ChronoDateTimeUtc(Some(dt)) => {
                let dt: &DateTime<Utc> = dt;
                Ok(*dt)
            }
            Value::ChronoDateTimeWithTimeZone(Some(dt)) => {
                let dt: &DateTime<chrono::FixedOffset> = dt;
                Ok(dt.with_timezone(&Utc))
            }
            Value::ChronoDateTimeLocal(Some(dt)) => {
                let dt: &DateTime<chrono::Local> = dt;
                Ok(dt.with_timezone(&Utc))
            }
            _ => Err(mismatch("ChronoDateTimeUtc", value)),
        }
    }

    fn null_value() -> Value {
        Value::ChronoDateTimeUtc(None)
    }
}

impl ValueType for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::ChronoDateTime(Some(dt)) => {
                let dt: &NaiveDateTime = dt;
                Ok(*dt)
            }
            _ => Err(mismatch("ChronoDateTime", value)),
        }
    }

    fn null_value() -> Value {
        Value::ChronoDateTime(None)
    }
}

impl ValueType for NaiveDate {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::ChronoDate(Some(d)) => {
                let d: &NaiveDate = d;
                Ok(*d)
            }
            _ => Err(mismatch("ChronoDate", value)),
        }
    }

    fn null_value() -> Value {
        Value::ChronoDate(None)
    }
}

impl ValueType for Uuid {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Uuid(Some(u)) => {
                let u: &Uuid = u;
                Ok(*u)
            }
            _ => Err(mismatch("Uuid", value)),
        }
    }

    fn null_value() -> Value {
        Value::Uuid(None)
    }
}

impl ValueType for Decimal {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Decimal(Some(d)) => {
                let d: &Decimal = d;
                Ok(*d)
            }
            Value::Int(Some(v)) => Ok(Decimal::from(*v)),
            Value::BigInt(Some(v)) => Ok(Decimal::from(*v)),
            _ => Err(mismatch("Decimal", value)),
        }
    }

    fn null_value() -> Value {
        Value::Decimal(None)
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => T::null_value(),
        }
    }

    fn try_from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        if is_null(value) {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }

    fn null_value() -> Value {
        T::null_value()
    }
}
