//! Value conversion from bindings to `may_postgres` parameters.
//!
//! Every binding becomes an owned, boxed `ToSql` value; NULLs are typed
//! (`Option::<i32>::None`, `Option::<String>::None`, …) so PostgreSQL can infer
//! the parameter type from the variant instead of rejecting an untyped NULL.

use crate::executor::DbError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;
use uuid::Uuid;

type Param = Box<dyn ToSql + Sync>;

fn unsupported(value: &Value) -> DbError {
    DbError::Other(format!("Unsupported value type in query: {value:?}"))
}

/// Convert one binding into an owned driver parameter.
pub(crate) fn to_param(value: &Value) -> Result<Param, DbError> {
    let param: Param = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(Some(u)) => {
            let big = i64::try_from(*u).map_err(|_| {
                DbError::Other(format!(
                    "BigUnsigned value {u} exceeds i64::MAX ({}), cannot be safely cast to i64",
                    i64::MAX
                ))
            })?;
            Box::new(Some(big))
        }
        Value::BigUnsigned(None) => Box::new(None::<i64>),
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(Some(s)) => {
            let s: &str = s;
            Box::new(Some(s.to_string()))
        }
        Value::String(None) => Box::new(None::<String>),
        Value::Char(v) => Box::new(v.map(|c| c.to_string())),
        Value::Bytes(Some(b)) => {
            let b: &[u8] = b;
            Box::new(Some(b.to_vec()))
        }
        Value::Bytes(None) => Box::new(None::<Vec<u8>>),
        Value::Json(Some(j)) => {
            let j: &serde_json::Value = j;
            Box::new(Some(j.clone()))
        }
        Value::Json(None) => Box::new(None::<serde_json::Value>),
        Value::ChronoDate(Some(d)) => {
            let d: &NaiveDate = d;
            Box::new(Some(*d))
        }
        Value::ChronoDate(None) => Box::new(None::<NaiveDate>),
        Value::ChronoTime(Some(t)) => {
            let t: &NaiveTime = t;
            Box::new(Some(*t))
        }
        Value::ChronoTime(None) => Box::new(None::<NaiveTime>),
        Value::ChronoDateTime(Some(dt)) => {
            let dt: &NaiveDateTime = dt;
            Box::new(Some(*dt))
        }
        Value::ChronoDateTime(None) => Box::new(None::<NaiveDateTime>),
        Value::ChronoDateTimeUtc(Some(dt)) => {
            let dt: &DateTime<Utc> = dt;
            Box::new(Some(*dt))
        }
        Value::ChronoDateTimeLocal(Some(dt)) => Box::new(Some(dt.with_timezone(&Utc))),
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => Box::new(Some(dt.with_timezone(&Utc))),
        Value::ChronoDateTimeUtc(None)
        | Value::ChronoDateTimeLocal(None)
        | Value::ChronoDateTimeWithTimeZone(None) => Box::new(None::<DateTime<Utc>>),
        Value::Uuid(Some(u)) => {
            let u: &Uuid = u;
            Box::new(Some(*u))
        }
        Value::Uuid(None) => Box::new(None::<Uuid>),
        Value::Decimal(Some(d)) => {
            let d: &Decimal = d;
            Box::new(Some(*d))
        }
        Value::Decimal(None) => Box::new(None::<Decimal>),
        #[allow(unreachable_patterns)]
        other => return Err(unsupported(other)),
    };
    Ok(param)
}

/// Convert `values` to `ToSql` parameters and run `f` with them.
///
/// The boxed parameters live for the duration of the closure call, so the
/// borrowed slice handed to the driver stays valid.
pub(crate) fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, DbError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, DbError>,
{
    let owned = values.iter().map(to_param).collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| &**p as &dyn ToSql).collect();
    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_values_convert() {
        let values = vec![
            Value::from(1),
            Value::from(2i64),
            Value::from("x"),
            Value::from(true),
            Value::Int(None),
            Value::String(None),
            Value::from(Uuid::nil()),
            Value::from(serde_json::json!({"a": 1})),
        ];
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, values.len());
    }

    #[test]
    fn test_big_unsigned_overflow() {
        let err = to_param(&Value::BigUnsigned(Some(u64::MAX))).err().unwrap();
        assert!(err.to_string().contains("exceeds i64::MAX"));
        assert!(to_param(&Value::BigUnsigned(Some(42))).is_ok());
    }
}
