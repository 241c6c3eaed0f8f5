//! NULL detection and dedup-key rendering for `sea_query::Value`.
//!
//! Row keys are hashed as rendered text: every key part is rendered the way it
//! would appear as a SQL literal, and composite keys are joined with an ASCII
//! unit separator so `("1", "23")` and `("12", "3")` can never collide.

use sea_query::Value;
use std::fmt;

const KEY_SEPARATOR: char = '\u{1f}';

/// Returns `true` when the value is a SQL NULL of any variant.
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
    )
}

/// Render a non-NULL value as a SQL-literal-like string.
///
/// Returns `None` for NULL so callers can treat a NULL key part as "no entity".
///
/// ```
/// use incidentdb::value::render_key_part;
/// use sea_query::Value;
///
/// assert_eq!(render_key_part(&Value::Int(Some(42))).as_deref(), Some("42"));
/// assert_eq!(render_key_part(&Value::from("it's")).as_deref(), Some("'it''s'"));
/// assert_eq!(render_key_part(&Value::Int(None)), None);
/// ```
pub fn render_key_part(value: &Value) -> Option<String> {
    if is_null(value) {
        return None;
    }
    let rendered = match value {
        Value::Bool(Some(b)) => b.to_string(),
        Value::TinyInt(Some(i)) => i.to_string(),
        Value::SmallInt(Some(i)) => i.to_string(),
        Value::Int(Some(i)) => i.to_string(),
        Value::BigInt(Some(i)) => i.to_string(),
        Value::TinyUnsigned(Some(u)) => u.to_string(),
        Value::SmallUnsigned(Some(u)) => u.to_string(),
        Value::Unsigned(Some(u)) => u.to_string(),
        Value::BigUnsigned(Some(u)) => u.to_string(),
        Value::Float(Some(f)) => f.to_string(),
        Value::Double(Some(d)) => d.to_string(),
        Value::String(Some(s)) => {
            let s: &str = s;
            format!("'{}'", s.replace('\'', "''"))
        }
        Value::Char(Some(c)) => format!("'{c}'"),
        Value::Bytes(Some(b)) => {
            let b: &[u8] = b;
            let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
            format!("'\\x{hex}'")
        }
        Value::Uuid(Some(u)) => {
            let u: &uuid::Uuid = u;
            format!("'{u}'")
        }
        other => format!("{other:?}"),
    };
    Some(rendered)
}

/// Dedup key of one mapped entity within a row stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey(String);

impl RowKey {
    /// Build a key from the values of the key columns.
    ///
    /// Returns `None` if any part is NULL: a key with a NULL part does not
    /// identify an entity.
    pub fn from_values<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut key = String::new();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(&render_key_part(value)?);
        }
        Some(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.split(KEY_SEPARATOR).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_integers() {
        assert_eq!(render_key_part(&Value::Int(Some(42))).unwrap(), "42");
        assert_eq!(render_key_part(&Value::BigInt(Some(-7))).unwrap(), "-7");
        assert_eq!(render_key_part(&Value::SmallUnsigned(Some(3))).unwrap(), "3");
    }

    #[test]
    fn test_render_strings_escape_quotes() {
        assert_eq!(render_key_part(&Value::from("hello")).unwrap(), "'hello'");
        assert_eq!(render_key_part(&Value::from("o'brien")).unwrap(), "'o''brien'");
    }

    #[test]
    fn test_render_bytes_hex() {
        let value = Value::from(vec![0xde_u8, 0xad]);
        assert_eq!(render_key_part(&value).unwrap(), "'\\xdead'");
    }

    #[test]
    fn test_render_nulls() {
        assert!(render_key_part(&Value::Int(None)).is_none());
        assert!(render_key_part(&Value::String(None)).is_none());
        assert!(render_key_part(&Value::ChronoDateTimeUtc(None)).is_none());
    }

    #[test]
    fn test_is_null() {
        assert!(is_null(&Value::Bool(None)));
        assert!(is_null(&Value::Json(None)));
        assert!(!is_null(&Value::Bool(Some(false))));
        assert!(!is_null(&Value::Int(Some(0))));
    }

    #[test]
    fn test_row_key_composite_does_not_collide() {
        let a = RowKey::from_values([&Value::from("1"), &Value::from("23")]).unwrap();
        let b = RowKey::from_values([&Value::from("12"), &Value::from("3")]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_row_key_null_part_is_absent() {
        let key = RowKey::from_values([&Value::Int(Some(1)), &Value::Int(None)]);
        assert!(key.is_none());
    }

    #[test]
    fn test_row_key_int_widths_agree() {
        let a = RowKey::from_values([&Value::Int(Some(5))]).unwrap();
        let b = RowKey::from_values([&Value::BigInt(Some(5))]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_row_key_display() {
        let key = RowKey::from_values([&Value::Int(Some(1)), &Value::from("x")]).unwrap();
        assert_eq!(key.to_string(), "[1, 'x']");
    }
}
