//! Dynamic values exchanged with the executor.
//!
//! Every field read out of a record becomes a [`Value`] before it is bound to
//! a statement, and every cell of a result row arrives as one. The
//! [`ToValue`] and [`FromValue`] traits connect the two worlds for the field
//! types a record usually carries.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

/// Dynamic value type for statement bindings and result cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values a sparse write leaves out: nulls and empty byte strings.
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Json(v) => write!(f, "'{}'", v),
        }
    }
}

/// A value of the wrong shape for the requested Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Mismatch {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.type_name(),
        }
    }
}

/// Read a field into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Build a field from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, Mismatch>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Bool(v) => Ok(v),
            // SQLite and MySQL hand booleans back as integers
            Value::Int(v) => Ok(v != 0),
            other => Err(Mismatch::new("bool", &other)),
        }
    }
}

macro_rules! impl_int {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(*self as i64)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, Mismatch> {
                    match value {
                        Value::Int(v) => {
                            <$ty>::try_from(v).map_err(|_| Mismatch::new(stringify!($ty), &value))
                        }
                        Value::Bool(v) => Ok(v as $ty),
                        other => Err(Mismatch::new(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        // Past i64::MAX the decimal text is bound instead
        match i64::try_from(*self) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Text(self.to_string()),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Int(v) => u64::try_from(v).map_err(|_| Mismatch::new("u64", &value)),
            Value::Text(ref s) => s.parse::<u64>().map_err(|_| Mismatch::new("u64", &value)),
            other => Err(Mismatch::new("u64", &other)),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(Mismatch::new("f64", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Bytes(v) => String::from_utf8(v).map_err(|_| Mismatch {
                expected: "utf-8 text",
                found: "bytes",
            }),
            other => Err(Mismatch::new("text", &other)),
        }
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            other => Err(Mismatch::new("bytes", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Text(ref s) => serde_json::from_str(s).map_err(|_| Mismatch::new("json", &value)),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(Mismatch::new("json", &other)),
        }
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Text(self.to_rfc3339())
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        let Value::Text(text) = &value else {
            return Err(Mismatch::new("timestamp", &value));
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Ok(ts.with_timezone(&Utc));
        }
        // SQLite's CURRENT_TIMESTAMP format
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| Mismatch::new("timestamp", &value))
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match &value {
            Value::Text(text) => Uuid::parse_str(text).map_err(|_| Mismatch::new("uuid", &value)),
            Value::Bytes(bytes) => {
                Uuid::from_slice(bytes).map_err(|_| Mismatch::new("uuid", &value))
            }
            other => Err(Mismatch::new("uuid", other)),
        }
    }
}

// Implement From traits for Value
macro_rules! impl_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

impl_from!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    Vec<u8>,
    serde_json::Value,
    DateTime<Utc>,
    Uuid
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(3.5f64), Value::Float(3.5));
        assert_eq!(Value::from("hello"), Value::Text("hello".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7u8)), Value::Int(7));
    }

    #[test]
    fn test_unset() {
        assert!(Value::Null.is_unset());
        assert!(Value::Bytes(vec![]).is_unset());
        assert!(!Value::Text(String::new()).is_unset());
        assert!(!Value::Int(0).is_unset());
    }

    #[test]
    fn test_int_range() {
        assert_eq!(u8::from_value(Value::Int(200)), Ok(200));
        assert_eq!(
            u8::from_value(Value::Int(300)),
            Err(Mismatch {
                expected: "u8",
                found: "integer"
            })
        );
        assert_eq!(i32::from_value(Value::Bool(true)), Ok(1));
    }

    #[test]
    fn test_u64_past_i64_max() {
        assert_eq!(Value::from(i64::MAX as u64), Value::Int(i64::MAX));
        assert_eq!(
            Value::from(u64::MAX),
            Value::Text("18446744073709551615".into())
        );
        assert_eq!(u64::from_value(Value::from(u64::MAX)), Ok(u64::MAX));
        assert!(u64::from_value(Value::Int(-1)).is_err());
    }

    #[test]
    fn test_bool_from_integer() {
        assert_eq!(bool::from_value(Value::Int(1)), Ok(true));
        assert_eq!(bool::from_value(Value::Int(0)), Ok(false));
        assert!(bool::from_value(Value::Text("yes".into())).is_err());
    }

    #[test]
    fn test_option_roundtrip() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(Value::Text("a".into())),
            Ok(Some("a".to_string()))
        );
        assert_eq!(Some(5i64).to_value(), Value::Int(5));
    }

    #[test]
    fn test_timestamp_formats() {
        let ts = DateTime::<Utc>::from_value(Value::Text("2024-03-01T10:00:00+00:00".into()))
            .unwrap();
        let sqlite = DateTime::<Utc>::from_value(Value::Text("2024-03-01 10:00:00".into()))
            .unwrap();
        assert_eq!(ts, sqlite);
        assert_eq!(ts.to_value(), Value::Text("2024-03-01T10:00:00+00:00".into()));
    }

    #[test]
    fn test_uuid_text() {
        let id = Uuid::new_v4();
        assert_eq!(Uuid::from_value(id.to_value()), Ok(id));
    }

    #[test]
    fn test_display_escapes_text() {
        assert_eq!(Value::Text("it's".into()).to_string(), "'it''s'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
