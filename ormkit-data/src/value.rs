use chrono::{DateTime, Utc};

/// A typed, nullable column value.
///
/// Entities expose their columns as `Value`s so the query layer can build
/// INSERT/UPDATE statements and equality predicates without knowing the
/// concrete entity type. Every variant carries an `Option` so a `NULL` keeps
/// its SQL type when it is bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Bytes(Option<Vec<u8>>),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    /// Whether the value is `NULL` or the zero value of its type.
    ///
    /// Zero values are skipped when an entity is used as a predicate, so a
    /// partially populated entity only filters on the fields that were set.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(v) => !v.unwrap_or(false),
            Value::Int(v) => v.unwrap_or(0) == 0,
            Value::Float(v) => v.unwrap_or(0.0) == 0.0,
            Value::Text(v) => v.as_deref().map_or(true, str::is_empty),
            Value::Bytes(v) => v.as_deref().map_or(true, <[u8]>::is_empty),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Bool(v) => v.is_none(),
            Value::Int(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Bytes(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }
}

macro_rules! impl_from_value {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(Some(v.into()))
                }
            }

            impl From<Option<$ty>> for Value {
                fn from(v: Option<$ty>) -> Self {
                    Value::$variant(v.map(Into::into))
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    i16 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    String => Text,
    Vec<u8> => Bytes,
    DateTime<Utc> => Timestamp,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Some(v.to_string()))
    }
}

impl From<Option<&str>> for Value {
    fn from(v: Option<&str>) -> Self {
        Value::Text(v.map(str::to_string))
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(Some(v.clone()))
    }
}
