//! Owned values that can be bound to a PostgreSQL query, built from typed fields or from JSON filters.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Text(String),
    TextArray(Vec<String>),
    Json(Value),
}

impl SqlValue {
    /// Convert a JSON filter value. Arrays of strings become `TEXT[]`; other arrays and objects stay JSON.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::I64(i)
                } else {
                    n.as_f64().map(SqlValue::F64).unwrap_or(SqlValue::Null)
                }
            }
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(items) => {
                let strings: Option<Vec<String>> = items.iter().map(|i| i.as_str().map(String::from)).collect();
                match strings {
                    Some(s) => SqlValue::TextArray(s),
                    None => SqlValue::Json(v.clone()),
                }
            }
            Value::Object(_) => SqlValue::Json(v.clone()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(v: Vec<String>) -> Self {
        SqlValue::TextArray(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl<'q> Encode<'q, Postgres> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            SqlValue::Null => IsNull::Yes,
            SqlValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            SqlValue::I32(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            SqlValue::TextArray(v) => <Vec<String> as Encode<Postgres>>::encode_by_ref(v, buf)?,
            SqlValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    /// Declare the real parameter type so the server does not reinterpret binary payloads as text.
    /// NULL stays TEXT; the builder casts every placeholder to its column type.
    fn produces(&self) -> Option<PgTypeInfo> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(_) => Some(<bool as Type<Postgres>>::type_info()),
            SqlValue::I32(_) => Some(<i32 as Type<Postgres>>::type_info()),
            SqlValue::I64(_) => Some(<i64 as Type<Postgres>>::type_info()),
            SqlValue::F64(_) => Some(<f64 as Type<Postgres>>::type_info()),
            SqlValue::Text(_) => Some(<String as Type<Postgres>>::type_info()),
            SqlValue::TextArray(_) => Some(<Vec<String> as Type<Postgres>>::type_info()),
            SqlValue::Json(_) => Some(<Value as Type<Postgres>>::type_info()),
        }
    }
}

impl Type<Postgres> for SqlValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
