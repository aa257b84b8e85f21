use chrono::{NaiveDate, NaiveDateTime};

/// A scalar bound at execute time, or embedded literally when wrapping an
/// [`crate::Expression`]. Mirrors the handful of shapes every supported
/// dialect can bind positionally.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

/// A value that may be bound positionally, or a raw SQL fragment that must
/// be spliced into the compiled string verbatim (an [`crate::Expression`],
/// or a caller-supplied raw clause). Never escaped when `Raw`.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Value(Value),
    Raw(String),
}

impl Bound {
    pub fn is_raw(&self) -> bool {
        matches!(self, Bound::Raw(_))
    }
}

impl<T> From<T> for Bound
where
    T: Into<Value>,
{
    fn from(value: T) -> Self {
        Bound::Value(value.into())
    }
}
