use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Text used for null cells unless a caller configures another sentinel
pub const NULL_SENTINEL: &str = "null";

/// A scalar table cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Hashable form of a non-null value, used for join keys and category groups.
///
/// Integral floats collapse onto `Int` so that `1` and `1.0` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Key used to match rows; `None` for null and NaN, which never match anything
    pub fn key(&self) -> Option<KeyPart> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(KeyPart::Bool(*b)),
            Value::Int(i) => Some(KeyPart::Int(*i)),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(KeyPart::Int(*f as i64))
                } else {
                    Some(KeyPart::Float(f.to_bits()))
                }
            }
            Value::Text(s) => Some(KeyPart::Text(s.clone())),
        }
    }

    /// Render the value as text.
    ///
    /// Floats keep a fractional part (`2.0`, not `2`). Non-finite floats have no
    /// stable textual form and are rejected.
    pub fn render<'a>(&'a self, null_sentinel: &'a str) -> Result<Cow<'a, str>> {
        match self {
            Value::Null => Ok(Cow::Borrowed(null_sentinel)),
            Value::Bool(b) => Ok(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Int(i) => Ok(Cow::Owned(i.to_string())),
            Value::Float(f) if !f.is_finite() => Err(Error::Serialization(format!(
                "cannot render non-finite number {}",
                f
            ))),
            Value::Float(f) => Ok(Cow::Owned(format!("{:?}", f))),
            Value::Text(s) => Ok(Cow::Borrowed(s)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(NULL_SENTINEL),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() => write!(f, "{:?}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
