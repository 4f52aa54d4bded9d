//! Enriching an error after construction with `<<`

use super::BetterError;
use crate::context::Context;
use serde_json::{Map, Value};
use std::ops::Shl;

/// Data accepted by `<<` and [`BetterError::append`]
#[derive(Debug, Clone, PartialEq)]
pub enum Append {
    /// Merged into the context, overwriting existing keys
    Context(Context),
    /// Appended to the details, in order
    Details(Vec<String>),
    /// Appended as one more detail
    Detail(String),
}

impl Append {
    pub(crate) fn apply(self, details: &mut Vec<String>, context: &mut Context) {
        match self {
            Self::Context(data) => {
                context.merge(data);
            }
            Self::Details(more) => details.extend(more),
            Self::Detail(detail) => details.push(detail),
        }
    }
}

fn detail_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl From<Context> for Append {
    fn from(context: Context) -> Self {
        Self::Context(context)
    }
}

impl From<Map<String, Value>> for Append {
    fn from(map: Map<String, Value>) -> Self {
        Self::Context(map.into())
    }
}

impl From<Value> for Append {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Context(map.into()),
            Value::Array(items) => Self::Details(items.into_iter().map(detail_text).collect()),
            other => Self::Detail(detail_text(other)),
        }
    }
}

impl From<&str> for Append {
    fn from(detail: &str) -> Self {
        Self::Detail(detail.to_string())
    }
}

impl From<String> for Append {
    fn from(detail: String) -> Self {
        Self::Detail(detail)
    }
}

impl From<Vec<String>> for Append {
    fn from(details: Vec<String>) -> Self {
        Self::Details(details)
    }
}

impl From<Vec<&str>> for Append {
    fn from(details: Vec<&str>) -> Self {
        Self::Details(details.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Append {
    fn from(details: [&str; N]) -> Self {
        Self::Details(details.into_iter().map(str::to_string).collect())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Append
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        Self::Context(entries.into())
    }
}

impl<T: Into<Append>> Shl<T> for BetterError {
    type Output = BetterError;

    fn shl(mut self, data: T) -> Self::Output {
        self.append(data);
        self
    }
}

impl<'a, T: Into<Append>> Shl<T> for &'a mut BetterError {
    type Output = &'a mut BetterError;

    fn shl(self, data: T) -> Self::Output {
        self.append(data)
    }
}
