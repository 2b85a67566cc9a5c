//! Equality predicates
//!
//! A filter is a set of `field = scalar` pairs combined with AND, evaluated
//! against top-level fields only. There is no index behind it: callers scan.

use serde_json::{Map, Value};

use crate::error::{AtlasError, Result};
use super::Document;

/// An equality predicate over top-level document fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Map<String, Value>,
}

impl Filter {
    /// A filter that matches every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field = value` condition
    ///
    /// Only scalars (string, number, boolean, null) are accepted.
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Result<Self> {
        let field = field.into();
        if !is_scalar(&value) {
            return Err(AtlasError::InvalidPayload(format!(
                "filter value for '{}' must be a scalar",
                field
            )));
        }
        self.conditions.insert(field, value);
        Ok(self)
    }

    /// Build a filter from a JSON object of scalar values
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .try_fold(Self::new(), |filter, (field, value)| filter.with(field, value)),
            Value::Null => Ok(Self::new()),
            _ => Err(AtlasError::InvalidPayload(
                "filter must be a JSON object".to_string(),
            )),
        }
    }

    /// True if every condition holds for the document
    ///
    /// Missing fields never match.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            document
                .get(field)
                .map_or(false, |actual| scalar_eq(actual, expected))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The filter as a JSON object (wire form)
    pub fn to_value(&self) -> Value {
        Value::Object(self.conditions.clone())
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// JSON equality where numbers compare by value (`1 == 1.0`)
fn scalar_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
                return x == y;
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => actual == expected,
    }
}
