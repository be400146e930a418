//! Resolved values: the uniform shape every payload is reduced to.

use std::collections::BTreeMap;

use odata_protocol::Primitive;
use serde::Serialize;

/// A record: field name to value.
pub type Record = BTreeMap<String, Value>;

/// A resolved value. Enums and every other scalar end up as
/// [`Value::Primitive`]; there is no enum-specific shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Primitive(Primitive),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    pub const fn null() -> Self {
        Self::Primitive(Primitive::Null)
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Null))
    }

    pub const fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(Primitive::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_primitive().and_then(Primitive::as_i64)
    }
}

impl From<Primitive> for Value {
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Primitive(Primitive::String(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Primitive(Primitive::from(value))
    }
}
