//! Typed values as the tokenizer decodes them.

use serde::Serialize;

/// A decoded scalar.
///
/// Temporal and decimal types keep their wire text so no precision is lost;
/// callers that need richer types parse them at the edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Boolean(bool),
    /// `Edm.Byte`, `Edm.SByte`, `Edm.Int16`, `Edm.Int32`, `Edm.Int64`.
    Int(i64),
    /// `Edm.Single`, `Edm.Double`.
    Double(f64),
    Decimal(String),
    String(String),
    Date(String),
    TimeOfDay(String),
    DateTimeOffset(String),
    Duration(String),
    Guid(uuid::Uuid),
    Binary(Vec<u8>),
}

impl Primitive {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value as text when it is carried as text on the wire.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Decimal(s)
            | Self::String(s)
            | Self::Date(s)
            | Self::TimeOfDay(s)
            | Self::DateTimeOffset(s)
            | Self::Duration(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<uuid::Uuid> for Primitive {
    fn from(value: uuid::Uuid) -> Self {
        Self::Guid(value)
    }
}

/// A protocol-typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ODataValue {
    Primitive(Primitive),
    /// Structured non-entity value.
    Complex {
        type_name: Option<String>,
        properties: Vec<Property>,
    },
    Collection {
        type_name: Option<String>,
        items: Vec<ODataValue>,
    },
    /// Enum member. `value` is the member name or its integral value,
    /// whichever the service sent.
    Enum {
        type_name: Option<String>,
        value: Primitive,
    },
}

impl ODataValue {
    pub const fn null() -> Self {
        Self::Primitive(Primitive::Null)
    }

    pub fn complex(properties: impl IntoIterator<Item = Property>) -> Self {
        Self::Complex {
            type_name: None,
            properties: properties.into_iter().collect(),
        }
    }

    pub fn collection(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Collection {
            type_name: None,
            items: items.into_iter().collect(),
        }
    }

    pub fn enumeration(type_name: impl Into<String>, value: impl Into<Primitive>) -> Self {
        Self::Enum {
            type_name: Some(type_name.into()),
            value: value.into(),
        }
    }
}

impl From<Primitive> for ODataValue {
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

macro_rules! odata_value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ODataValue {
                fn from(value: $ty) -> Self {
                    Self::Primitive(Primitive::from(value))
                }
            }
        )*
    };
}

odata_value_from_scalar!(&str, String, i64, i32, f64, bool, uuid::Uuid);

/// A named value inside an entry or complex value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: ODataValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<ODataValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A property read as a whole response body. Raw scalars such as `$count`
/// results have no name.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelProperty {
    pub name: Option<String>,
    pub value: ODataValue,
}

/// A custom `@namespace.term` annotation attached to a feed or entry.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceAnnotation {
    pub name: String,
    pub value: ODataValue,
}

impl InstanceAnnotation {
    pub fn new(name: impl Into<String>, value: impl Into<ODataValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_conversions() {
        assert_eq!(Primitive::from(7_i64), Primitive::Int(7));
        assert_eq!(Primitive::from("x").as_str(), Some("x"));
        assert_eq!(Primitive::Int(3).as_i64(), Some(3));
        assert!(Primitive::Null.is_null());
    }

    #[test]
    fn odata_value_from_scalar_wraps_primitive() {
        let value = ODataValue::from(true);
        assert_eq!(value, ODataValue::Primitive(Primitive::Boolean(true)));
    }

    #[test]
    fn enumeration_keeps_type_name() {
        let value = ODataValue::enumeration("NS.Color", "Red");
        assert!(matches!(
            value,
            ODataValue::Enum { type_name: Some(ref t), value: Primitive::String(ref v) }
                if t == "NS.Color" && v == "Red"
        ));
    }
}
