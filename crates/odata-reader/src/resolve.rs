//! Value resolver: protocol-typed values to plain [`Value`]s.

use odata_protocol::{ODataValue, Property};

use crate::value::{Record, Value};

/// Resolve a protocol value.
///
/// Complex values become records, collections become lists in declared
/// order, enums collapse to their underlying scalar. Primitives pass
/// through unchanged. Payloads are trees, so recursion always terminates.
pub fn resolve(value: ODataValue) -> Value {
    match value {
        ODataValue::Primitive(primitive) => Value::Primitive(primitive),
        ODataValue::Complex { properties, .. } => Value::Record(resolve_properties(properties)),
        ODataValue::Collection { items, .. } => {
            Value::List(items.into_iter().map(resolve).collect())
        }
        ODataValue::Enum { value, .. } => Value::Primitive(value),
    }
}

/// Resolve named properties into a record. A repeated name keeps the last
/// value.
pub fn resolve_properties(properties: impl IntoIterator<Item = Property>) -> Record {
    properties
        .into_iter()
        .map(|p| (p.name, resolve(p.value)))
        .collect()
}
