//! Configuration module for the rule engine
//!
//! Holds the attribute schema and the fixed comparator and connective sets.
//! With the `python` feature, also deserializes an alternate schema from a Python dict.

mod schema;
mod symbols;

pub use schema::*;
pub use symbols::*;

#[cfg(feature = "python")]
use pyo3::types::{PyAnyMethods, PyDict, PyDictMethods};
#[cfg(feature = "python")]
use pyo3::Bound;

/// Deserialize a schema from a Python dict
/// Expected format: {"age": "numeric", "department": "text", ...}
/// or the same table nested under an "attributes" key
#[cfg(feature = "python")]
pub fn deserialize_schema(config: &Bound<'_, PyDict>) -> pyo3::PyResult<AttributeSchema> {
    let table: Bound<'_, PyDict> = match config.get_item("attributes")? {
        Some(nested) => nested.extract()?,
        None => config.clone(),
    };

    let mut attributes = Vec::with_capacity(table.len());
    for (key, value) in table.iter() {
        let name: String = key.extract()?;
        let kind: String = value.extract()?;
        attributes.push((name, kind.parse::<AttributeKind>()?));
    }

    Ok(AttributeSchema::new(attributes)?)
}
