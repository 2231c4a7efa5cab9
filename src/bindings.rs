//! Python bindings
//!
//! Exposes the rule engine to a Python host. The host owns storage and
//! transport; these functions only compile, combine, evaluate and print rules.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict};
use serde_json::Value;

use crate::config::{self, AttributeSchema, SchemaSlot};
use crate::rule::{self, AstNode, Record};

// ============================================================================
// Cached Schema
// ============================================================================

/// Schema installed by `init_schema`; the built-in schema is used until then
static CACHED_SCHEMA: SchemaSlot = SchemaSlot::new();

fn with_schema<T>(f: impl FnOnce(&AttributeSchema) -> T) -> T {
    CACHED_SCHEMA.with(f)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a Python dict into a data record
fn dict_to_record(dict: &Bound<'_, PyDict>) -> PyResult<Record> {
    let mut record = Record::with_capacity(dict.len());
    for (key, value) in dict.iter() {
        let key: String = key.extract()?;
        record.insert(key, py_to_json(&value));
    }
    Ok(record)
}

/// Scalars map to their JSON counterparts; anything else becomes null
fn py_to_json(value: &Bound<'_, PyAny>) -> Value {
    if value.is_none() {
        Value::Null
    } else if value.is_instance_of::<PyBool>() {
        Value::Bool(value.extract().unwrap_or(false))
    } else if let Ok(i) = value.extract::<i64>() {
        Value::from(i)
    } else if let Ok(f) = value.extract::<f64>() {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    } else if let Ok(s) = value.extract::<String>() {
        Value::String(s)
    } else {
        Value::Null
    }
}

// ============================================================================
// RuleTree PyClass
// ============================================================================

/// Handle to a compiled rule tree held in Rust memory
#[pyclass(name = "RuleTree")]
#[derive(Clone)]
pub struct RuleTree {
    inner: AstNode,
}

#[pymethods]
impl RuleTree {
    /// Evaluate against a dict of attribute values
    fn evaluate(&self, data: &Bound<'_, PyDict>) -> PyResult<bool> {
        let record = dict_to_record(data)?;
        Ok(rule::evaluate(&self.inner, &record))
    }

    /// Stored document form: {"type": "operator", "value": "AND", ...}
    fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }

    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        Ok(Self {
            inner: AstNode::from_json(json)?,
        })
    }

    #[getter]
    fn is_operand(&self) -> bool {
        self.inner.is_operand()
    }

    fn __str__(&self) -> String {
        rule::to_text(&self.inner)
    }

    fn __repr__(&self) -> String {
        format!("RuleTree({:?})", rule::to_text(&self.inner))
    }
}

// ============================================================================
// Python Functions
// ============================================================================

/// Install an alternate attribute schema (call once at startup)
///
/// # Arguments
/// * `config` - {"age": "numeric", "department": "text", ...}, optionally under "attributes"
#[pyfunction]
fn init_schema(config: &Bound<'_, PyDict>) -> PyResult<()> {
    let schema = config::deserialize_schema(config)?;
    CACHED_SCHEMA.install(schema);
    Ok(())
}

/// Check if an alternate schema was installed
#[pyfunction]
fn is_schema_initialized() -> bool {
    CACHED_SCHEMA.is_installed()
}

/// Parse a rule string into a RuleTree
///
/// # Raises
/// ValueError if the rule references an unknown attribute, operator or literal
#[pyfunction]
fn create_rule(rule_string: &str) -> PyResult<RuleTree> {
    let inner = with_schema(|schema| rule::parse_with(rule_string, schema))?;
    Ok(RuleTree { inner })
}

/// Combine rule strings into one optimized RuleTree
#[pyfunction]
fn combine_rules(rule_strings: Vec<String>) -> PyResult<RuleTree> {
    let inner = with_schema(|schema| rule::combine_with(&rule_strings, schema))?;
    Ok(RuleTree { inner })
}

/// Evaluate a RuleTree against a dict of attribute values
#[pyfunction]
fn evaluate_rule(tree: PyRef<'_, RuleTree>, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    tree.evaluate(data)
}

/// Lenient pre-flight syntax check
#[pyfunction]
fn validate_rule_string(rule_string: &str) -> bool {
    with_schema(|schema| rule::is_valid_with(rule_string, schema))
}

/// Convert a RuleTree back into a rule string
#[pyfunction]
fn rule_to_string(tree: PyRef<'_, RuleTree>) -> String {
    rule::to_text(&tree.inner)
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_ast_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_schema, m)?)?;
    m.add_function(wrap_pyfunction!(is_schema_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(validate_rule_string, m)?)?;
    m.add_function(wrap_pyfunction!(rule_to_string, m)?)?;
    m.add_class::<RuleTree>()?;
    Ok(())
}
