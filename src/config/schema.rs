//! Attribute schema: the whitelist of rule attributes and their value kinds

use ahash::AHashMap;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, RuleError};

/// Built-in attribute table
const DEFAULT_ATTRIBUTES: [(&str, AttributeKind); 6] = [
    ("age", AttributeKind::Numeric),
    ("department", AttributeKind::Text),
    ("income", AttributeKind::Numeric),
    ("spend", AttributeKind::Numeric),
    ("salary", AttributeKind::Numeric),
    ("experience", AttributeKind::Numeric),
];

static DEFAULT_SCHEMA: Lazy<AttributeSchema> = Lazy::new(AttributeSchema::default);

static ATTRIBUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Value kind an attribute is compared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Compared against numeric literals (`age > 30`)
    #[serde(alias = "number")]
    Numeric,
    /// Compared against quote-delimited literals (`department = 'IT'`)
    #[serde(alias = "string")]
    Text,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Numeric => f.write_str("a number"),
            AttributeKind::Text => f.write_str("a string"),
        }
    }
}

impl FromStr for AttributeKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "numeric" | "number" => Ok(AttributeKind::Numeric),
            "text" | "string" => Ok(AttributeKind::Text),
            other => Err(RuleError::InvalidSchema(format!(
                "unknown attribute kind: {}",
                other
            ))),
        }
    }
}

/// Mapping from attribute name to its comparison kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSchema {
    attributes: AHashMap<String, AttributeKind>,
}

impl Default for AttributeSchema {
    fn default() -> Self {
        let attributes = DEFAULT_ATTRIBUTES
            .iter()
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect();
        Self { attributes }
    }
}

impl AttributeSchema {
    /// Build a schema from `(name, kind)` pairs, rejecting empty tables and bad names
    pub fn new<I, S>(attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, AttributeKind)>,
        S: Into<String>,
    {
        let attributes: AHashMap<String, AttributeKind> = attributes
            .into_iter()
            .map(|(name, kind)| (name.into(), kind))
            .collect();
        let schema = Self { attributes };
        schema.check()?;
        Ok(schema)
    }

    /// Parse a schema document: `{"attributes": {"age": "numeric", ...}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: AttributeSchema = serde_json::from_str(json)
            .map_err(|e| RuleError::InvalidSchema(e.to_string()))?;
        schema.check()?;
        Ok(schema)
    }

    /// Process-wide default schema
    pub fn global() -> &'static AttributeSchema {
        &DEFAULT_SCHEMA
    }

    fn check(&self) -> Result<()> {
        if self.attributes.is_empty() {
            return Err(RuleError::InvalidSchema(
                "schema has no attributes".to_string(),
            ));
        }
        for name in self.attributes.keys() {
            if !ATTRIBUTE_NAME.is_match(name) || name == "AND" || name == "OR" {
                return Err(RuleError::InvalidSchema(format!(
                    "illegal attribute name: {:?}",
                    name
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn kind_of(&self, attribute: &str) -> Option<AttributeKind> {
        self.attributes.get(attribute).copied()
    }

    #[inline]
    pub fn contains(&self, attribute: &str) -> bool {
        self.attributes.contains_key(attribute)
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

// ============================================================================
// Installed Schema
// ============================================================================

/// Replaceable process-wide schema; the built-in schema answers until one is installed
pub struct SchemaSlot {
    cell: OnceCell<Arc<RwLock<AttributeSchema>>>,
}

impl SchemaSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Install `schema`, replacing any earlier one; racing installs all take effect in turn
    pub fn install(&self, schema: AttributeSchema) {
        let slot = self
            .cell
            .get_or_init(|| Arc::new(RwLock::new(AttributeSchema::default())));
        *slot.write() = schema;
    }

    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Run `f` against the installed schema, or the built-in one
    pub fn with<T>(&self, f: impl FnOnce(&AttributeSchema) -> T) -> T {
        match self.cell.get() {
            Some(schema) => f(&schema.read()),
            None => f(AttributeSchema::global()),
        }
    }
}

impl Default for SchemaSlot {
    fn default() -> Self {
        Self::new()
    }
}
