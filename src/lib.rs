//! Rule AST Core - boolean rule language engine
//!
//! Rule strings such as `(age > 30 AND department = 'IT')` are parsed into a
//! binary AST, merged with other rules, flattened, evaluated against data
//! records and printed back as text. Every operation is a pure synchronous
//! transform over owned data. Python bindings are available behind the
//! `python` feature.

pub mod config;
pub mod error;
pub mod rule;

#[cfg(feature = "python")]
mod bindings;

pub use config::{AttributeKind, AttributeSchema, Comparator, Connective};
pub use error::{ErrorKind, Result, RuleError};
pub use rule::{
    combine, combine_with, diagnose, evaluate, is_valid, is_valid_with, optimize, parse,
    parse_with, to_text, AstNode, CompiledRule, Record,
};
