//! Named rule with its source text and compiled tree

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AttributeSchema;
use crate::error::{Result, RuleError};
use crate::rule::ast::AstNode;
use crate::rule::combiner::combine_with;
use crate::rule::evaluator::{evaluate, Record};
use crate::rule::parser::parse_with;
use crate::rule::serializer::to_text;
use crate::rule::validator::is_valid_with;

/// A rule ready to be handed to a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRule {
    pub name: String,
    pub rule_string: String,
    pub ast: AstNode,
}

impl CompiledRule {
    /// Syntax gate first, then parse
    pub fn compile(name: impl Into<String>, rule_string: impl Into<String>) -> Result<Self> {
        Self::compile_with(name, rule_string, AttributeSchema::global())
    }

    pub fn compile_with(
        name: impl Into<String>,
        rule_string: impl Into<String>,
        schema: &AttributeSchema,
    ) -> Result<Self> {
        let name = name.into();
        let rule_string = rule_string.into();

        if !is_valid_with(&rule_string, schema) {
            debug!(rule = %name, text = %rule_string, "rule failed syntax gate");
            return Err(RuleError::InvalidSyntax(rule_string));
        }

        let ast = parse_with(&rule_string, schema)?;
        Ok(Self {
            name,
            rule_string,
            ast,
        })
    }

    /// Combine several rule texts; the stored text is the serialized combined tree
    pub fn combine<S: AsRef<str>>(name: impl Into<String>, rules: &[S]) -> Result<Self> {
        Self::combine_with(name, rules, AttributeSchema::global())
    }

    pub fn combine_with<S: AsRef<str>>(
        name: impl Into<String>,
        rules: &[S],
        schema: &AttributeSchema,
    ) -> Result<Self> {
        let ast = combine_with(rules, schema)?;
        Ok(Self {
            name: name.into(),
            rule_string: to_text(&ast),
            ast,
        })
    }

    #[inline]
    pub fn evaluate(&self, data: &Record) -> bool {
        evaluate(&self.ast, data)
    }
}
