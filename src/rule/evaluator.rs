//! Rule evaluator
//!
//! Only `>`, `<` and `=` are evaluated. `>=`, `<=` and `!=` are accepted by the
//! parser but always evaluate to `false`; callers relying on them get a
//! negative verdict, not an error.

use serde_json::{Map, Value};

use crate::rule::ast::AstNode;
use crate::rule::parser::{parse_number, unquote};

/// A data record: attribute name to JSON value
pub type Record = Map<String, Value>;

/// Evaluate an AST against a data record
pub fn evaluate(ast: &AstNode, data: &Record) -> bool {
    match ast {
        AstNode::Operator {
            connective,
            left,
            right,
        } => connective.apply(evaluate(left, data), || evaluate(right, data)),
        AstNode::Operand { condition } => evaluate_condition(condition, data),
    }
}

fn evaluate_condition(condition: &str, data: &Record) -> bool {
    let mut tokens = condition.split(' ');
    let (Some(attribute), Some(operator), Some(literal)) =
        (tokens.next(), tokens.next(), tokens.next())
    else {
        return false;
    };

    let Some(value) = data.get(attribute) else {
        return false;
    };

    match operator {
        ">" => compare_numeric(value, literal, |v, l| v > l),
        "<" => compare_numeric(value, literal, |v, l| v < l),
        "=" => match value {
            Value::String(s) => s == strip_quotes(literal),
            _ => false,
        },
        // >=, <=, != are not evaluated
        _ => false,
    }
}

fn compare_numeric(value: &Value, literal: &str, op: impl Fn(f64, f64) -> bool) -> bool {
    match (numeric_value(value), parse_number(literal)) {
        (Some(v), Some(l)) => op(v, l),
        _ => false,
    }
}

/// Numbers and numeric strings compare numerically; everything else does not compare
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s.trim()),
        _ => None,
    }
}

#[inline]
fn strip_quotes(literal: &str) -> &str {
    unquote(literal).unwrap_or(literal)
}
