//! Rule string validation
//!
//! Two gates live here. [`is_valid`] is the legacy pre-flight check: it works on
//! the whitespace-stripped text and locates a comparator by substring search,
//! so it accepts some strings the parser rejects and rejects some it accepts.
//! Stored rule texts were admitted by it, so it is kept as is.
//! [`diagnose`] is the unified grammar: a balance pre-check, then the parser
//! with leaves cut at the leftmost comparator (longest symbol first), so
//! `age>=30` reads as `age >= 30`. It returns either the tree or a typed
//! error. [`divergence`] reports where the two disagree.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use tracing::trace;

use crate::config::{AttributeSchema, Comparator, Connective};
use crate::error::{Result, RuleError};
use crate::rule::ast::AstNode;
use crate::rule::parser::{parse_tree, LeafGrammar};

static LEGACY_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(|\)|\bAND\b|\bOR\b").expect("static regex"));

/// Legacy syntax gate against the default schema
pub fn is_valid(text: &str) -> bool {
    is_valid_with(text, AttributeSchema::global())
}

/// Legacy syntax gate: balance, token adjacency and attribute whitelist
pub fn is_valid_with(text: &str, schema: &AttributeSchema) -> bool {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    if let Err(e) = check_balance(&clean) {
        trace!(rule = text, reason = %e, "rule rejected");
        return false;
    }

    let tokens = legacy_tokens(&clean);
    let mut stack: SmallVec<[usize; 8]> = SmallVec::new();

    for (i, token) in tokens.iter().enumerate() {
        match *token {
            "(" => stack.push(i),
            ")" => {
                if stack.pop().is_none() {
                    trace!(rule = text, "unmatched closing parenthesis");
                    return false;
                }
            }
            keyword if is_keyword(keyword) => {
                if i == 0 || i == tokens.len() - 1 {
                    trace!(rule = text, keyword, "connective at start or end");
                    return false;
                }
                if is_keyword(tokens[i - 1]) || is_keyword(tokens[i + 1]) {
                    trace!(rule = text, keyword, "consecutive connectives");
                    return false;
                }
            }
            condition => {
                if !legacy_condition_ok(condition, schema) {
                    trace!(rule = text, condition, "invalid condition");
                    return false;
                }
            }
        }
    }

    stack.is_empty()
}

fn is_keyword(token: &str) -> bool {
    token.parse::<Connective>().is_ok()
}

/// Split on parentheses and whole-word AND/OR, keeping the delimiters
fn legacy_tokens(clean: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for m in LEGACY_DELIMITER.find_iter(clean) {
        if m.start() > last {
            tokens.push(&clean[last..m.start()]);
        }
        tokens.push(m.as_str());
        last = m.end();
    }
    if last < clean.len() {
        tokens.push(&clean[last..]);
    }

    tokens
}

/// First comparator (in declaration order) found anywhere in the token splits it
fn legacy_condition_ok(token: &str, schema: &AttributeSchema) -> bool {
    let Some(comparator) = Comparator::ALL
        .iter()
        .find(|c| token.contains(c.symbol()))
    else {
        return false;
    };

    let mut parts = token.split(comparator.symbol());
    let attribute = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();

    !attribute.is_empty() && !rest.is_empty() && schema.contains(attribute)
}

/// Counter check: never negative, ends at zero
fn check_balance(text: &str) -> Result<()> {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(RuleError::UnbalancedParentheses(
                "closing parenthesis without opening".to_string(),
            ));
        }
    }
    if depth != 0 {
        return Err(RuleError::UnbalancedParentheses(format!(
            "{} unclosed parenthesis",
            depth
        )));
    }
    Ok(())
}

/// Unified grammar against the default schema
pub fn diagnose(text: &str) -> Result<AstNode> {
    diagnose_with(text, AttributeSchema::global())
}

/// Unified grammar: the tree on success, a typed error otherwise
pub fn diagnose_with(text: &str, schema: &AttributeSchema) -> Result<AstNode> {
    check_balance(text)?;
    parse_tree(text, schema, LeafGrammar::Scanned)
}

/// Disagreement between the legacy gate and the unified grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Divergence {
    /// Admitted by the legacy gate but rejected now: existing stored texts need migration
    LegacyOnly(RuleError),
    /// Rejected by the legacy gate only
    StrictOnly,
}

pub fn divergence(text: &str) -> Option<Divergence> {
    divergence_with(text, AttributeSchema::global())
}

pub fn divergence_with(text: &str, schema: &AttributeSchema) -> Option<Divergence> {
    match (is_valid_with(text, schema), diagnose_with(text, schema)) {
        (true, Err(e)) => Some(Divergence::LegacyOnly(e)),
        (false, Ok(_)) => Some(Divergence::StrictOnly),
        _ => None,
    }
}

/// Whether the text mentions at least one schema attribute as a whole word
pub fn references_known_attributes(text: &str, schema: &AttributeSchema) -> bool {
    let alternation = schema
        .attribute_names()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"\b(?:{})\b", alternation))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
