//! Rule string parser
//!
//! The grammar has no precedence between AND and OR: the leftmost connective
//! found at parenthesis depth 0 splits the expression. Mixed expressions must
//! be disambiguated with explicit parentheses.

use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, trace};

use crate::config::{AttributeKind, AttributeSchema, Comparator, Connective};
use crate::error::{Result, RuleError};
use crate::rule::ast::AstNode;

/// Parse a rule string into an AST using the default schema
pub fn parse(text: &str) -> Result<AstNode> {
    parse_with(text, AttributeSchema::global())
}

/// Parse a rule string into an AST
pub fn parse_with(text: &str, schema: &AttributeSchema) -> Result<AstNode> {
    parse_tree(text, schema, LeafGrammar::Exact)
}

/// How a leaf condition is cut into attribute, operator and literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafGrammar {
    /// Exactly three tokens separated by single spaces
    Exact,
    /// Leftmost comparator, longest symbol first; spacing around it is free
    Scanned,
}

/// Split on connectives, then cut each leaf with `grammar`
///
/// Operands hold the normalized `attribute operator literal` text.
pub fn parse_tree(text: &str, schema: &AttributeSchema, grammar: LeafGrammar) -> Result<AstNode> {
    let text = strip_outer_parens(text.trim());

    if let Some((pos, connective)) = find_split(text) {
        let left = text[..pos].trim();
        let right = text[pos + connective.infix().len()..].trim();
        trace!(%connective, left, right, "splitting rule");

        let left = parse_tree(left, schema, grammar)?;
        let right = parse_tree(right, schema, grammar)?;
        return Ok(AstNode::operator(connective, left, right));
    }

    parse_condition(text, schema, grammar).inspect_err(|e| {
        debug!(condition = text, error = %e, ?grammar, "rejected condition");
    })
}

/// Remove parentheses that wrap the whole expression
fn strip_outer_parens(mut text: &str) -> &str {
    while text.len() >= 2
        && text.starts_with('(')
        && matching_close(text) == Some(text.len() - 1)
    {
        text = text[1..text.len() - 1].trim();
    }
    text
}

/// Byte index of the `)` closing the `(` at index 0
fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Leftmost ` AND ` / ` OR ` at depth 0; AND is checked first at each position
fn find_split(text: &str) -> Option<(usize, Connective)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ if depth == 0 => {
                for connective in Connective::ALL {
                    if bytes[i..].starts_with(connective.infix().as_bytes()) {
                        return Some((i, connective));
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// A leaf condition split into its three tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition<'a> {
    pub attribute: &'a str,
    pub operator: &'a str,
    pub literal: &'a str,
}

impl<'a> Condition<'a> {
    /// Split on single spaces; `None` unless there are exactly three tokens
    pub fn split(text: &'a str) -> Option<Self> {
        let tokens: SmallVec<[&str; 3]> = text.split(' ').collect();
        match tokens.as_slice() {
            &[attribute, operator, literal] => Some(Self {
                attribute,
                operator,
                literal,
            }),
            _ => None,
        }
    }

    /// Cut at the leftmost comparator; both sides must be single tokens
    pub fn scan(text: &'a str) -> Option<Self> {
        let (pos, comparator) = Comparator::leftmost(text)?;
        let end = pos + comparator.symbol().len();
        let attribute = text[..pos].trim();
        let literal = text[end..].trim();

        let single = |token: &str| !token.is_empty() && !token.contains(char::is_whitespace);
        if !single(attribute) || !single(literal) {
            return None;
        }

        Some(Self {
            attribute,
            operator: &text[pos..end],
            literal,
        })
    }
}

impl fmt::Display for Condition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.literal)
    }
}

/// Lexical class of a condition literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralClass {
    Numeric,
    Quoted,
}

impl LiteralClass {
    pub fn of(literal: &str) -> Option<Self> {
        if parse_number(literal).is_some() {
            Some(LiteralClass::Numeric)
        } else if unquote(literal).is_some() {
            Some(LiteralClass::Quoted)
        } else {
            None
        }
    }

    fn matches(self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (LiteralClass::Numeric, AttributeKind::Numeric)
                | (LiteralClass::Quoted, AttributeKind::Text)
        )
    }
}

/// Finite decimal number
#[inline]
pub fn parse_number(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Content of a `'...'` literal
#[inline]
pub fn unquote(literal: &str) -> Option<&str> {
    if literal.len() >= 2 && literal.starts_with('\'') && literal.ends_with('\'') {
        Some(&literal[1..literal.len() - 1])
    } else {
        None
    }
}

fn parse_condition(text: &str, schema: &AttributeSchema, grammar: LeafGrammar) -> Result<AstNode> {
    let cond = match grammar {
        LeafGrammar::Exact => Condition::split(text),
        LeafGrammar::Scanned => Condition::scan(text),
    }
    .ok_or_else(|| RuleError::MalformedCondition(text.to_string()))?;

    let kind = schema
        .kind_of(cond.attribute)
        .ok_or_else(|| RuleError::InvalidAttribute(cond.attribute.to_string()))?;

    cond.operator.parse::<Comparator>()?;

    let class = LiteralClass::of(cond.literal)
        .ok_or_else(|| RuleError::InvalidLiteral(cond.literal.to_string()))?;

    if !class.matches(kind) {
        return Err(RuleError::KindMismatch {
            attribute: cond.attribute.to_string(),
            expected: kind,
        });
    }

    Ok(AstNode::operand(cond.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_condition() {
        let ast = parse("age > 30").unwrap();
        match ast {
            AstNode::Operand { condition } => assert_eq!(condition, "age > 30"),
            _ => panic!("Expected operand"),
        }
    }

    #[test]
    fn test_parse_string_condition() {
        let ast = parse("department = 'IT'").unwrap();
        assert_eq!(ast, AstNode::operand("department = 'IT'"));
    }

    #[test]
    fn test_parse_and_condition() {
        let ast = parse("(age > 30 AND salary > 50000)").unwrap();
        assert_eq!(
            ast,
            AstNode::operator(
                Connective::And,
                AstNode::operand("age > 30"),
                AstNode::operand("salary > 50000"),
            )
        );
    }

    #[test]
    fn test_parse_or_condition() {
        let ast = parse("(department = 'IT' OR department = 'HR')").unwrap();
        match ast {
            AstNode::Operator {
                connective: Connective::Or,
                left,
                right,
            } => {
                assert!(left.is_operand());
                assert!(right.is_operand());
            }
            _ => panic!("Expected OR operator"),
        }
    }

    #[test]
    fn test_parse_all_operators() {
        for op in [">", "<", ">=", "<=", "=", "!="] {
            let rule = format!("age {} 30", op);
            let ast = parse(&rule).unwrap();
            assert_eq!(ast.condition(), Some(rule.as_str()), "Failed for: {}", op);
        }
    }

    #[test]
    fn test_leftmost_connective_wins() {
        // No precedence: the first keyword at depth 0 splits
        let ast = parse("age > 30 AND salary > 50000 OR experience > 3").unwrap();
        match ast {
            AstNode::Operator {
                connective: Connective::And,
                left,
                right,
            } => {
                assert_eq!(left.condition(), Some("age > 30"));
                assert_eq!(right.connective(), Some(Connective::Or));
            }
            _ => panic!("Expected AND at the root"),
        }

        let ast = parse("age > 30 OR salary > 50000 AND experience > 3").unwrap();
        assert_eq!(ast.connective(), Some(Connective::Or));
        assert_eq!(ast.right().and_then(AstNode::connective), Some(Connective::And));
    }

    #[test]
    fn test_parse_nested_parentheses() {
        let ast = parse(
            "(age > 30 AND (department = 'IT' OR department = 'HR') AND (salary > 50000 OR experience > 3))",
        )
        .unwrap();
        assert_eq!(ast.connective(), Some(Connective::And));
        assert_eq!(ast.left().and_then(AstNode::condition), Some("age > 30"));
        let right = ast.right().unwrap();
        assert_eq!(right.connective(), Some(Connective::And));
        assert_eq!(right.left().and_then(AstNode::connective), Some(Connective::Or));
        assert_eq!(right.right().and_then(AstNode::connective), Some(Connective::Or));
        assert_eq!(ast.leaves().len(), 5);
    }

    #[test]
    fn test_parenthesized_groups_are_not_stripped_as_one() {
        let ast = parse("(age > 30) AND (salary > 50000)").unwrap();
        assert_eq!(
            ast,
            AstNode::operator(
                Connective::And,
                AstNode::operand("age > 30"),
                AstNode::operand("salary > 50000"),
            )
        );
    }

    #[test]
    fn test_redundant_parentheses() {
        assert_eq!(parse("((age > 30))").unwrap(), AstNode::operand("age > 30"));
        assert_eq!(parse("  ( age > 30 )  ").unwrap(), AstNode::operand("age > 30"));
    }

    #[test]
    fn test_invalid_attribute() {
        assert_eq!(
            parse("role = 'developer'"),
            Err(RuleError::InvalidAttribute("role".to_string()))
        );
    }

    #[test]
    fn test_invalid_operator() {
        assert_eq!(
            parse("age == 30"),
            Err(RuleError::InvalidOperator("==".to_string()))
        );
    }

    #[test]
    fn test_invalid_literal() {
        assert_eq!(
            parse("department = IT"),
            Err(RuleError::InvalidLiteral("IT".to_string()))
        );
    }

    #[test]
    fn test_kind_mismatch() {
        assert_eq!(
            parse("age > 'thirty'"),
            Err(RuleError::KindMismatch {
                attribute: "age".to_string(),
                expected: AttributeKind::Numeric,
            })
        );
        assert_eq!(
            parse("department = 42"),
            Err(RuleError::KindMismatch {
                attribute: "department".to_string(),
                expected: AttributeKind::Text,
            })
        );
    }

    #[test]
    fn test_malformed_condition() {
        assert!(matches!(parse("age>30"), Err(RuleError::MalformedCondition(_))));
        assert!(matches!(parse(""), Err(RuleError::MalformedCondition(_))));
        assert!(matches!(
            parse("department = 'Human Resources'"),
            Err(RuleError::MalformedCondition(_))
        ));
        // A dangling connective leaves a four-token leaf
        assert!(matches!(
            parse("age > 30 AND"),
            Err(RuleError::MalformedCondition(_))
        ));
    }

    #[test]
    fn test_error_in_nested_branch_propagates() {
        assert_eq!(
            parse("(age > 30 AND (salary > 50000 OR bonus > 10))"),
            Err(RuleError::InvalidAttribute("bonus".to_string()))
        );
    }

    #[test]
    fn test_custom_schema() {
        let schema = AttributeSchema::new([
            ("role", AttributeKind::Text),
            ("level", AttributeKind::Numeric),
        ])
        .unwrap();
        assert!(parse_with("role = 'developer' AND level > 2", &schema).is_ok());
        assert_eq!(
            parse_with("age > 30", &schema),
            Err(RuleError::InvalidAttribute("age".to_string()))
        );
    }

    #[test]
    fn test_literal_classes() {
        assert_eq!(LiteralClass::of("30"), Some(LiteralClass::Numeric));
        assert_eq!(LiteralClass::of("-2.5"), Some(LiteralClass::Numeric));
        assert_eq!(LiteralClass::of("'IT'"), Some(LiteralClass::Quoted));
        assert_eq!(LiteralClass::of("''"), Some(LiteralClass::Quoted));
        assert_eq!(LiteralClass::of("'"), None);
        assert_eq!(LiteralClass::of("inf"), None);
        assert_eq!(LiteralClass::of("IT"), None);
    }

    #[test]
    fn test_condition_split() {
        let cond = Condition::split("salary >= 50000").unwrap();
        assert_eq!(cond.attribute, "salary");
        assert_eq!(cond.operator, ">=");
        assert_eq!(cond.literal, "50000");
        assert!(Condition::split("salary  >= 50000").is_none());
        assert!(Condition::split("salary>=50000").is_none());
    }

    #[test]
    fn test_condition_scan_keeps_two_character_comparators() {
        let cond = Condition::scan("age<=30").unwrap();
        assert_eq!((cond.attribute, cond.operator, cond.literal), ("age", "<=", "30"));

        let cond = Condition::scan("age!=30").unwrap();
        assert_eq!((cond.attribute, cond.operator, cond.literal), ("age", "!=", "30"));

        let cond = Condition::scan("salary  >=   50000").unwrap();
        assert_eq!(cond.to_string(), "salary >= 50000");

        assert!(Condition::scan("age 30").is_none());
        assert!(Condition::scan(">= 30").is_none());
        assert!(Condition::scan("age >=").is_none());
        assert!(Condition::scan("department = 'Human Resources'").is_none());
    }

    #[test]
    fn test_scanned_grammar_normalizes_operands() {
        let schema = AttributeSchema::global();
        assert_eq!(
            parse_tree("(age<=30 AND department='IT')", schema, LeafGrammar::Scanned).unwrap(),
            AstNode::operator(
                Connective::And,
                AstNode::operand("age <= 30"),
                AstNode::operand("department = 'IT'"),
            )
        );
        assert_eq!(
            parse_tree("age!=30", schema, LeafGrammar::Scanned).unwrap(),
            AstNode::operand("age != 30")
        );
        assert_eq!(
            parse_tree("age = =30", schema, LeafGrammar::Scanned),
            Err(RuleError::InvalidLiteral("=30".to_string()))
        );
        // The exact grammar is unchanged
        assert!(matches!(
            parse_tree("age<=30", schema, LeafGrammar::Exact),
            Err(RuleError::MalformedCondition(_))
        ));
    }
}
