//! AST to rule string conversion

use std::fmt;

use crate::rule::ast::AstNode;

/// Convert an AST back into a rule string
///
/// Every operator node is parenthesized, so the output re-parses to a tree
/// with the same shape regardless of the missing AND/OR precedence.
pub fn to_text(ast: &AstNode) -> String {
    ast.to_string()
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Operand { condition } => f.write_str(condition),
            AstNode::Operator {
                connective,
                left,
                right,
            } => write!(f, "({} {} {})", left, connective, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Connective;
    use crate::rule::evaluator::evaluate;
    use crate::rule::parser::parse;
    use serde_json::json;

    #[test]
    fn test_operand_verbatim() {
        assert_eq!(to_text(&AstNode::operand("department = 'IT'")), "department = 'IT'");
    }

    #[test]
    fn test_operator_parenthesized() {
        let ast = AstNode::operator(
            Connective::Or,
            AstNode::operand("age > 30"),
            AstNode::operator(
                Connective::And,
                AstNode::operand("salary > 50000"),
                AstNode::operand("experience > 3"),
            ),
        );
        assert_eq!(
            to_text(&ast),
            "(age > 30 OR (salary > 50000 AND experience > 3))"
        );
    }

    #[test]
    fn test_redundant_parentheses_normalized() {
        let ast = parse("((age > 30) AND (salary > 50000))").unwrap();
        assert_eq!(to_text(&ast), "(age > 30 AND salary > 50000)");
    }

    #[test]
    fn test_round_trip_keeps_shape() {
        let rule = "age > 30 OR salary > 50000 AND department = 'IT'";
        let ast = parse(rule).unwrap();
        let reparsed = parse(&to_text(&ast)).unwrap();
        assert_eq!(reparsed, ast);
    }

    #[test]
    fn test_round_trip_evaluates_identically() {
        let ast = parse("(age > 30 AND salary > 50000)").unwrap();
        let converted = parse(&to_text(&ast)).unwrap();
        let data = match json!({"age": 35, "salary": 60000}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(evaluate(&converted, &data), evaluate(&ast, &data));
    }
}
