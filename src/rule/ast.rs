//! Abstract Syntax Tree for rule expressions

use serde::{Deserialize, Serialize};

use crate::config::Connective;
use crate::error::Result;

/// AST node for rule expressions
///
/// Serializes to the stored document shape:
/// `{"type":"operator","value":"AND","left":{..},"right":{..}}` and
/// `{"type":"operand","value":"age > 30"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AstNode {
    /// Two sub-expressions joined by AND/OR
    Operator {
        #[serde(rename = "value")]
        connective: Connective,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// Single condition like "age > 30"
    Operand {
        #[serde(rename = "value")]
        condition: String,
    },
}

impl AstNode {
    pub fn operator(connective: Connective, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn operand(condition: impl Into<String>) -> Self {
        AstNode::Operand {
            condition: condition.into(),
        }
    }

    pub fn is_operand(&self) -> bool {
        matches!(self, AstNode::Operand { .. })
    }

    pub fn connective(&self) -> Option<Connective> {
        match self {
            AstNode::Operator { connective, .. } => Some(*connective),
            AstNode::Operand { .. } => None,
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match self {
            AstNode::Operand { condition } => Some(condition),
            AstNode::Operator { .. } => None,
        }
    }

    pub fn left(&self) -> Option<&AstNode> {
        match self {
            AstNode::Operator { left, .. } => Some(left),
            AstNode::Operand { .. } => None,
        }
    }

    pub fn right(&self) -> Option<&AstNode> {
        match self {
            AstNode::Operator { right, .. } => Some(right),
            AstNode::Operand { .. } => None,
        }
    }

    /// Leaf conditions in left-to-right order
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            AstNode::Operand { condition } => out.push(condition),
            AstNode::Operator { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            AstNode::Operand { .. } => 1,
            AstNode::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored tree. Unknown node types are `MalformedTree`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;

    fn sample() -> AstNode {
        AstNode::operator(
            Connective::And,
            AstNode::operand("age > 30"),
            AstNode::operator(
                Connective::Or,
                AstNode::operand("department = 'IT'"),
                AstNode::operand("salary > 50000"),
            ),
        )
    }

    #[test]
    fn test_accessors() {
        let ast = sample();
        assert_eq!(ast.connective(), Some(Connective::And));
        assert_eq!(ast.left().and_then(AstNode::condition), Some("age > 30"));
        assert_eq!(ast.right().and_then(AstNode::connective), Some(Connective::Or));
        assert_eq!(
            ast.leaves(),
            vec!["age > 30", "department = 'IT'", "salary > 50000"]
        );
        assert_eq!(ast.depth(), 3);
        assert!(!ast.is_operand());
    }

    #[test]
    fn test_json_shape() {
        let json = AstNode::operator(
            Connective::Or,
            AstNode::operand("age > 30"),
            AstNode::operand("age < 20"),
        )
        .to_json()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "operator");
        assert_eq!(value["value"], "OR");
        assert_eq!(value["left"]["type"], "operand");
        assert_eq!(value["left"]["value"], "age > 30");
    }

    #[test]
    fn test_from_stored_document() {
        // Stored operands carry null children
        let json = r#"{
            "type": "operator", "value": "AND",
            "left": {"type": "operand", "value": "age > 30", "left": null, "right": null},
            "right": {"type": "operand", "value": "salary > 50000", "left": null, "right": null}
        }"#;
        let ast = AstNode::from_json(json).unwrap();
        assert_eq!(
            ast,
            AstNode::operator(
                Connective::And,
                AstNode::operand("age > 30"),
                AstNode::operand("salary > 50000"),
            )
        );
        assert_eq!(AstNode::from_json(&sample().to_json().unwrap()).unwrap(), sample());
    }

    #[test]
    fn test_unknown_node_type_is_structural() {
        let err = AstNode::from_json(r#"{"type": "comparison", "value": ">"}"#).unwrap_err();
        assert!(matches!(err, RuleError::MalformedTree(_)));

        let err = AstNode::from_json(r#"{"type": "operator", "value": "XOR"}"#).unwrap_err();
        assert!(matches!(err, RuleError::MalformedTree(_)));
    }
}
