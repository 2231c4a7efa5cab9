//! Combine independently-authored rules into one tree
//!
//! The joining connective is whichever occurs most often inside the input
//! trees. AND wins ties, including the all-zero case where every input is a
//! single condition.

use tracing::debug;

use crate::config::{AttributeSchema, Connective};
use crate::error::{Result, RuleError};
use crate::rule::ast::AstNode;
use crate::rule::optimizer::optimize;
use crate::rule::parser::parse_with;

/// Connective counts across a forest of trees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectiveFrequency {
    pub and: usize,
    pub or: usize,
}

impl ConnectiveFrequency {
    pub fn count<'a>(trees: impl IntoIterator<Item = &'a AstNode>) -> Self {
        let mut freq = Self::default();
        for tree in trees {
            freq.visit(tree);
        }
        freq
    }

    fn visit(&mut self, node: &AstNode) {
        if let AstNode::Operator {
            connective,
            left,
            right,
        } = node
        {
            match connective {
                Connective::And => self.and += 1,
                Connective::Or => self.or += 1,
            }
            self.visit(left);
            self.visit(right);
        }
    }

    /// Strictly highest count; AND on ties
    pub fn dominant(&self) -> Connective {
        if self.or > self.and {
            Connective::Or
        } else {
            Connective::And
        }
    }
}

/// Combine rule strings using the default schema
pub fn combine<S: AsRef<str>>(texts: &[S]) -> Result<AstNode> {
    combine_with(texts, AttributeSchema::global())
}

/// Parse every rule, pick the dominant connective and fold the trees with it
pub fn combine_with<S: AsRef<str>>(texts: &[S], schema: &AttributeSchema) -> Result<AstNode> {
    let trees = texts
        .iter()
        .map(|text| parse_with(text.as_ref(), schema))
        .collect::<Result<Vec<_>>>()?;

    let freq = ConnectiveFrequency::count(&trees);
    let connective = freq.dominant();
    debug!(
        rules = trees.len(),
        and = freq.and,
        or = freq.or,
        %connective,
        "combining rules"
    );

    combine_trees(trees, connective)
}

/// Fold trees into a right-leaning chain and optimize it
///
/// The chain is built from the back: the last two trees are siblings, and
/// every earlier tree becomes the left child of a new node on top.
pub fn combine_trees(trees: Vec<AstNode>, connective: Connective) -> Result<AstNode> {
    let mut rev = trees.into_iter().rev();
    let Some(last) = rev.next() else {
        return Err(RuleError::EmptyRuleSet);
    };
    let Some(second_last) = rev.next() else {
        return Ok(last);
    };

    let chain = rev.fold(
        AstNode::operator(connective, second_last, last),
        |acc, tree| AstNode::operator(connective, tree, acc),
    );

    Ok(optimize(chain))
}
