//! Structural flattening of same-connective chains
//!
//! Nodes are moved, never shared: every rewrite consumes its input subtrees
//! and hands them to exactly one new parent.
//!
//! The rewrite never looks at condition text, only at the connective
//! skeleton, so it runs on interned skeletons and the operands are put back
//! in their original left-to-right order afterwards. Each distinct skeleton
//! is optimized once. Work grows polynomially with the operand count
//! (combining 64 plain conditions visits about half a million skeletons)
//! instead of doubling with every re-optimized child.

use ahash::AHashMap;

use crate::config::Connective;
use crate::rule::ast::AstNode;

/// Index into `Skeletons::junctions`; 0 is the operand
type ShapeId = usize;

const OPERAND: ShapeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Junction {
    connective: Connective,
    left: ShapeId,
    right: ShapeId,
}

/// Hash-consed connective skeletons with the optimized form of each
struct Skeletons {
    junctions: Vec<Option<Junction>>,
    interned: AHashMap<Junction, ShapeId>,
    optimized: AHashMap<ShapeId, ShapeId>,
}

impl Skeletons {
    fn new() -> Self {
        Self {
            junctions: vec![None],
            interned: AHashMap::new(),
            optimized: AHashMap::new(),
        }
    }

    fn intern(&mut self, connective: Connective, left: ShapeId, right: ShapeId) -> ShapeId {
        let junction = Junction {
            connective,
            left,
            right,
        };
        if let Some(&id) = self.interned.get(&junction) {
            return id;
        }
        let id = self.junctions.len();
        self.junctions.push(Some(junction));
        self.interned.insert(junction, id);
        id
    }

    /// Take the tree apart: operands go to `operands` in order, the
    /// skeleton is interned
    fn decompose(&mut self, ast: AstNode, operands: &mut Vec<AstNode>) -> ShapeId {
        match ast {
            AstNode::Operator {
                connective,
                left,
                right,
            } => {
                let left = self.decompose(*left, operands);
                let right = self.decompose(*right, operands);
                self.intern(connective, left, right)
            }
            operand => {
                operands.push(operand);
                OPERAND
            }
        }
    }

    /// Same-connective child of an optimized node, split into its children
    fn same(&self, shape: ShapeId, connective: Connective) -> Option<(ShapeId, ShapeId)> {
        match self.junctions[shape] {
            Some(junction) if junction.connective == connective => {
                Some((junction.left, junction.right))
            }
            _ => None,
        }
    }

    fn optimize(&mut self, shape: ShapeId) -> ShapeId {
        let Some(junction) = self.junctions[shape] else {
            return OPERAND;
        };
        if let Some(&done) = self.optimized.get(&shape) {
            return done;
        }

        let connective = junction.connective;
        let left = self.optimize(junction.left);
        let right = self.optimize(junction.right);

        let result = if let Some((left_left, left_right)) = self.same(left, connective) {
            let moved = self.intern(connective, left_right, right);
            let merged = self.optimize(moved);
            self.intern(connective, left_left, merged)
        } else if let Some((right_left, right_right)) = self.same(right, connective) {
            let moved = self.intern(connective, left, right_left);
            let merged = self.optimize(moved);
            self.intern(connective, merged, right_right)
        } else {
            self.intern(connective, left, right)
        };

        self.optimized.insert(shape, result);
        result
    }

    /// Rebuild a tree of `shape`, taking operands in order
    fn assemble(
        &self,
        shape: ShapeId,
        operands: &mut impl Iterator<Item = AstNode>,
    ) -> Option<AstNode> {
        match self.junctions[shape] {
            None => operands.next(),
            Some(Junction {
                connective,
                left,
                right,
            }) => {
                let left = self.assemble(left, operands)?;
                let right = self.assemble(right, operands)?;
                Some(AstNode::operator(connective, left, right))
            }
        }
    }
}

/// Optimize an AST, post-order
///
/// After both children are optimized, a left child with the node's own
/// connective gives its right subtree to a new right-hand node, which is
/// optimized again; otherwise a right child with the same connective gives
/// its left subtree to a new left-hand node. Leaf order and evaluation
/// result are preserved.
pub fn optimize(ast: AstNode) -> AstNode {
    if ast.is_operand() {
        return ast;
    }

    let mut skeletons = Skeletons::new();
    let mut operands = Vec::new();
    let shape = skeletons.decompose(ast, &mut operands);
    let optimized = skeletons.optimize(shape);

    match skeletons.assemble(optimized, &mut operands.into_iter()) {
        Some(ast) => ast,
        None => unreachable!("rewrites keep every operand"),
    }
}
