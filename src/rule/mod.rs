//! Rule parsing, combination and evaluation module
//!
//! This module handles rule strings like "(age > 30 AND department = 'IT')":
//! parsing them into an AST, merging several into one tree, flattening the
//! result, evaluating it against a data record and writing it back as text.

mod ast;
pub mod combiner;
pub mod compiled;
mod evaluator;
pub mod optimizer;
pub mod parser;
mod serializer;
pub mod validator;


pub use ast::*;
pub use combiner::*;
pub use compiled::*;
pub use evaluator::*;
pub use optimizer::*;
pub use parser::*;
pub use serializer::*;
pub use validator::*;
