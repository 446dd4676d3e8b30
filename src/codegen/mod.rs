//! Codegen
//!
//! Turns node graphs into inline expression text, and evaluates them
//! sample by sample through their callbacks.

mod compiler;
mod evaluator;

pub use compiler::{ExpressionCompiler, DEFAULT_MAX_DEPTH};
pub use evaluator::Evaluator;
