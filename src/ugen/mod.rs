//! Unit Generators
//!
//! Nodes of an audio graph. Every node implements [`UnitGenerator`] and
//! stores its inputs in an ordered [`Properties`] bag of scalars and
//! references to other nodes.

mod functions;
mod map;
mod node;
pub mod operators;
mod sequence;
mod value;

pub use functions::{abs, merge, pow, sqrt, Merge, Pow, UnaryFunction, UnaryKind};
pub use map::{Curve, Map, MapRange};
pub use node::{NodeCore, NodeRef, RenderForm, UnitGenerator};
pub use operators::{add, div, modulo, mul, sub, BinaryOp, Operator};
pub use sequence::Sequence;
pub use value::{Properties, PropertyKey, Value};

pub use crate::mirror::NodeId;
