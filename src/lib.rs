//! ugen-mirror - Audio Graph Codegen and Mirroring
//!
//! Builds audio graphs out of unit generators and keeps a remote copy of
//! them in sync:
//! 1. Codegen - Render a node graph as an inline arithmetic expression
//! 2. Mirroring - Replay construction and method calls in a separate audio context
//!
//! # Architecture
//!
//! - `ugen`: node types (operators, math functions, map, sequence)
//! - `codegen`: expression compiler and sample evaluator
//! - `mirror`: snapshot codec, message channel, interceptor and receiver

pub mod cli;
pub mod codegen;
pub mod error;
pub mod mirror;
pub mod ugen;

pub use error::{Result, UgenError};
