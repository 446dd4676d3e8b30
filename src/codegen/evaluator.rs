//! Sample-by-sample evaluation of a node graph
//!
//! Each tick evaluates a node's properties depth-first and feeds the results
//! to the node's `process` callback. Every node is processed at most once per
//! tick; parents sharing a node all read that tick's output.

use std::collections::HashMap;

use crate::error::{Result, UgenError};
use crate::ugen::{NodeId, NodeRef, Value};

use super::compiler::DEFAULT_MAX_DEPTH;

/// Drives `process` callbacks through a graph
#[derive(Debug, Clone)]
pub struct Evaluator {
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Compute one output sample of `node`
    pub fn tick(&self, node: &NodeRef) -> Result<f64> {
        let mut path = Vec::new();
        let mut outputs = HashMap::new();
        self.eval(node, &mut path, &mut outputs)
    }

    /// Compute `count` consecutive samples
    pub fn render(&self, node: &NodeRef, count: usize) -> Result<Vec<f64>> {
        (0..count).map(|_| self.tick(node)).collect()
    }

    fn eval(&self, node: &NodeRef, path: &mut Vec<NodeId>, outputs: &mut HashMap<NodeId, f64>) -> Result<f64> {
        let id = node.id();
        if let Some(output) = outputs.get(&id) {
            return Ok(*output);
        }
        if path.contains(&id) {
            return Err(UgenError::CyclicGraph { node: id });
        }
        if path.len() >= self.max_depth {
            return Err(UgenError::Evaluation {
                node: id,
                reason: format!("nesting deeper than {} levels", self.max_depth),
            });
        }

        path.push(id);
        let inputs = {
            let guard = node.read();
            let mut inputs = Vec::with_capacity(guard.properties().len());
            for (key, value) in guard.properties().iter() {
                let input = match value {
                    Value::Node(child) => self.eval(child, path, outputs)?,
                    other => other.as_f64().ok_or_else(|| UgenError::Evaluation {
                        node: id,
                        reason: format!("property {} has no numeric value", key),
                    })?,
                };
                inputs.push(input);
            }
            inputs
        };
        path.pop();

        let output = node.write().process(&inputs);
        outputs.insert(id, output);
        Ok(output)
    }
}
