//! Expression compiler
//!
//! Renders a node's property tree into nested expression text for the audio
//! callback. Infix operators render as `( a0 OP a1 OP ... )`; functions as
//! `name(a0, a1, ...)`. Nested nodes are compiled in place, never flattened
//! to scalars.

use crate::error::{Result, UgenError};
use crate::ugen::{NodeId, NodeRef, PropertyKey, RenderForm, UnitGenerator, Value};

/// Default limit on nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Recursive expression renderer
#[derive(Debug, Clone)]
pub struct ExpressionCompiler {
    max_depth: usize,
}

impl Default for ExpressionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionCompiler {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Compile a shared node, refreshing the cached expression of every node
    /// rendered along the way
    pub fn compile(&self, node: &NodeRef) -> Result<String> {
        let mut path = Vec::new();
        self.render_ref(node, &mut path)
    }

    /// Compile a node that is not (yet) shared in a graph
    pub fn compile_node(&self, node: &dyn UnitGenerator) -> Result<String> {
        let mut path = vec![node.id()];
        self.render_body(node, &mut path)
    }

    fn render_ref(&self, node: &NodeRef, path: &mut Vec<NodeId>) -> Result<String> {
        let id = node.id();
        if path.contains(&id) {
            return Err(UgenError::CyclicGraph { node: id });
        }
        if path.len() >= self.max_depth {
            return Err(UgenError::Compilation {
                node: id,
                reason: format!("nesting deeper than {} levels", self.max_depth),
            });
        }

        path.push(id);
        let text = {
            let guard = node.read();
            self.render_body(&*guard, path)?
        };
        path.pop();

        node.write().core_mut().cache_expression(text.clone());
        Ok(text)
    }

    fn render_body(&self, node: &dyn UnitGenerator, path: &mut Vec<NodeId>) -> Result<String> {
        match node.form() {
            RenderForm::Infix(symbol) => self.render_infix(node, symbol, path),
            RenderForm::Call(function) => self.render_call(node, function, path),
        }
    }

    fn render_infix(
        &self,
        node: &dyn UnitGenerator,
        symbol: &'static str,
        path: &mut Vec<NodeId>,
    ) -> Result<String> {
        let properties = node.properties();
        if properties.is_empty() {
            return Err(UgenError::EmptyOperator { operator: symbol });
        }

        let last = properties.len() - 1;
        let mut out = String::from("( ");
        for (i, (key, value)) in properties.iter().enumerate() {
            match value {
                Value::Scalar(v) => out.push_str(&scalar_text(node.id(), *v)?),
                Value::Node(child) => out.push_str(&self.render_ref(child, path)?),
                other => {
                    return Err(UgenError::Compilation {
                        node: node.id(),
                        reason: format!("operand {} is neither a scalar nor a node: {:?}", key, other),
                    })
                }
            }

            if i < last {
                out.push(' ');
                out.push_str(symbol);
                out.push(' ');
            }
        }
        out.push_str(" )");

        Ok(out)
    }

    fn render_call(
        &self,
        node: &dyn UnitGenerator,
        function: &'static str,
        path: &mut Vec<NodeId>,
    ) -> Result<String> {
        let mut args = Vec::with_capacity(node.properties().len());
        for (key, value) in node.properties().iter() {
            args.push(self.render_argument(node.id(), key, value, path)?);
        }
        Ok(format!("{}({})", function, args.join(", ")))
    }

    fn render_argument(
        &self,
        id: NodeId,
        key: &PropertyKey,
        value: &Value,
        path: &mut Vec<NodeId>,
    ) -> Result<String> {
        match value {
            Value::Scalar(v) => scalar_text(id, *v),
            Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            Value::Node(child) => self.render_ref(child, path),
            Value::Unset => Err(UgenError::Compilation {
                node: id,
                reason: format!("property {} is unset", key),
            }),
            Value::Text(text) => Err(UgenError::Compilation {
                node: id,
                reason: format!("property {} holds text '{}'", key, text),
            }),
        }
    }
}

/// Textual form of a scalar; non-finite values have no expression form
fn scalar_text(node: NodeId, v: f64) -> Result<String> {
    if !v.is_finite() {
        return Err(UgenError::Compilation {
            node,
            reason: format!("scalar {} is not finite", v),
        });
    }
    Ok(v.to_string())
}
