//! Unit generator trait definition
//!
//! Base trait for every node in an audio graph. Operators, functions and
//! the mirroring decorator all implement [`UnitGenerator`] and share the
//! property-bag shape held in [`NodeCore`].

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::value::{Properties, PropertyKey, Value};
use crate::error::{Result, UgenError};
use crate::mirror::{CreateMessage, NodeId};

/// How the expression compiler renders a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderForm {
    /// `( a0 OP a1 OP ... )`
    Infix(&'static str),
    /// `name(a0, a1, ...)`
    Call(&'static str),
}

/// State common to all unit generators
#[derive(Debug)]
pub struct NodeCore {
    id: NodeId,
    name: &'static str,
    properties: Properties,
    cached_expression: Option<String>,
}

impl NodeCore {
    /// Create the core of a new node with a freshly allocated id
    pub fn new(name: &'static str, properties: Properties) -> Self {
        Self {
            id: NodeId::next(),
            name,
            properties,
            cached_expression: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Constructor name (e.g. `"add"`, `"map"`)
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Set a property and drop the cached expression
    pub fn set_property(&mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        self.properties.set(key, value);
        self.cached_expression = None;
    }

    /// Last expression text rendered for this node
    pub fn cached_expression(&self) -> Option<&str> {
        self.cached_expression.as_deref()
    }

    pub(crate) fn cache_expression(&mut self, text: String) {
        self.cached_expression = Some(text);
    }

    /// Methods every node answers: `set(key, value)` and `get(key)`
    pub fn invoke_common(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match method {
            "set" => {
                let [key, value] = args else {
                    return Err(UgenError::InvalidArgument {
                        method: method.to_string(),
                        reason: format!("expected (key, value), got {} argument(s)", args.len()),
                    });
                };
                let key = key.as_key().ok_or_else(|| UgenError::InvalidArgument {
                    method: method.to_string(),
                    reason: format!("{:?} is not a property key", key),
                })?;
                self.set_property(key, value.clone());
                Ok(Value::Unset)
            }
            "get" => {
                let key = args
                    .first()
                    .and_then(Value::as_key)
                    .ok_or_else(|| UgenError::InvalidArgument {
                        method: method.to_string(),
                        reason: "expected a property key".to_string(),
                    })?;
                Ok(self.properties.get(&key).cloned().unwrap_or_default())
            }
            _ => Err(UgenError::UnknownMethod {
                node: self.id,
                method: method.to_string(),
            }),
        }
    }
}

/// Base trait for all unit generators
///
/// `process` is the audio-time callback: it receives the evaluated values of
/// the node's properties, in property order.
pub trait UnitGenerator: Send + Sync + fmt::Debug {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// Shape used by the expression compiler
    fn form(&self) -> RenderForm;

    /// Compute one output sample from evaluated inputs
    fn process(&mut self, inputs: &[f64]) -> f64;

    /// Call a named method
    fn invoke(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        self.core_mut().invoke_common(method, args)
    }

    /// Whether snapshots must carry this node's full state
    ///
    /// Constant for the lifetime of the node.
    fn is_sequence_producer(&self) -> bool {
        false
    }

    /// Create metadata attached when the node was mirrored
    fn mirror_meta(&self) -> Option<&CreateMessage> {
        None
    }

    fn id(&self) -> NodeId {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn properties(&self) -> &Properties {
        self.core().properties()
    }
}

/// Implements the `core`/`core_mut` accessors for a type with a `core` field
#[macro_export]
macro_rules! impl_ugen_common {
    () => {
        fn core(&self) -> &$crate::ugen::NodeCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut $crate::ugen::NodeCore {
            &mut self.core
        }
    };
}

/// Shared handle to a node inside a graph
///
/// The id and sequence-producer flag are copied out of the node so graph
/// walks can classify it without taking the lock.
#[derive(Clone)]
pub struct NodeRef {
    id: NodeId,
    sequence_producer: bool,
    inner: Arc<RwLock<dyn UnitGenerator>>,
}

impl NodeRef {
    pub fn new<N: UnitGenerator + 'static>(node: N) -> Self {
        Self {
            id: node.id(),
            sequence_producer: node.is_sequence_producer(),
            inner: Arc::new(RwLock::new(node)),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, dyn UnitGenerator + 'static> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, dyn UnitGenerator + 'static> {
        self.inner.write()
    }

    /// Call a named method through the node (and any decorator around it)
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.write().invoke(method, args)
    }

    pub fn is_sequence_producer(&self) -> bool {
        self.sequence_producer
    }

    /// Compile with the default compiler settings
    pub fn compile(&self) -> Result<String> {
        crate::codegen::ExpressionCompiler::default().compile(self)
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({})", self.id)
    }
}
