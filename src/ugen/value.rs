//! Property values
//!
//! A node's properties are an ordered list of keyed [`Value`]s. Insertion
//! order is significant: it is the operand order for codegen and the key
//! order of mirrored snapshots.

use std::fmt;

use super::node::NodeRef;

/// Key of a single property: positional argument or named parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Index(usize),
    Named(String),
}

impl PropertyKey {
    /// Parse a wire key: integers become positional keys
    pub fn parse(key: &str) -> Self {
        match key.parse::<usize>() {
            Ok(index) => PropertyKey::Index(index),
            Err(_) => PropertyKey::Named(key.to_string()),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(index) => write!(f, "{}", index),
            PropertyKey::Named(name) => f.write_str(name),
        }
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        PropertyKey::Index(index)
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Named(name.to_string())
    }
}

/// A property value or method argument
#[derive(Debug, Clone, Default)]
pub enum Value {
    Scalar(f64),
    Bool(bool),
    Text(String),
    Node(NodeRef),
    #[default]
    Unset,
}

impl Value {
    /// Numeric view used by callbacks
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Interpret this value as a property key (method arguments name keys
    /// either by index or by string)
    pub fn as_key(&self) -> Option<PropertyKey> {
        match self {
            Value::Scalar(v) if *v >= 0.0 && v.fract() == 0.0 => Some(PropertyKey::Index(*v as usize)),
            Value::Text(text) => Some(PropertyKey::parse(text)),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            (Value::Unset, Value::Unset) => true,
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(v as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<NodeRef> for Value {
    fn from(node: NodeRef) -> Self {
        Value::Node(node)
    }
}

impl From<&NodeRef> for Value {
    fn from(node: &NodeRef) -> Self {
        Value::Node(node.clone())
    }
}

/// Ordered property bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(PropertyKey, Value)>,
}

impl Properties {
    /// Create an empty property bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Store each value at integer keys `0..n-1`
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (PropertyKey::Index(i), v))
                .collect(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, PropertyKey::Named(n) if n == name))
            .map(|(_, v)| v)
    }

    /// Set a property, keeping its position if the key already exists
    ///
    /// Returns true when a new key was appended.
    pub fn set(&mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => {
                entry.1 = value;
                false
            }
            None => {
                self.entries.push((key, value));
                true
            }
        }
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
