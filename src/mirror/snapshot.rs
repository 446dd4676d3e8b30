//! Snapshot codec
//!
//! Converts property values and method arguments into transport-safe trees:
//!
//! 1. scalars, booleans, text and unset values pass through;
//! 2. an ordinary node becomes a reference token `{ "id": n }`, since the
//!    remote context receives that node through its own Create message;
//! 3. a sequence producer is serialized in full, recursively, because its
//!    state must travel with the call that uses it.
//!
//! Rule 3 is the only recursive path. It tracks the ids on the current path
//! and fails with `SerializationOverflow` on a revisit or when the depth
//! limit is reached. Method arguments start the path at the invoking node,
//! which is write-locked for the duration of its own call.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::identity::NodeId;
use super::message::CreateMessage;
use crate::error::{Result, UgenError};
use crate::ugen::{NodeRef, Properties, Value};

/// Default limit on nested sequence-producer serialization
pub const DEFAULT_SNAPSHOT_DEPTH: usize = 64;

/// Transport-safe form of a [`Value`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// Create metadata of a node that was already mirrored
    Created(Box<CreateMessage>),
    /// Full copy of a sequence producer
    Node {
        id: NodeId,
        name: String,
        properties: SnapshotProperties,
    },
    /// Reference token for a node the remote side already holds
    Reference { id: NodeId },
    Scalar(f64),
    Bool(bool),
    Text(String),
    Unset,
}

/// Ordered snapshot of a property bag, serialized as a JSON object whose key
/// order matches the node's property order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotProperties(Vec<(String, Snapshot)>);

impl SnapshotProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, snapshot: Snapshot) {
        self.0.push((key.into(), snapshot));
    }

    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SnapshotProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SnapshotProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SnapshotProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property snapshots")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut properties = SnapshotProperties::new();
                while let Some((key, value)) = access.next_entry::<String, Snapshot>()? {
                    properties.push(key, value);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Applies the reference/serialize rule to values
#[derive(Debug, Clone)]
pub struct SnapshotCodec {
    max_depth: usize,
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_DEPTH)
    }
}

impl SnapshotCodec {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Encode a single value
    pub fn encode(&self, value: &Value) -> Result<Snapshot> {
        let mut path = Vec::new();
        self.encode_at(value, &mut path)
    }

    /// Encode the arguments of a method called on node `owner`
    pub fn encode_args(&self, owner: NodeId, args: &[Value]) -> Result<Vec<Snapshot>> {
        let mut path = vec![owner];
        args.iter().map(|arg| self.encode_at(arg, &mut path)).collect()
    }

    /// Encode the constructor-time properties of node `owner`
    ///
    /// A property node that already carries Create metadata is replaced by
    /// that metadata instead of being re-derived.
    pub fn encode_constructor_properties(
        &self,
        owner: NodeId,
        properties: &Properties,
    ) -> Result<SnapshotProperties> {
        let mut path = vec![owner];
        let mut out = SnapshotProperties::new();
        for (key, value) in properties.iter() {
            let snapshot = match value.as_node().and_then(created_meta) {
                Some(meta) => Snapshot::Created(Box::new(meta)),
                None => self.encode_at(value, &mut path)?,
            };
            out.push(key.to_string(), snapshot);
        }
        Ok(out)
    }

    fn encode_at(&self, value: &Value, path: &mut Vec<NodeId>) -> Result<Snapshot> {
        Ok(match value {
            Value::Scalar(v) => Snapshot::Scalar(*v),
            Value::Bool(b) => Snapshot::Bool(*b),
            Value::Text(text) => Snapshot::Text(text.clone()),
            Value::Unset => Snapshot::Unset,
            Value::Node(node) if !node.is_sequence_producer() => Snapshot::Reference { id: node.id() },
            Value::Node(node) => self.encode_full(node, path)?,
        })
    }

    fn encode_full(&self, node: &NodeRef, path: &mut Vec<NodeId>) -> Result<Snapshot> {
        let id = node.id();
        if path.contains(&id) || path.len() >= self.max_depth {
            return Err(UgenError::SerializationOverflow {
                node: id,
                depth: path.len(),
            });
        }

        let guard = node.read();
        path.push(id);
        let mut properties = SnapshotProperties::new();
        for (key, value) in guard.properties().iter() {
            properties.push(key.to_string(), self.encode_at(value, path)?);
        }
        path.pop();

        Ok(Snapshot::Node {
            id,
            name: guard.name().to_string(),
            properties,
        })
    }
}

fn created_meta(node: &NodeRef) -> Option<CreateMessage> {
    node.read().mirror_meta().cloned()
}
