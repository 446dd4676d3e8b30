//! Mirror messages
//!
//! Wire schema, one JSON object per send:
//!
//! ```text
//! Create : { "address": "add",    "name": [string], "properties": {..}, "id": n }
//! Method : { "address": "method", "object": n, "name": string, "args": [..] }
//! ```

use serde::{Deserialize, Serialize};

use super::identity::NodeId;
use super::snapshot::{Snapshot, SnapshotProperties};
use crate::error::Result;

/// Address tag of a Create message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreateAddress {
    #[default]
    #[serde(rename = "add")]
    Add,
}

/// Address tag of a Method message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MethodAddress {
    #[default]
    #[serde(rename = "method")]
    Method,
}

/// Capitalized constructor lineage of a mirrored node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamePath(Vec<String>);

impl NamePath {
    /// A single constructor name, first letter upper-cased (`sine` -> `Sine`)
    pub fn single(name: &str) -> Self {
        NamePath(vec![capitalize(name)])
    }

    /// A constructor path; only the final segment is capitalized
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if let Some(last) = segments.last_mut() {
            *last = capitalize(last);
        }
        NamePath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Final segment: the constructor actually instantiated
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Dotted form (`Binops.Add`)
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl From<&str> for NamePath {
    fn from(name: &str) -> Self {
        NamePath::single(name)
    }
}

impl From<String> for NamePath {
    fn from(name: String) -> Self {
        NamePath::single(&name)
    }
}

impl From<&[&str]> for NamePath {
    fn from(segments: &[&str]) -> Self {
        NamePath::path(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for NamePath {
    fn from(segments: [&str; N]) -> Self {
        NamePath::path(segments)
    }
}

impl From<Vec<String>> for NamePath {
    fn from(segments: Vec<String>) -> Self {
        NamePath::path(segments)
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Announces a new object to the remote context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMessage {
    pub address: CreateAddress,
    pub name: NamePath,
    pub properties: SnapshotProperties,
    pub id: NodeId,
}

impl CreateMessage {
    pub fn new(name: NamePath, properties: SnapshotProperties, id: NodeId) -> Self {
        Self {
            address: CreateAddress::Add,
            name,
            properties,
            id,
        }
    }
}

/// Replays a method call on a mirrored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMessage {
    pub address: MethodAddress,
    pub object: NodeId,
    pub name: String,
    pub args: Vec<Snapshot>,
}

impl MethodMessage {
    pub fn new(object: NodeId, name: impl Into<String>, args: Vec<Snapshot>) -> Self {
        Self {
            address: MethodAddress::Method,
            object,
            name: name.into(),
            args,
        }
    }
}

/// Any message sent over the mirror channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MirrorMessage {
    Create(CreateMessage),
    Method(MethodMessage),
}

impl MirrorMessage {
    /// Id of the object the message is about
    pub fn object_id(&self) -> NodeId {
        match self {
            MirrorMessage::Create(create) => create.id,
            MirrorMessage::Method(method) => method.object,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, MirrorMessage::Create(_))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<CreateMessage> for MirrorMessage {
    fn from(create: CreateMessage) -> Self {
        MirrorMessage::Create(create)
    }
}

impl From<MethodMessage> for MirrorMessage {
    fn from(method: MethodMessage) -> Self {
        MirrorMessage::Method(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_single_name_capitalized() {
        assert_eq!(NamePath::from("sine").segments(), ["Sine"]);
        assert_eq!(NamePath::from("Sine").segments(), ["Sine"]);
        assert_eq!(NamePath::from("").segments(), [""]);
    }

    #[test]
    fn test_path_capitalizes_leaf_only() {
        let path = NamePath::from(["binops", "add"]);
        assert_eq!(path.segments(), ["binops", "Add"]);
        assert_eq!(path.leaf(), Some("Add"));
        assert_eq!(path.dotted(), "binops.Add");
    }

    #[test]
    fn test_create_wire_format() {
        let mut properties = SnapshotProperties::new();
        properties.push("0", Snapshot::Scalar(440.0));
        properties.push("1", Snapshot::Reference { id: NodeId::from_raw(3) });
        let msg = MirrorMessage::from(CreateMessage::new(
            NamePath::from("sine"),
            properties,
            NodeId::from_raw(9),
        ));

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "address": "add",
                "name": ["Sine"],
                "properties": { "0": 440.0, "1": { "id": 3 } },
                "id": 9
            })
        );
    }

    #[test]
    fn test_method_wire_format() {
        let msg = MirrorMessage::from(MethodMessage::new(
            NodeId::from_raw(4),
            "set",
            vec![Snapshot::Text("frequency".into()), Snapshot::Scalar(2.0)],
        ));
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "address": "method", "object": 4, "name": "set", "args": ["frequency", 2.0] })
        );
    }

    #[test]
    fn test_parse_both_kinds() {
        let create = MirrorMessage::from_json(
            r#"{"address":"add","name":["Add"],"properties":{"0":1,"1":2},"id":5}"#,
        )
        .unwrap();
        assert!(create.is_create());
        assert_eq!(create.object_id(), NodeId::from_raw(5));

        let method = MirrorMessage::from_json(
            r#"{"address":"method","object":5,"name":"set","args":[0,{"id":2}]}"#,
        )
        .unwrap();
        let MirrorMessage::Method(method) = method else {
            panic!("expected a method message");
        };
        assert_eq!(method.args[1], Snapshot::Reference { id: NodeId::from_raw(2) });
    }

    #[test]
    fn test_unknown_address_rejected() {
        assert!(MirrorMessage::from_json(r#"{"address":"remove","id":1}"#).is_err());
    }
}
