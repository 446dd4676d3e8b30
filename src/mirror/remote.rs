//! Remote graph
//!
//! Receiving side of the mirror protocol. Applies Create and Method messages
//! in arrival order, keeping its own table from mirrored ids to rebuilt
//! nodes. Constructors are looked up by the final segment of a Create's name
//! path, case-insensitively.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use super::channel::MessageReceiver;
use super::identity::NodeId;
use super::message::{CreateMessage, MethodMessage, MirrorMessage};
use super::snapshot::{Snapshot, SnapshotProperties};
use crate::error::{Result, UgenError};
use crate::ugen::{
    BinaryOp, Map, Merge, NodeRef, Operator, Pow, Properties, PropertyKey, Sequence, UnaryFunction, UnaryKind,
    Value,
};

type Constructor = Box<dyn Fn(&Properties) -> Result<NodeRef> + Send + Sync>;

/// Mirror of an authoring-side graph
pub struct RemoteGraph {
    objects: HashMap<NodeId, NodeRef>,
    constructors: HashMap<String, Constructor>,
}

impl Default for RemoteGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteGraph {
    /// Empty graph with the built-in constructors registered
    pub fn new() -> Self {
        let mut graph = Self {
            objects: HashMap::new(),
            constructors: HashMap::new(),
        };

        for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod] {
            graph.register(op.name(), move |props| {
                Ok(NodeRef::new(Operator::new(op, props.values().cloned())?))
            });
        }
        for kind in [UnaryKind::Abs, UnaryKind::Sqrt] {
            graph.register(kind.name(), move |props| {
                Ok(NodeRef::new(UnaryFunction::from_args(kind, props.values().cloned())?))
            });
        }
        graph.register("pow", |props| Ok(NodeRef::new(Pow::from_args(props.values().cloned())?)));
        graph.register("merge", |props| Ok(NodeRef::new(Merge::from_args(props.values().cloned())?)));
        graph.register("map", |props| Ok(NodeRef::new(Map::from_properties(props)?)));
        graph.register("sequence", |props| Ok(NodeRef::new(Sequence::from_properties(props)?)));

        graph
    }

    /// Register a constructor under `name` (matched case-insensitively)
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&Properties) -> Result<NodeRef> + Send + Sync + 'static,
    {
        self.constructors.insert(name.to_lowercase(), Box::new(constructor));
    }

    /// Apply one message
    ///
    /// Create returns the new node; Method returns the method's result.
    pub fn apply(&mut self, message: &MirrorMessage) -> Result<Value> {
        match message {
            MirrorMessage::Create(create) => self.create(create).map(Value::Node),
            MirrorMessage::Method(method) => self.call(method),
        }
    }

    /// Apply every pending message, returning how many succeeded
    pub fn sync(&mut self, receiver: &MessageReceiver) -> usize {
        let mut applied = 0;
        for message in receiver.drain() {
            match self.apply(&message) {
                Ok(_) => applied += 1,
                Err(e) => warn!(object = %message.object_id(), error = %e, "Failed to apply mirror message"),
            }
        }
        applied
    }

    /// Rebuild a value from its snapshot
    ///
    /// Full node snapshots are constructed and recorded under their id,
    /// replacing any node already held there. Other nodes that referenced
    /// the old entry still hold it.
    pub fn build(&mut self, snapshot: &Snapshot) -> Result<Value> {
        Ok(match snapshot {
            Snapshot::Scalar(v) => Value::Scalar(*v),
            Snapshot::Bool(b) => Value::Bool(*b),
            Snapshot::Text(text) => Value::Text(text.clone()),
            Snapshot::Unset => Value::Unset,
            Snapshot::Reference { id } => Value::Node(self.lookup(*id)?),
            Snapshot::Created(create) => match self.objects.get(&create.id) {
                Some(node) => Value::Node(node.clone()),
                None => Value::Node(self.create(create)?),
            },
            Snapshot::Node { id, name, properties } => Value::Node(self.construct(*id, name, properties)?),
        })
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeRef> {
        self.objects.get(&id)
    }

    /// Mirrored ids in ascending order
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn create(&mut self, create: &CreateMessage) -> Result<NodeRef> {
        let leaf = create.name.leaf().unwrap_or_default();
        self.construct(create.id, leaf, &create.properties)
    }

    fn construct(&mut self, id: NodeId, name: &str, snapshot: &SnapshotProperties) -> Result<NodeRef> {
        let mut properties = Properties::new();
        for (key, value) in snapshot.iter() {
            properties.set(PropertyKey::parse(key), self.build(value)?);
        }

        let constructor = self
            .constructors
            .get(&name.to_lowercase())
            .ok_or_else(|| UgenError::UnknownConstructor { name: name.to_string() })?;
        let node = constructor(&properties)?;

        debug!(object = %id, constructor = name, "Remote node created");
        if self.objects.insert(id, node.clone()).is_some() {
            // Nodes that captured the previous copy keep it
            debug!(object = %id, "Replaced remote node with a full copy");
        }
        Ok(node)
    }

    fn call(&mut self, method: &MethodMessage) -> Result<Value> {
        let target = self.lookup(method.object)?;
        let args = method
            .args
            .iter()
            .map(|arg| self.build(arg))
            .collect::<Result<Vec<_>>>()?;
        target.invoke(&method.name, &args)
    }

    fn lookup(&self, id: NodeId) -> Result<NodeRef> {
        self.objects
            .get(&id)
            .cloned()
            .ok_or(UgenError::UnknownReference { id })
    }
}

impl fmt::Debug for RemoteGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGraph")
            .field("objects", &self.ids())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Evaluator;
    use crate::mirror::NamePath;

    fn create(name: &str, id: u64, props: &[(&str, Snapshot)]) -> MirrorMessage {
        let mut properties = SnapshotProperties::new();
        for (key, value) in props {
            properties.push(*key, value.clone());
        }
        CreateMessage::new(NamePath::from(name), properties, NodeId::from_raw(id)).into()
    }

    #[test]
    fn test_create_and_method() {
        let mut graph = RemoteGraph::new();
        graph
            .apply(&create("add", 1, &[("0", Snapshot::Scalar(1.0)), ("1", Snapshot::Scalar(2.0))]))
            .unwrap();

        let set = MethodMessage::new(
            NodeId::from_raw(1),
            "set",
            vec![Snapshot::Scalar(1.0), Snapshot::Scalar(9.0)],
        );
        graph.apply(&set.into()).unwrap();

        let node = graph.get(NodeId::from_raw(1)).unwrap();
        assert_eq!(node.compile().unwrap(), "( 1 + 9 )");
    }

    #[test]
    fn test_references_resolve() {
        let mut graph = RemoteGraph::new();
        graph
            .apply(&create("add", 1, &[("0", Snapshot::Scalar(1.0)), ("1", Snapshot::Scalar(2.0))]))
            .unwrap();
        graph
            .apply(&create(
                "mul",
                2,
                &[
                    ("0", Snapshot::Reference { id: NodeId::from_raw(1) }),
                    ("1", Snapshot::Scalar(3.0)),
                ],
            ))
            .unwrap();

        let root = graph.get(NodeId::from_raw(2)).unwrap();
        assert_eq!(root.compile().unwrap(), "( ( 1 + 2 ) * 3 )");
        assert_eq!(graph.ids(), vec![NodeId::from_raw(1), NodeId::from_raw(2)]);
    }

    #[test]
    fn test_unknown_reference() {
        let mut graph = RemoteGraph::new();
        let call = MethodMessage::new(NodeId::from_raw(42), "start", Vec::new());
        let err = graph.apply(&call.into()).unwrap_err();
        assert!(matches!(err, UgenError::UnknownReference { id } if id == NodeId::from_raw(42)));
    }

    #[test]
    fn test_unknown_constructor() {
        let mut graph = RemoteGraph::new();
        let err = graph.apply(&create("sine", 1, &[])).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CONSTRUCTOR");
        assert!(graph.is_empty());
    }

    #[test]
    fn test_full_sequence_snapshot_rebuilt() {
        let mut steps = SnapshotProperties::new();
        steps.push("rate", Snapshot::Scalar(1.0));
        steps.push("0", Snapshot::Scalar(4.0));
        steps.push("1", Snapshot::Scalar(8.0));
        let snapshot = Snapshot::Node {
            id: NodeId::from_raw(7),
            name: "sequence".to_string(),
            properties: steps,
        };

        let mut graph = RemoteGraph::new();
        let value = graph.build(&snapshot).unwrap();
        let node = value.as_node().unwrap();
        assert!(node.is_sequence_producer());
        assert_eq!(Evaluator::default().render(node, 3).unwrap(), vec![4.0, 8.0, 4.0]);
        assert!(graph.get(NodeId::from_raw(7)).is_some());
    }

    #[test]
    fn test_full_copy_replaces_table_entry() {
        let mut graph = RemoteGraph::new();
        let seq_id = NodeId::from_raw(1);
        graph
            .apply(&create(
                "sequence",
                1,
                &[("rate", Snapshot::Scalar(1.0)), ("0", Snapshot::Scalar(5.0))],
            ))
            .unwrap();
        graph
            .apply(&create("add", 2, &[("0", Snapshot::Reference { id: seq_id })]))
            .unwrap();
        let first = graph.get(seq_id).cloned().unwrap();

        let mut steps = SnapshotProperties::new();
        steps.push("rate", Snapshot::Scalar(1.0));
        steps.push("0", Snapshot::Scalar(6.0));
        let copy = Snapshot::Node {
            id: seq_id,
            name: "sequence".to_string(),
            properties: steps,
        };
        graph.build(&copy).unwrap();

        let current = graph.get(seq_id).unwrap();
        assert!(!current.ptr_eq(&first));
        assert_eq!(current.compile().unwrap(), "sequence(1, 6)");
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get(NodeId::from_raw(2)).unwrap().compile().unwrap(), "( sequence(1, 5) )");
    }

    #[test]
    fn test_custom_constructor() {
        let mut graph = RemoteGraph::new();
        graph.register("Twice", |props| {
            Ok(NodeRef::new(Operator::new(
                BinaryOp::Mul,
                [props.values().next().cloned().unwrap_or_default(), Value::from(2.0)],
            )?))
        });
        graph.apply(&create("twice", 3, &[("0", Snapshot::Scalar(5.0))])).unwrap();
        assert_eq!(graph.get(NodeId::from_raw(3)).unwrap().compile().unwrap(), "( 5 * 2 )");
    }
}
