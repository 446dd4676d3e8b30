//! Mirror interceptor
//!
//! [`Mirror::wrap`] announces a node to the remote context with a Create
//! message and returns a [`Mirrored`] decorator. Every method call made
//! through the decorator is replayed as a Method message before it runs
//! locally. Local results and side effects are those of the wrapped node.
//!
//! A node whose Create message never reached the transport is not announced
//! in the [`IdentityRegistry`], and its method calls are not mirrored: the
//! remote context has nothing to apply them to.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::{debug, warn};

use super::channel::Transport;
use super::config::{MirrorConfig, WrapOptions};
use super::identity::IdentityRegistry;
use super::message::{CreateMessage, MethodMessage, MirrorMessage, NamePath};
use super::snapshot::SnapshotCodec;
use crate::error::Result;
use crate::ugen::{NodeCore, NodeRef, RenderForm, UnitGenerator, Value};

/// Methods with this prefix are private and never mirrored
const PRIVATE_PREFIX: &str = "__";

/// Wraps nodes for mirroring under one configuration and transport
#[derive(Clone)]
pub struct Mirror {
    config: MirrorConfig,
    transport: Arc<dyn Transport>,
    registry: Arc<IdentityRegistry>,
    codec: SnapshotCodec,
}

impl Mirror {
    pub fn new(config: MirrorConfig, transport: Arc<dyn Transport>) -> Self {
        let codec = SnapshotCodec::new(config.max_depth);
        Self {
            config,
            transport,
            registry: Arc::new(IdentityRegistry::new()),
            codec,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Ids announced through this mirror
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Whether a wrap with `options` would send messages
    pub fn is_active(&self, options: WrapOptions) -> bool {
        self.config.is_active() && !options.suppress
    }

    /// Wrap `node` under constructor name `name`
    pub fn wrap<N: UnitGenerator>(&self, node: N, name: impl Into<NamePath>) -> Result<Mirrored<N>> {
        self.wrap_with(node, name, WrapOptions::default())
    }

    /// Wrap with per-call options
    ///
    /// When mirroring is inactive the node comes back untouched inside a
    /// passthrough decorator and nothing is sent. Otherwise the Create
    /// message is posted before this returns, so it precedes any Method
    /// message for the same id.
    pub fn wrap_with<N: UnitGenerator>(
        &self,
        node: N,
        name: impl Into<NamePath>,
        options: WrapOptions,
    ) -> Result<Mirrored<N>> {
        if !self.is_active(options) {
            return Ok(Mirrored::passthrough(node));
        }

        let id = node.id();
        let properties = self.codec.encode_constructor_properties(id, node.properties())?;
        let meta = CreateMessage::new(name.into(), properties, id);

        let link = MirrorLink {
            transport: Arc::clone(&self.transport),
            codec: self.codec.clone(),
            registry: Arc::clone(&self.registry),
        };
        if link.post(MirrorMessage::Create(meta.clone())) {
            self.registry.announce(id);
            debug!(node = %id, name = %meta.name.dotted(), "Mirrored node created");
        }

        Ok(Mirrored {
            inner: node,
            meta: Some(meta),
            link: Some(link),
        })
    }

    /// Wrap and put the result behind a shared handle
    pub fn wrap_shared<N: UnitGenerator + 'static>(&self, node: N, name: impl Into<NamePath>) -> Result<NodeRef> {
        Ok(NodeRef::new(self.wrap(node, name)?))
    }
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("config", &self.config)
            .field("announced", &self.registry.len())
            .finish()
    }
}

#[derive(Clone)]
struct MirrorLink {
    transport: Arc<dyn Transport>,
    codec: SnapshotCodec,
    registry: Arc<IdentityRegistry>,
}

impl MirrorLink {
    /// Best-effort send; failures are logged and dropped
    fn post(&self, message: MirrorMessage) -> bool {
        match self.transport.post(&message) {
            Ok(()) => {
                debug!(object = %message.object_id(), "Posted mirror message");
                true
            }
            Err(e) => {
                warn!(object = %message.object_id(), error = %e, "Mirror message dropped");
                false
            }
        }
    }
}

/// Decorator that replays method calls on a remote copy of `N`
pub struct Mirrored<N> {
    inner: N,
    meta: Option<CreateMessage>,
    link: Option<MirrorLink>,
}

impl<N: UnitGenerator> Mirrored<N> {
    /// Decorator that forwards everything and sends nothing
    pub fn passthrough(inner: N) -> Self {
        Self {
            inner,
            meta: None,
            link: None,
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn into_inner(self) -> N {
        self.inner
    }

    /// Whether calls through this wrapper are mirrored
    pub fn is_mirrored(&self) -> bool {
        self.link.is_some()
    }

    /// Create metadata sent for this node
    pub fn meta(&self) -> Option<&CreateMessage> {
        self.meta.as_ref()
    }
}

impl<N> Deref for Mirrored<N> {
    type Target = N;

    fn deref(&self) -> &N {
        &self.inner
    }
}

// Direct mutable access bypasses mirroring, like `core_mut`.
impl<N> DerefMut for Mirrored<N> {
    fn deref_mut(&mut self) -> &mut N {
        &mut self.inner
    }
}

impl<N: fmt::Debug> fmt::Debug for Mirrored<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirrored")
            .field("inner", &self.inner)
            .field("mirrored", &self.link.is_some())
            .finish()
    }
}

impl<N: UnitGenerator> UnitGenerator for Mirrored<N> {
    fn core(&self) -> &NodeCore {
        self.inner.core()
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        self.inner.core_mut()
    }

    fn form(&self) -> RenderForm {
        self.inner.form()
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        self.inner.process(inputs)
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        if let Some(link) = self.link.as_ref().filter(|_| !method.starts_with(PRIVATE_PREFIX)) {
            let id = self.inner.id();
            if link.registry.is_announced(id) {
                let mapped = link.codec.encode_args(id, args)?;
                link.post(MirrorMessage::Method(MethodMessage::new(id, method, mapped)));
            } else {
                warn!(object = %id, method, "Create was never delivered; method not mirrored");
            }
        }
        self.inner.invoke(method, args)
    }

    fn is_sequence_producer(&self) -> bool {
        self.inner.is_sequence_producer()
    }

    fn mirror_meta(&self) -> Option<&CreateMessage> {
        self.meta.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UgenError;
    use crate::mirror::{channel, NodeId, NullTransport, Snapshot};
    use crate::ugen::{add, mul, Sequence};

    struct FailingTransport;

    /// Fails the first post, then forwards to a channel
    struct FlakyTransport {
        failed: parking_lot::Mutex<bool>,
        inner: crate::mirror::ChannelTransport,
    }

    impl Transport for FlakyTransport {
        fn post(&self, message: &MirrorMessage) -> Result<()> {
            let mut failed = self.failed.lock();
            if !*failed {
                *failed = true;
                return Err(UgenError::Transport {
                    reason: "dropped".to_string(),
                });
            }
            self.inner.post(message)
        }
    }

    impl Transport for FailingTransport {
        fn post(&self, _message: &MirrorMessage) -> Result<()> {
            Err(UgenError::Transport {
                reason: "closed".to_string(),
            })
        }
    }

    fn worklet() -> (Mirror, crate::mirror::MessageReceiver) {
        let (tx, rx) = channel();
        (Mirror::new(MirrorConfig::worklet(), Arc::new(tx)), rx)
    }

    #[test]
    fn test_create_sent_before_return() {
        let (mirror, rx) = worklet();
        let node = mirror.wrap(add([1.0, 2.0]).unwrap(), "add").unwrap();

        let messages = rx.drain();
        assert_eq!(messages.len(), 1);
        let MirrorMessage::Create(create) = &messages[0] else {
            panic!("expected a create message");
        };
        assert_eq!(create.id, node.id());
        assert_eq!(create.name.segments(), ["Add"]);
        assert!(mirror.registry().is_announced(node.id()));
    }

    #[test]
    fn test_method_mirrored_then_run_locally() {
        let (mirror, rx) = worklet();
        let mut node = mirror.wrap(add([1.0, 2.0]).unwrap(), "add").unwrap();
        node.invoke("set", &[Value::from(0.0), Value::from(5.0)]).unwrap();

        assert_eq!(node.properties().get(&0usize.into()), Some(&Value::Scalar(5.0)));
        let messages = rx.drain();
        assert_eq!(messages.len(), 2);
        let MirrorMessage::Method(method) = &messages[1] else {
            panic!("expected a method message");
        };
        assert_eq!(method.object, node.id());
        assert_eq!(method.name, "set");
        assert_eq!(method.args, vec![Snapshot::Scalar(0.0), Snapshot::Scalar(5.0)]);
    }

    #[test]
    fn test_private_methods_not_mirrored() {
        let (mirror, rx) = worklet();
        let mut node = mirror.wrap(add([1.0]).unwrap(), "add").unwrap();
        rx.drain();

        assert!(node.invoke("__internal", &[]).is_err());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_local_mode_is_passthrough() {
        let (tx, rx) = channel();
        let mirror = Mirror::new(MirrorConfig::local(), Arc::new(tx));
        let mut node = mirror.wrap(add([1.0]).unwrap(), "add").unwrap();
        node.invoke("set", &[Value::from(0.0), Value::from(2.0)]).unwrap();

        assert!(!node.is_mirrored());
        assert!(node.mirror_meta().is_none());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_suppressed_wrap_is_passthrough() {
        let (mirror, rx) = worklet();
        let node = mirror
            .wrap_with(add([1.0]).unwrap(), "add", WrapOptions::suppressed())
            .unwrap();
        assert!(!node.is_mirrored());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_transport_failure_does_not_abort() {
        let mirror = Mirror::new(MirrorConfig::worklet(), Arc::new(FailingTransport));
        let mut node = mirror.wrap(add([1.0, 2.0]).unwrap(), "add").unwrap();
        assert!(node.is_mirrored());
        node.invoke("set", &[Value::from(1.0), Value::from(3.0)]).unwrap();
        assert_eq!(node.properties().get(&1usize.into()), Some(&Value::Scalar(3.0)));
    }

    #[test]
    fn test_undelivered_create_blocks_method_messages() {
        let (tx, rx) = channel();
        let transport = FlakyTransport {
            failed: parking_lot::Mutex::new(false),
            inner: tx,
        };
        let mirror = Mirror::new(MirrorConfig::worklet(), Arc::new(transport));

        let mut lost = mirror.wrap(add([1.0]).unwrap(), "add").unwrap();
        assert!(!mirror.registry().is_announced(lost.id()));
        lost.invoke("set", &[Value::from(0.0), Value::from(4.0)]).unwrap();
        assert_eq!(lost.properties().get(&0usize.into()), Some(&Value::Scalar(4.0)));
        assert!(rx.is_empty());

        let mut kept = mirror.wrap(add([1.0]).unwrap(), "add").unwrap();
        kept.invoke("set", &[Value::from(0.0), Value::from(4.0)]).unwrap();
        let ids: Vec<NodeId> = rx.drain().iter().map(MirrorMessage::object_id).collect();
        assert_eq!(ids, vec![kept.id(), kept.id()]);
    }

    #[test]
    fn test_argument_locked_by_another_thread() {
        let (mirror, rx) = worklet();
        let gain = mirror.wrap_shared(mul([1.0, 0.5]).unwrap(), "mul").unwrap();
        let seq = NodeRef::new(Sequence::new([1.0, 2.0], 1.0).unwrap());
        let (locked_tx, locked_rx) = crossbeam_channel::bounded(0);

        let holder = {
            let seq = seq.clone();
            std::thread::spawn(move || {
                let _guard = seq.write();
                locked_tx.send(()).unwrap();
                std::thread::sleep(std::time::Duration::from_millis(50));
            })
        };
        locked_rx.recv().unwrap();

        gain.invoke("set", &[Value::from(1.0), Value::from(&seq)]).unwrap();
        holder.join().unwrap();

        let messages = rx.drain();
        assert_eq!(messages.len(), 2);
        let MirrorMessage::Method(method) = &messages[1] else {
            panic!("expected a method message");
        };
        assert!(matches!(&method.args[1], Snapshot::Node { id, .. } if *id == seq.id()));
        let local = gain.invoke("get", &[Value::from(1.0)]).unwrap();
        assert!(local.as_node().unwrap().ptr_eq(&seq));
    }

    #[test]
    fn test_sequence_passed_to_itself_overflows() {
        let (mirror, rx) = worklet();
        let seq = mirror.wrap_shared(Sequence::new([1.0], 1.0).unwrap(), "sequence").unwrap();
        rx.drain();

        let err = seq.invoke("set", &[Value::from(0.0), Value::from(&seq)]).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_OVERFLOW");
        assert!(rx.is_empty());
    }

    #[test]
    fn test_mirrored_child_embedded_as_metadata() {
        let (mirror, _rx) = worklet();
        let child = mirror.wrap_shared(add([1.0, 2.0]).unwrap(), "add").unwrap();
        let parent = mirror.wrap(mul([Value::from(&child), Value::from(3.0)]).unwrap(), "mul").unwrap();

        let meta = parent.meta().unwrap();
        assert!(matches!(meta.properties.get("0"), Some(Snapshot::Created(c)) if c.id == child.id()));
        assert_eq!(meta.properties.get("1"), Some(&Snapshot::Scalar(3.0)));
    }

    #[test]
    fn test_sequence_argument_overflow_is_fatal() {
        let a = NodeRef::new(Sequence::new([1.0], 1.0).unwrap());
        let b = NodeRef::new(Sequence::new([Value::from(&a)], 1.0).unwrap());
        a.write().core_mut().set_property(0usize, &b);

        let mirror = Mirror::new(MirrorConfig::worklet(), Arc::new(NullTransport));
        let mut node = mirror.wrap(add([1.0]).unwrap(), "add").unwrap();
        let err = node.invoke("set", &[Value::from(0.0), Value::from(&a)]).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_OVERFLOW");
        assert_eq!(node.properties().get(&0usize.into()), Some(&Value::Scalar(1.0)));
    }
}
