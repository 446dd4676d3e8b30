//! Mirroring
//!
//! Replicates node construction and method calls from the authoring context
//! to a separate audio context over a one-way message channel.
//!
//! - [`Mirror`] wraps nodes, sending one Create message per node
//! - [`Mirrored`] replays each method call as a Method message
//! - [`SnapshotCodec`] turns values into reference tokens or full copies
//! - [`RemoteGraph`] applies the messages on the receiving side

mod channel;
mod config;
mod identity;
mod interceptor;
mod message;
mod remote;
mod snapshot;

#[cfg(feature = "async-bridge")]
pub use channel::{async_channel, AsyncTransport};
pub use channel::{channel, ChannelTransport, JsonLinesTransport, MessageReceiver, NullTransport, Transport};
pub use config::{ExecutionMode, MirrorConfig, WrapOptions};
pub use identity::{IdentityRegistry, NodeId};
pub use interceptor::{Mirror, Mirrored};
pub use message::{CreateAddress, CreateMessage, MethodAddress, MethodMessage, MirrorMessage, NamePath};
pub use remote::RemoteGraph;
pub use snapshot::{Snapshot, SnapshotCodec, SnapshotProperties, DEFAULT_SNAPSHOT_DEPTH};
