//! Mirror channel
//!
//! One-directional, order-preserving transport from the authoring context to
//! the audio context. Sends never block and are never retried; a failed send
//! is reported to the caller, which logs it and carries on.

use std::io::Write;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use super::message::MirrorMessage;
use crate::error::{Result, UgenError};

/// Outbound side of a mirror channel
pub trait Transport: Send + Sync {
    /// Queue a message for the remote context
    fn post(&self, message: &MirrorMessage) -> Result<()>;
}

/// In-process transport backed by an unbounded crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<MirrorMessage>,
}

impl Transport for ChannelTransport {
    fn post(&self, message: &MirrorMessage) -> Result<()> {
        self.tx.send(message.clone()).map_err(|_| UgenError::Transport {
            reason: "receiving context disconnected".to_string(),
        })
    }
}

/// Receiving side of a mirror channel, owned by the audio context
#[derive(Debug)]
pub struct MessageReceiver {
    rx: Receiver<MirrorMessage>,
}

impl MessageReceiver {
    /// Next pending message, if any
    pub fn try_recv(&self) -> Option<MirrorMessage> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next message
    pub fn recv_timeout(&self, timeout: Duration) -> Option<MirrorMessage> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Take every pending message in arrival order
    pub fn drain(&self) -> Vec<MirrorMessage> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a connected transport/receiver pair
pub fn channel() -> (ChannelTransport, MessageReceiver) {
    let (tx, rx) = unbounded();
    (ChannelTransport { tx }, MessageReceiver { rx })
}

/// Writes each message as one JSON line
///
/// Output can be fed back through `RemoteGraph::apply` line by line.
pub struct JsonLinesTransport<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Transport for JsonLinesTransport<W> {
    fn post(&self, message: &MirrorMessage) -> Result<()> {
        let line = message.to_json()?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line).map_err(|e| UgenError::Transport {
            reason: e.to_string(),
        })?;
        writer.flush().map_err(|e| UgenError::Transport {
            reason: e.to_string(),
        })
    }
}

/// Drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn post(&self, _message: &MirrorMessage) -> Result<()> {
        Ok(())
    }
}

#[cfg(feature = "async-bridge")]
pub use async_bridge::{async_channel, AsyncTransport};

#[cfg(feature = "async-bridge")]
mod async_bridge {
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

    use super::Transport;
    use crate::error::{Result, UgenError};
    use crate::mirror::MirrorMessage;

    /// Transport feeding a tokio task on the audio side
    #[derive(Debug, Clone)]
    pub struct AsyncTransport {
        tx: UnboundedSender<MirrorMessage>,
    }

    impl Transport for AsyncTransport {
        fn post(&self, message: &MirrorMessage) -> Result<()> {
            self.tx.send(message.clone()).map_err(|_| UgenError::Transport {
                reason: "receiving task dropped".to_string(),
            })
        }
    }

    /// Create a transport whose messages are awaited on a tokio receiver
    pub fn async_channel() -> (AsyncTransport, UnboundedReceiver<MirrorMessage>) {
        let (tx, rx) = unbounded_channel();
        (AsyncTransport { tx }, rx)
    }
}
