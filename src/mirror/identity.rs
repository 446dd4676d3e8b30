//! Node identity
//!
//! Ids come from one process-wide counter and are never reused, so an id is a
//! safe cross-context reference for the lifetime of the process. The
//! [`IdentityRegistry`] additionally remembers which ids have been announced
//! to the remote context.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a unit generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate the next id
    pub fn next() -> Self {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an id received from another context
    pub fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    /// The raw integer sent over the wire
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks which nodes have had their Create message sent
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    announced: Mutex<HashSet<NodeId>>,
}

impl IdentityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the Create message for `id` has been posted
    ///
    /// Returns false if the id was already announced.
    pub fn announce(&self, id: NodeId) -> bool {
        self.announced.lock().insert(id)
    }

    /// Whether the Create message for `id` has been posted
    pub fn is_announced(&self, id: NodeId) -> bool {
        self.announced.lock().contains(&id)
    }

    /// Number of announced nodes
    pub fn len(&self) -> usize {
        self.announced.lock().len()
    }

    /// Check if nothing has been announced yet
    pub fn is_empty(&self) -> bool {
        self.announced.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_and_increasing() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| NodeId::next()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
    }

    #[test]
    fn test_announce_once() {
        let registry = IdentityRegistry::new();
        let id = NodeId::next();
        assert!(!registry.is_announced(id));
        assert!(registry.announce(id));
        assert!(!registry.announce(id));
        assert!(registry.is_announced(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_serializes_as_integer() {
        let id = NodeId::from_raw(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }
}
