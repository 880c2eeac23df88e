//! Node identity and unique id generation
//!
//! Provides the process-unique [`NodeId`] handed to every node at creation
//! and the [`IdGenerator`] that mints them. All scenes draw from the
//! shared [`IdGenerator::process`] instance by default, so an id minted
//! anywhere in the process is never minted again. The generator is the
//! only piece of the scene graph that is safe to call from any thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Unique identifier for a node, valid for the lifetime of the process.
///
/// Ids are never reused, even after the node they belonged to has been
/// despawned. They are stable across reparenting and cloning (a clone
/// receives a fresh id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw id value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of unique [`NodeId`]s.
///
/// Uses an atomic fetch-and-increment, so it may be shared and called
/// from any thread without external locking. Wraparound of the 64-bit
/// space is not handled.
///
/// Scenes share the [`process`](Self::process) instance by default,
/// which is what makes ids unique across the whole process. Isolated
/// generators remain constructible via [`new`](Self::new) for tests
/// that want a deterministic id sequence.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create an isolated generator whose first issued id is 1
    /// (0 is never issued).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Handle to the process-wide generator.
    ///
    /// Every call returns the same underlying instance, so ids drawn
    /// through any handle never repeat for the lifetime of the process.
    #[must_use]
    pub fn process() -> Arc<Self> {
        static PROCESS: OnceLock<Arc<IdGenerator>> = OnceLock::new();
        Arc::clone(PROCESS.get_or_init(|| Arc::new(Self::new())))
    }

    /// Return an id never returned before by this generator.
    #[must_use]
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
