//! Node: the composition root binding identity, transform, hierarchy,
//! lifecycle, and an attached payload
//!
//! Hierarchy fields (`parent`, `children`) are crate-private and only
//! written by [`Scene`](super::Scene) methods, which keep the
//! back-reference/membership invariant intact.

use slotmap::new_key_type;

use super::payload::Payload;
use crate::foundation::ident::NodeId;
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};

new_key_type! {
    /// Generational arena key addressing a node within its [`Scene`](super::Scene).
    ///
    /// Keys of despawned nodes go stale and can never alias a live node;
    /// operations receiving a stale key treat it as a null argument.
    pub struct NodeKey;
}

/// Lifecycle state of a node.
///
/// `Terminated` is absorbing: once a node is terminated, no transition
/// out is permitted and the state has already cascaded to the whole
/// subtree that existed at termination time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Node participates in update and traversal filtering
    Active,
    /// Node is present but switched off; may be reactivated
    Inactive,
    /// Node is permanently shut down (absorbing)
    Terminated,
}

/// A node in the scene graph.
///
/// Created via [`Scene::spawn`](super::Scene::spawn) with a fresh unique
/// id, `Active` state, identity local transform, and a dirty world
/// matrix. Nodes are deliberately not `Clone`: a by-value copy would
/// duplicate the id and the hierarchy key lists outside the scene's
/// invariants. Duplication goes through
/// [`Scene::clone_subtree`](super::Scene::clone_subtree).
#[derive(Debug)]
pub struct Node {
    pub(super) id: NodeId,
    pub(super) name: String,
    pub(super) state: NodeState,

    // Local transform and cached world-space result
    pub(super) local: Transform,
    pub(super) world: Mat4,
    pub(super) dirty: bool,

    // Hierarchy: non-owning back-reference up, ordered keys down
    pub(super) parent: Option<NodeKey>,
    pub(super) children: Vec<NodeKey>,

    // Attached scene object
    pub(super) payload: Payload,
}

impl Node {
    pub(super) fn new(id: NodeId, name: impl Into<String>, payload: Payload) -> Self {
        Self {
            id,
            name: name.into(),
            state: NodeState::Active,
            local: Transform::identity(),
            world: Mat4::identity(),
            dirty: true,
            parent: None,
            children: Vec::new(),
            payload,
        }
    }

    /// Process-unique id assigned at creation
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Human-readable name (not required to be unique)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Whether the node is currently `Active`
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == NodeState::Active
    }

    /// Whether the node has been permanently terminated
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state == NodeState::Terminated
    }

    /// Parent key, or `None` for a root node
    #[must_use]
    pub const fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child keys in insertion order
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Local TRS transform relative to the parent
    #[must_use]
    pub const fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Local translation component
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.local.position
    }

    /// Local rotation component
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Local scale component
    #[must_use]
    pub const fn scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Whether the cached world matrix is stale.
    ///
    /// While dirty, [`world_matrix`](Self::world_matrix) must not be read
    /// as ground truth; resolve via
    /// [`Scene::object_to_world_matrix`](super::Scene::object_to_world_matrix)
    /// or a frame [`Scene::update`](super::Scene::update) first.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cached object-to-world matrix.
    ///
    /// Valid only when [`is_dirty`](Self::is_dirty) is false, i.e. after
    /// the frame's resolve pass.
    #[must_use]
    pub const fn world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Attached payload
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Mutable access to the attached payload
    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }
}
