//! Scene: the arena owning every node and the single mutation surface
//! for hierarchy, lifecycle, and transform state
//!
//! ## Ownership model
//!
//! Nodes live in a slotmap arena; parents own their children logically
//! through ordered key lists, and the child-to-parent back-reference is a
//! plain non-owning key. A node appears in at most one child list, the
//! parent graph is acyclic, and `child.parent == p` holds exactly when
//! the child is in `p`'s list — every mutator here preserves all three.
//!
//! ## Error policy
//!
//! Invalid arguments to hierarchy and lifecycle operations (stale keys,
//! self-parenting, already-in-place edges, terminated endpoints) are
//! silent no-ops. The one unrecoverable condition is a back-reference
//! that matches while list membership is missing: that means the tree
//! can no longer be trusted, and the operation panics after logging.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;

use super::node::{Node, NodeKey, NodeState};
use super::payload::Payload;
use crate::foundation::ident::IdGenerator;
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};

/// Error type for the scene's fallible lookup and clone operations.
///
/// Hierarchy and lifecycle mutators never return errors; see the module
/// docs for the no-op policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The key does not address a live node in this scene
    #[error("node key is stale or belongs to another scene")]
    StaleNode,

    /// The operation is not permitted on a terminated node
    #[error("node is terminated")]
    Terminated,
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Display name of the scene (used in log output)
    pub name: String,

    /// Node capacity to reserve up front
    pub node_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: String::from("scene"),
            node_capacity: 256,
        }
    }
}

/// The scene graph: node arena, ordered root list, and id source.
///
/// All mutation happens on one logical thread during the frame's update
/// phase; traversal by renderers and collectors happens after
/// [`update`](Self::update) completes. Scenes draw ids from the shared
/// process-wide [`IdGenerator`], so node ids never collide between
/// scenes; the generator is the only shared-across-threads part.
pub struct Scene {
    pub(super) nodes: SlotMap<NodeKey, Node>,
    pub(super) roots: Vec<NodeKey>,
    ids: Arc<IdGenerator>,
    config: SceneConfig,
}

impl Scene {
    /// Create an empty scene with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create an empty scene with the given configuration
    #[must_use]
    pub fn with_config(config: SceneConfig) -> Self {
        Self::with_id_source(config, IdGenerator::process())
    }

    /// Create an empty scene drawing ids from the given generator.
    ///
    /// Intended for tests that want a deterministic id sequence; normal
    /// construction goes through [`new`](Self::new) or
    /// [`with_config`](Self::with_config), which share the process-wide
    /// generator and keep ids unique across all scenes.
    #[must_use]
    pub fn with_id_source(config: SceneConfig, ids: Arc<IdGenerator>) -> Self {
        log::debug!("creating scene '{}'", config.name);
        Self {
            nodes: SlotMap::with_capacity_and_key(config.node_capacity),
            roots: Vec::new(),
            ids,
            config,
        }
    }

    /// Scene configuration
    #[must_use]
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    // ========================================================================
    // Node creation and lookup
    // ========================================================================

    /// Create a node as a new root.
    ///
    /// The node starts `Active`, with an identity local transform, a
    /// fresh process-unique id, and a dirty world matrix.
    pub fn spawn(&mut self, name: impl Into<String>, payload: Payload) -> NodeKey {
        let node = Node::new(self.ids.next_id(), name, payload);
        log::trace!("spawn node {} '{}'", node.id(), node.name());
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Create a node and immediately attach it under `parent`.
    ///
    /// If the parent key is stale or the parent is terminated, the
    /// attach step is a no-op and the new node remains a root.
    pub fn spawn_child(
        &mut self,
        parent: NodeKey,
        name: impl Into<String>,
        payload: Payload,
    ) -> NodeKey {
        let child = self.spawn(name, payload);
        self.add_child(parent, child);
        child
    }

    /// Look up a node, `None` if the key is stale
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node lookup, `None` if the key is stale
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Look up a node, with an error for stale keys
    pub fn try_node(&self, key: NodeKey) -> Result<&Node, SceneError> {
        self.nodes.get(key).ok_or(SceneError::StaleNode)
    }

    /// Mutable lookup, with an error for stale keys
    pub fn try_node_mut(&mut self, key: NodeKey) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(key).ok_or(SceneError::StaleNode)
    }

    /// Whether the key addresses a live node
    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root node keys in deterministic (creation/detach) order
    #[must_use]
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    // ========================================================================
    // Hierarchy management
    // ========================================================================

    /// Whether `ancestor` appears on `node`'s parent chain (the node
    /// itself does not count as its own ancestor).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.nodes.get(node).and_then(Node::parent);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.nodes.get(key).and_then(Node::parent);
        }
        false
    }

    /// Attach `child` under `parent`, reparenting if needed.
    ///
    /// Silent no-op when either key is stale, `child == parent`, the
    /// child is already a direct child of the parent, either endpoint is
    /// terminated, or the edge would create a cycle (the child is an
    /// ancestor of the parent).
    ///
    /// Reparenting is atomic: the child moves from its previous owner
    /// (parent or root list) to the new parent's child list in one
    /// operation and is never observably parentless in between. The
    /// moved subtree is marked dirty.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if self.nodes[parent].children.contains(&child) {
            return;
        }
        if self.nodes[parent].is_terminated() || self.nodes[child].is_terminated() {
            return;
        }
        if self.is_ancestor(child, parent) {
            log::trace!(
                "rejected add_child: node {} is an ancestor of {}",
                self.nodes[child].id(),
                self.nodes[parent].id()
            );
            return;
        }

        match self.nodes[child].parent {
            Some(old_parent) => self.detach_from_child_list(old_parent, child),
            None => self.remove_root(child),
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.mark_subtree_dirty(child);
    }

    /// Detach `child` from `parent`, promoting it to a root.
    ///
    /// Silent no-op when either key is stale or `child`'s back-reference
    /// does not point at `parent`. The detached subtree stays intact and
    /// is marked dirty.
    ///
    /// # Panics
    ///
    /// Panics if the back-reference matches but the child is missing
    /// from the parent's child list: the tree is corrupted and cannot be
    /// trusted for recovery.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if self.nodes[child].parent != Some(parent) {
            return;
        }

        self.nodes[child].parent = None;
        self.mark_subtree_dirty(child);
        self.detach_from_child_list(parent, child);
        self.roots.push(child);
    }

    /// Detach every child of `parent`; each becomes a root.
    ///
    /// Children are never destroyed by this call.
    pub fn remove_all_children(&mut self, parent: NodeKey) {
        if !self.nodes.contains_key(parent) {
            return;
        }
        let children = std::mem::take(&mut self.nodes[parent].children);
        for &child in &children {
            self.nodes[child].parent = None;
            self.mark_subtree_dirty(child);
            self.roots.push(child);
        }
    }

    /// Destroy a single node, detaching its children first.
    ///
    /// The children survive as roots (shallow removal). Silent no-op for
    /// stale keys. Destruction of a whole subtree is the separate,
    /// explicit [`despawn_subtree`](Self::despawn_subtree).
    pub fn despawn(&mut self, node: NodeKey) {
        if !self.nodes.contains_key(node) {
            return;
        }
        self.remove_all_children(node);
        match self.nodes[node].parent {
            Some(parent) => self.detach_from_child_list(parent, node),
            None => self.remove_root(node),
        }
        let removed = self.nodes.remove(node);
        if let Some(n) = removed {
            log::trace!("despawned node {} '{}'", n.id(), n.name());
        }
    }

    /// Destroy a node and every descendant (deep removal).
    ///
    /// Silent no-op for stale keys.
    pub fn despawn_subtree(&mut self, node: NodeKey) {
        if !self.nodes.contains_key(node) {
            return;
        }
        match self.nodes[node].parent {
            Some(parent) => self.detach_from_child_list(parent, node),
            None => self.remove_root(node),
        }

        let mut stack = vec![node];
        while let Some(key) = stack.pop() {
            let removed = self.nodes.remove(key);
            if let Some(n) = removed {
                stack.extend(n.children().iter().copied());
            }
        }
    }

    /// Remove `child` from `parent`'s child list.
    ///
    /// Caller has already verified the back-reference; a missing list
    /// entry at this point is structural corruption.
    fn detach_from_child_list(&mut self, parent: NodeKey, child: NodeKey) {
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&key| key == child);
        match position {
            Some(index) => {
                self.nodes[parent].children.remove(index);
            }
            None => {
                log::error!(
                    "scene graph corrupted: node {} claims parent {} but is not among its children",
                    self.nodes[child].id(),
                    self.nodes[parent].id()
                );
                panic!("scene graph corrupted: node connections are broken");
            }
        }
    }

    /// Remove a parentless node from the root list.
    fn remove_root(&mut self, node: NodeKey) {
        let position = self.roots.iter().position(|&key| key == node);
        match position {
            Some(index) => {
                self.roots.remove(index);
            }
            None => {
                log::error!(
                    "scene graph corrupted: parentless node {} is missing from the root list",
                    self.nodes[node].id()
                );
                panic!("scene graph corrupted: node connections are broken");
            }
        }
    }

    // ========================================================================
    // Lifecycle state machine
    // ========================================================================

    /// Activate or deactivate a node and, cascading pre-order, its whole
    /// subtree.
    ///
    /// No-op when the key is stale, the node is terminated, or the node
    /// is already in the requested state. Each affected node's payload
    /// receives the `on_state_change` hook after its children have been
    /// updated.
    pub fn set_active(&mut self, node: NodeKey, active: bool) {
        let requested = if active {
            NodeState::Active
        } else {
            NodeState::Inactive
        };
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        if n.is_terminated() || n.state() == requested {
            return;
        }

        self.nodes[node].state = requested;
        let children = self.nodes[node].children.clone();
        for child in children {
            self.set_active(child, active);
        }
        self.nodes[node].payload.on_state_change(requested);
    }

    /// Permanently terminate a node and its whole subtree.
    ///
    /// No-op when the key is stale or the node is already terminated.
    /// `Terminated` is absorbing: every later lifecycle call on the
    /// subtree is a permanent no-op.
    pub fn terminate(&mut self, node: NodeKey) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        if n.is_terminated() {
            return;
        }

        log::trace!("terminating node {} '{}'", n.id(), n.name());
        self.nodes[node].state = NodeState::Terminated;
        let children = self.nodes[node].children.clone();
        for child in children {
            self.terminate(child);
        }
        self.nodes[node].payload.on_state_change(NodeState::Terminated);
    }

    // ========================================================================
    // Transform cache
    // ========================================================================

    /// Replace a node's local transform. Marks the subtree dirty.
    pub fn set_local_transform(&mut self, node: NodeKey, transform: Transform) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        n.local = transform;
        self.mark_subtree_dirty(node);
    }

    /// Set a node's local translation. Marks the subtree dirty.
    pub fn set_position(&mut self, node: NodeKey, position: Vec3) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        n.local.position = position;
        self.mark_subtree_dirty(node);
    }

    /// Set a node's local rotation. Marks the subtree dirty.
    pub fn set_rotation(&mut self, node: NodeKey, rotation: Quat) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        n.local.rotation = rotation;
        self.mark_subtree_dirty(node);
    }

    /// Set a node's local scale. Marks the subtree dirty.
    pub fn set_scale(&mut self, node: NodeKey, scale: Vec3) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        n.local.scale = scale;
        self.mark_subtree_dirty(node);
    }

    /// Offset a node's local translation. Marks the subtree dirty.
    pub fn translate(&mut self, node: NodeKey, offset: Vec3) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        n.local.position += offset;
        self.mark_subtree_dirty(node);
    }

    /// Eagerly mark a node and every descendant as dirty.
    ///
    /// Keeps world-matrix reads O(depth) instead of needing an ancestor
    /// walk per read; the cost is O(subtree) on each write.
    fn mark_subtree_dirty(&mut self, node: NodeKey) {
        let mut stack = vec![node];
        while let Some(key) = stack.pop() {
            let n = &mut self.nodes[key];
            n.dirty = true;
            stack.extend(n.children.iter().copied());
        }
    }

    /// Object-to-world matrix of a node, resolving the cache if stale.
    ///
    /// A dirty node is resolved by climbing to its deepest clean ancestor
    /// and recomputing `parent_world * local` top-down along that chain,
    /// caching each result. Clean reads return the cached matrix
    /// unchanged, so repeated reads are bit-identical. A root node's
    /// world matrix equals its local transform.
    ///
    /// # Panics
    ///
    /// Panics if the key is stale; reading a destroyed node's transform
    /// is a caller bug, not an expected condition.
    pub fn object_to_world_matrix(&mut self, node: NodeKey) -> Mat4 {
        assert!(
            self.nodes.contains_key(node),
            "object_to_world_matrix called with a stale node key"
        );

        // Collect the dirty chain from the node up to its first clean
        // (or root) ancestor, then resolve downward.
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(key) = current {
            let n = &self.nodes[key];
            if !n.dirty {
                break;
            }
            chain.push(key);
            current = n.parent;
        }

        for &key in chain.iter().rev() {
            let parent_world = self.nodes[key].parent.map(|p| self.nodes[p].world);
            let n = &mut self.nodes[key];
            let local = n.local.to_matrix();
            n.world = match parent_world {
                Some(parent) => parent * local,
                None => local,
            };
            n.dirty = false;
        }

        self.nodes[node].world
    }

    /// Recompute every dirty node's world matrix, whole scene, pre-order.
    ///
    /// After this pass, every node's cached
    /// [`world_matrix`](Node::world_matrix) is valid for read-only
    /// traversal.
    pub fn resolve_transforms(&mut self) {
        let mut stack: Vec<(NodeKey, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Mat4::identity()))
            .collect();

        while let Some((key, parent_world)) = stack.pop() {
            let n = &mut self.nodes[key];
            if n.dirty {
                n.world = parent_world * n.local.to_matrix();
                n.dirty = false;
            }
            let world = n.world;
            for &child in n.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// Per-frame tick: resolves all dirty transforms.
    ///
    /// Call after scripts and engine systems have finished mutating the
    /// graph for the frame; renderers traverse afterwards.
    pub fn update(&mut self, _delta_time: f32) {
        self.resolve_transforms();
    }

    // ========================================================================
    // Cloning
    // ========================================================================

    /// Deep-copy a node and its whole subtree.
    ///
    /// Every clone receives a fresh id; local transforms, names, states,
    /// and payloads are copied; all clones start dirty. The clone is
    /// inserted as a new root regardless of the source's parent.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleNode`] for a stale key,
    /// [`SceneError::Terminated`] if the source node is terminated.
    pub fn clone_subtree(&mut self, source: NodeKey) -> Result<NodeKey, SceneError> {
        let src = self.nodes.get(source).ok_or(SceneError::StaleNode)?;
        if src.is_terminated() {
            return Err(SceneError::Terminated);
        }

        let clone = self.clone_node_recursive(source, None);
        self.roots.push(clone);
        Ok(clone)
    }

    fn clone_node_recursive(&mut self, source: NodeKey, parent: Option<NodeKey>) -> NodeKey {
        let (name, state, local, payload, children) = {
            let n = &self.nodes[source];
            (
                n.name.clone(),
                n.state,
                n.local.clone(),
                n.payload.clone(),
                n.children.clone(),
            )
        };

        let mut node = Node::new(self.ids.next_id(), name, payload);
        node.state = state;
        node.local = local;
        node.parent = parent;
        let key = self.nodes.insert(node);

        for child in children {
            let child_clone = self.clone_node_recursive(child, Some(key));
            self.nodes[key].children.push(child_clone);
        }
        key
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    // ========================================================================
    // Hierarchy: reparenting and no-op guards
    // ========================================================================

    #[test]
    fn test_add_child_links_both_directions() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let child = scene.spawn("child", Payload::Empty);

        scene.add_child(parent, child);

        assert_eq!(scene.node(child).unwrap().parent(), Some(parent));
        assert_eq!(scene.node(parent).unwrap().children(), &[child]);
        assert_eq!(scene.roots(), &[parent]);
    }

    #[test]
    fn test_reparent_is_atomic() {
        let mut scene = Scene::new();
        let p = scene.spawn("p", Payload::Empty);
        let q = scene.spawn("q", Payload::Empty);
        let c = scene.spawn_child(q, "c", Payload::Empty);

        scene.add_child(p, c);

        let child = scene.node(c).unwrap();
        assert_eq!(child.parent(), Some(p));
        assert!(scene.node(p).unwrap().children().contains(&c));
        assert!(!scene.node(q).unwrap().children().contains(&c));
        assert_eq!(
            scene
                .node(p)
                .unwrap()
                .children()
                .iter()
                .filter(|&&k| k == c)
                .count(),
            1
        );
    }

    #[test]
    fn test_self_parenting_rejected() {
        let mut scene = Scene::new();
        let n = scene.spawn("n", Payload::Empty);

        scene.add_child(n, n);

        assert_eq!(scene.node(n).unwrap().parent(), None);
        assert!(scene.node(n).unwrap().children().is_empty());
    }

    #[test]
    fn test_cycle_via_descendant_rejected() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let mid = scene.spawn_child(root, "mid", Payload::Empty);
        let leaf = scene.spawn_child(mid, "leaf", Payload::Empty);

        // Parenting root under its own grandchild would create a cycle
        scene.add_child(leaf, root);

        assert_eq!(scene.node(root).unwrap().parent(), None);
        assert!(scene.node(leaf).unwrap().children().is_empty());
    }

    #[test]
    fn test_duplicate_add_child_is_noop() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let child = scene.spawn_child(parent, "child", Payload::Empty);

        scene.add_child(parent, child);
        scene.add_child(parent, child);

        assert_eq!(scene.node(parent).unwrap().children(), &[child]);
    }

    #[test]
    fn test_add_child_with_terminated_endpoint_is_noop() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let child = scene.spawn("child", Payload::Empty);

        scene.terminate(parent);
        scene.add_child(parent, child);
        assert_eq!(scene.node(child).unwrap().parent(), None);

        let other = scene.spawn("other", Payload::Empty);
        scene.terminate(child);
        scene.add_child(other, child);
        assert!(scene.node(other).unwrap().children().is_empty());
    }

    #[test]
    fn test_add_child_with_stale_key_is_noop() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let ghost = scene.spawn("ghost", Payload::Empty);
        scene.despawn(ghost);

        scene.add_child(parent, ghost);
        scene.add_child(ghost, parent);

        assert!(scene.node(parent).unwrap().children().is_empty());
        assert_eq!(scene.node(parent).unwrap().parent(), None);
    }

    #[test]
    fn test_remove_child_detaches_and_keeps_subtree() {
        let mut scene = Scene::new();
        let r = scene.spawn("r", Payload::Empty);
        let a = scene.spawn_child(r, "a", Payload::Empty);
        let b = scene.spawn_child(a, "b", Payload::Empty);

        scene.remove_child(r, a);

        assert_eq!(scene.node(a).unwrap().parent(), None);
        assert!(!scene.node(r).unwrap().children().contains(&a));
        assert_eq!(scene.node(b).unwrap().parent(), Some(a));
        assert!(scene.roots().contains(&a));
    }

    #[test]
    fn test_remove_child_wrong_parent_is_noop() {
        let mut scene = Scene::new();
        let p = scene.spawn("p", Payload::Empty);
        let q = scene.spawn("q", Payload::Empty);
        let c = scene.spawn_child(p, "c", Payload::Empty);

        scene.remove_child(q, c);

        assert_eq!(scene.node(c).unwrap().parent(), Some(p));
        assert_eq!(scene.node(p).unwrap().children(), &[c]);
    }

    #[test]
    #[should_panic(expected = "scene graph corrupted")]
    fn test_broken_connections_abort() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let child = scene.spawn_child(parent, "child", Payload::Empty);

        // Simulate memory corruption: membership gone, back-reference intact
        scene.nodes[parent].children.clear();

        scene.remove_child(parent, child);
    }

    #[test]
    fn test_remove_all_children_detaches_without_destroying() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let a = scene.spawn_child(parent, "a", Payload::Empty);
        let b = scene.spawn_child(parent, "b", Payload::Empty);

        scene.remove_all_children(parent);

        assert!(scene.node(parent).unwrap().children().is_empty());
        assert_eq!(scene.node(a).unwrap().parent(), None);
        assert_eq!(scene.node(b).unwrap().parent(), None);
        assert!(scene.roots().contains(&a));
        assert!(scene.roots().contains(&b));
        assert_eq!(scene.len(), 3);
    }

    // ========================================================================
    // Destruction
    // ========================================================================

    #[test]
    fn test_despawn_is_shallow() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        let child = scene.spawn_child(parent, "child", Payload::Empty);

        scene.despawn(parent);

        assert!(!scene.contains(parent));
        assert!(scene.contains(child));
        assert_eq!(scene.node(child).unwrap().parent(), None);
        assert!(scene.roots().contains(&child));
    }

    #[test]
    fn test_despawn_subtree_is_deep() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let mid = scene.spawn_child(root, "mid", Payload::Empty);
        let leaf = scene.spawn_child(mid, "leaf", Payload::Empty);
        let other = scene.spawn("other", Payload::Empty);

        scene.despawn_subtree(root);

        assert!(!scene.contains(root));
        assert!(!scene.contains(mid));
        assert!(!scene.contains(leaf));
        assert!(scene.contains(other));
        assert_eq!(scene.roots(), &[other]);
    }

    #[test]
    fn test_despawn_leaves_no_dangling_references() {
        let mut scene = Scene::new();
        let p = scene.spawn("p", Payload::Empty);
        let c = scene.spawn_child(p, "c", Payload::Empty);
        let survivor = scene.spawn("survivor", Payload::Empty);

        scene.remove_child(p, c);
        scene.despawn(p);
        scene.despawn(c);

        assert!(scene.node(p).is_none());
        assert!(scene.node(c).is_none());
        assert!(!scene.roots().contains(&p));
        assert!(!scene.roots().contains(&c));
        let s = scene.node(survivor).unwrap();
        assert_eq!(s.parent(), None);
        assert!(s.children().is_empty());
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[test]
    fn test_deactivation_cascades_to_whole_subtree() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let a = scene.spawn_child(root, "a", Payload::Empty);
        let b = scene.spawn_child(root, "b", Payload::Empty);
        let a1 = scene.spawn_child(a, "a1", Payload::Empty);

        scene.set_active(root, false);

        for key in [root, a, b, a1] {
            assert_eq!(scene.node(key).unwrap().state(), NodeState::Inactive);
        }
    }

    #[test]
    fn test_reactivation_cascades() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let child = scene.spawn_child(root, "child", Payload::Empty);

        scene.set_active(root, false);
        scene.set_active(root, true);

        assert_eq!(scene.node(root).unwrap().state(), NodeState::Active);
        assert_eq!(scene.node(child).unwrap().state(), NodeState::Active);
    }

    #[test]
    fn test_set_active_noop_when_state_already_holds() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let child = scene.spawn_child(root, "child", Payload::Empty);
        scene.set_active(child, false);

        // Root is already active: the call must not cascade and
        // reactivate the child
        scene.set_active(root, true);

        assert_eq!(scene.node(child).unwrap().state(), NodeState::Inactive);
    }

    #[test]
    fn test_termination_is_absorbing() {
        let mut scene = Scene::new();
        let node = scene.spawn("node", Payload::Empty);

        scene.terminate(node);
        scene.set_active(node, true);
        assert_eq!(scene.node(node).unwrap().state(), NodeState::Terminated);

        scene.set_active(node, false);
        assert_eq!(scene.node(node).unwrap().state(), NodeState::Terminated);

        scene.terminate(node); // repeated terminate is a no-op
        assert_eq!(scene.node(node).unwrap().state(), NodeState::Terminated);
    }

    #[test]
    fn test_termination_cascades_and_sticks_on_children() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let child = scene.spawn_child(root, "child", Payload::Empty);
        let grandchild = scene.spawn_child(child, "grandchild", Payload::Empty);

        scene.terminate(root);

        for key in [root, child, grandchild] {
            assert!(scene.node(key).unwrap().is_terminated());
            scene.set_active(key, true);
            assert!(scene.node(key).unwrap().is_terminated());
        }
    }

    // ========================================================================
    // Transform cache
    // ========================================================================

    #[test]
    fn test_nested_translations_compose() {
        let mut scene = Scene::new();
        let r = scene.spawn("r", Payload::Empty);
        let a = scene.spawn_child(r, "a", Payload::Empty);
        let b = scene.spawn_child(a, "b", Payload::Empty);

        scene.set_position(a, Vec3::new(1.0, 0.0, 0.0));
        scene.set_position(b, Vec3::new(0.0, 1.0, 0.0));

        let world = scene.object_to_world_matrix(b);
        assert_relative_eq!(world, translation(1.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_detached_node_world_equals_local() {
        let mut scene = Scene::new();
        let r = scene.spawn("r", Payload::Empty);
        let a = scene.spawn_child(r, "a", Payload::Empty);
        let _b = scene.spawn_child(a, "b", Payload::Empty);

        scene.set_position(r, Vec3::new(7.0, 0.0, 0.0));
        scene.set_position(a, Vec3::new(1.0, 2.0, 3.0));
        scene.remove_child(r, a);

        let world = scene.object_to_world_matrix(a);
        assert_relative_eq!(world, translation(1.0, 2.0, 3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_repeated_reads_are_bit_identical() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let child = scene.spawn_child(root, "child", Payload::Empty);

        let rotation = UnitQuaternion::from_axis_angle(&Vec3::y_axis(), 0.37);
        scene.set_rotation(root, rotation);
        scene.set_position(child, Vec3::new(0.1, 2.3, -4.5));
        scene.set_scale(child, Vec3::new(1.5, 1.5, 1.5));

        let first = scene.object_to_world_matrix(child);
        let second = scene.object_to_world_matrix(child);
        let third = scene.object_to_world_matrix(child);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_first_read_matches_direct_recomputation() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let mid = scene.spawn_child(root, "mid", Payload::Empty);
        let leaf = scene.spawn_child(mid, "leaf", Payload::Empty);

        let spin = UnitQuaternion::from_axis_angle(&Vec3::z_axis(), 1.1);
        scene.set_position(root, Vec3::new(1.0, 0.0, 0.0));
        scene.set_rotation(mid, spin);
        scene.set_position(leaf, Vec3::new(0.0, 2.0, 0.0));

        let expected = scene.node(root).unwrap().local_transform().to_matrix()
            * scene.node(mid).unwrap().local_transform().to_matrix()
            * scene.node(leaf).unwrap().local_transform().to_matrix();

        assert_eq!(scene.object_to_world_matrix(leaf), expected);
    }

    #[test]
    fn test_transform_edit_dirties_subtree_eagerly() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let child = scene.spawn_child(root, "child", Payload::Empty);
        scene.resolve_transforms();
        assert!(!scene.node(child).unwrap().is_dirty());

        scene.set_position(root, Vec3::new(0.0, 5.0, 0.0));

        assert!(scene.node(root).unwrap().is_dirty());
        assert!(scene.node(child).unwrap().is_dirty());
    }

    #[test]
    fn test_reparent_dirties_moved_subtree() {
        let mut scene = Scene::new();
        let p = scene.spawn("p", Payload::Empty);
        let q = scene.spawn("q", Payload::Empty);
        let c = scene.spawn_child(q, "c", Payload::Empty);
        let leaf = scene.spawn_child(c, "leaf", Payload::Empty);

        scene.set_position(p, Vec3::new(10.0, 0.0, 0.0));
        scene.resolve_transforms();

        scene.add_child(p, c);

        assert!(scene.node(c).unwrap().is_dirty());
        assert!(scene.node(leaf).unwrap().is_dirty());
        assert_relative_eq!(
            scene.object_to_world_matrix(leaf),
            translation(10.0, 0.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_update_resolves_whole_scene() {
        let mut scene = Scene::new();
        let a = scene.spawn("a", Payload::Empty);
        let b = scene.spawn_child(a, "b", Payload::Empty);
        let lone = scene.spawn("lone", Payload::Empty);
        scene.set_position(a, Vec3::new(3.0, 0.0, 0.0));

        scene.update(0.016);

        for key in [a, b, lone] {
            assert!(!scene.node(key).unwrap().is_dirty());
        }
        assert_relative_eq!(
            *scene.node(b).unwrap().world_matrix(),
            translation(3.0, 0.0, 0.0),
            epsilon = 1e-6
        );
    }

    // ========================================================================
    // Fallible lookups and cloning
    // ========================================================================

    #[test]
    fn test_try_node_reports_stale_keys() {
        let mut scene = Scene::new();
        let node = scene.spawn("node", Payload::Empty);
        scene.despawn(node);

        assert_eq!(scene.try_node(node).unwrap_err(), SceneError::StaleNode);
        assert_eq!(scene.try_node_mut(node).unwrap_err(), SceneError::StaleNode);
    }

    #[test]
    fn test_clone_subtree_is_deep_with_fresh_ids() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Payload::Empty);
        let child = scene.spawn_child(root, "child", Payload::Empty);
        scene.set_position(child, Vec3::new(2.0, 0.0, 0.0));

        let clone = scene.clone_subtree(root).expect("clone succeeds");

        assert_ne!(clone, root);
        assert_eq!(scene.node(clone).unwrap().parent(), None);
        assert!(scene.roots().contains(&clone));
        assert_eq!(scene.node(clone).unwrap().children().len(), 1);

        let cloned_child = scene.node(clone).unwrap().children()[0];
        assert_ne!(cloned_child, child);
        assert_ne!(
            scene.node(cloned_child).unwrap().id(),
            scene.node(child).unwrap().id()
        );
        assert_eq!(
            scene.node(cloned_child).unwrap().position(),
            Vec3::new(2.0, 0.0, 0.0)
        );

        // Source untouched
        assert_eq!(scene.node(root).unwrap().children(), &[child]);
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn test_clone_subtree_refuses_terminated_source() {
        let mut scene = Scene::new();
        let node = scene.spawn("node", Payload::Empty);
        scene.terminate(node);

        assert_eq!(scene.clone_subtree(node).unwrap_err(), SceneError::Terminated);
    }

    #[test]
    fn test_spawn_child_under_terminated_parent_stays_root() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", Payload::Empty);
        scene.terminate(parent);

        let child = scene.spawn_child(parent, "child", Payload::Empty);

        assert_eq!(scene.node(child).unwrap().parent(), None);
        assert!(scene.roots().contains(&child));
    }

    // ========================================================================
    // Node identity
    // ========================================================================

    #[test]
    fn test_node_ids_never_repeat_across_scenes() {
        let mut scene_a = Scene::new();
        let mut scene_b = Scene::new();

        let id_a = {
            let key = scene_a.spawn("a", Payload::Empty);
            scene_a.node(key).unwrap().id()
        };
        let id_b = {
            let key = scene_b.spawn("b", Payload::Empty);
            scene_b.node(key).unwrap().id()
        };

        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_explicit_id_source_yields_deterministic_ids() {
        let ids = std::sync::Arc::new(IdGenerator::new());
        let mut scene = Scene::with_id_source(SceneConfig::default(), ids);

        let first = scene.spawn("first", Payload::Empty);
        let second = scene.spawn("second", Payload::Empty);

        assert_eq!(scene.node(first).unwrap().id().value(), 1);
        assert_eq!(scene.node(second).unwrap().id().value(), 2);
    }
}
