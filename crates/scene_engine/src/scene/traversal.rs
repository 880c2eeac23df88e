//! Pre-order traversal over the scene graph
//!
//! The engine applies no filtering of its own: collectors compose a
//! predicate with their visitor (e.g. "all active camera nodes") and the
//! traversal just delivers every node in deterministic pre-order —
//! parent first, then children in insertion order.

use super::graph::Scene;
use super::node::{Node, NodeKey};

/// Visitor control value: keep going or stop the whole traversal.
///
/// `Stop` terminates immediately at every level; no further node is
/// visited anywhere in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the next node in pre-order
    Continue,
    /// Halt the entire traversal
    Stop,
}

impl Scene {
    /// Visit `root` and its subtree pre-order, read-only.
    ///
    /// Returns [`Flow::Stop`] if the visitor halted the traversal,
    /// [`Flow::Continue`] if every node was visited. A stale root key
    /// visits nothing.
    pub fn visit<F>(&self, root: NodeKey, mut visitor: F) -> Flow
    where
        F: FnMut(&Node) -> Flow,
    {
        self.visit_inner(root, &mut visitor)
    }

    fn visit_inner<F>(&self, key: NodeKey, visitor: &mut F) -> Flow
    where
        F: FnMut(&Node) -> Flow,
    {
        let Some(node) = self.nodes.get(key) else {
            return Flow::Continue;
        };
        if visitor(node) == Flow::Stop {
            return Flow::Stop;
        }
        for &child in node.children() {
            if self.visit_inner(child, visitor) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Visit `root` and its subtree pre-order with mutable node access.
    ///
    /// The visitor may edit names and payloads; transform and hierarchy
    /// edits still go through the `Scene` methods, which is what keeps
    /// the dirty flags and structural invariants correct.
    pub fn visit_mut<F>(&mut self, root: NodeKey, mut visitor: F) -> Flow
    where
        F: FnMut(&mut Node) -> Flow,
    {
        self.visit_mut_inner(root, &mut visitor)
    }

    fn visit_mut_inner<F>(&mut self, key: NodeKey, visitor: &mut F) -> Flow
    where
        F: FnMut(&mut Node) -> Flow,
    {
        let Some(node) = self.nodes.get_mut(key) else {
            return Flow::Continue;
        };
        if visitor(node) == Flow::Stop {
            return Flow::Stop;
        }
        let children = self.nodes[key].children.clone();
        for child in children {
            if self.visit_mut_inner(child, visitor) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Visit every root subtree in root-list order, read-only.
    pub fn visit_roots<F>(&self, mut visitor: F) -> Flow
    where
        F: FnMut(&Node) -> Flow,
    {
        for &root in &self.roots {
            if self.visit_inner(root, &mut visitor) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }
}
