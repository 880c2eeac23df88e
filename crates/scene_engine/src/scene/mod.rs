//! Scene graph: nodes, hierarchy, lifecycle, transforms, and traversal
//!
//! The graph is owned by a [`Scene`], which stores nodes in an arena and
//! addresses them with generational [`NodeKey`]s. All hierarchy and
//! lifecycle mutation goes through the `Scene` so the structural
//! invariants (exclusive single-parent ownership, acyclic parent chain,
//! consistent back-references) can never be broken from outside.
//!
//! Renderers and collectors consume the graph through two narrow
//! contracts: [`Scene::visit`] for pre-order traversal with early
//! termination, and [`Scene::object_to_world_matrix`] for lazily resolved
//! world transforms.

mod graph;
mod node;
mod payload;
mod traversal;

pub use graph::{Scene, SceneConfig, SceneError};
pub use node::{Node, NodeKey, NodeState};
pub use payload::{Camera, Light, LightKind, Model, Payload, PayloadKind, Sprite};
pub use traversal::Flow;
