//! # Scene Engine
//!
//! The runtime scene graph core of a real-time 3D engine.
//!
//! Every placeable entity (camera, light, model, sprite) lives in the
//! graph as a [`Node`](scene::Node) with a local TRS transform. The graph
//! turns a sequence of cheap local edits into correct, cached world-space
//! matrices and cascading lifecycle state once per frame.
//!
//! ## Frame contract
//!
//! All mutation (hierarchy edits, transform edits, lifecycle changes)
//! happens on one logical thread during the update phase. Once
//! [`Scene::update`](scene::Scene::update) has run for the frame,
//! renderers and collectors traverse the graph read-only via
//! [`Scene::visit`](scene::Scene::visit) and read resolved world matrices.
//! Only the id generator is safe to call from other threads.
//!
//! ## Quick Start
//!
//! ```
//! use scene_engine::prelude::*;
//!
//! let mut scene = Scene::new();
//! let sun = scene.spawn("sun", Payload::Empty);
//! let planet = scene.spawn("planet", Payload::Empty);
//! scene.add_child(sun, planet);
//! scene.set_position(planet, Vec3::new(5.0, 0.0, 0.0));
//!
//! scene.update(0.016);
//! let world = scene.object_to_world_matrix(planet);
//! assert_eq!(world[(0, 3)], 5.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::foundation::{
        ident::{IdGenerator, NodeId},
        math::{Mat4, Quat, Transform, Vec3},
    };
    pub use crate::scene::{
        Camera, Flow, Light, LightKind, Model, Node, NodeKey, NodeState, Payload, PayloadKind,
        Scene, SceneConfig, SceneError, Sprite,
    };
}
