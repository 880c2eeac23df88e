//! Payloads attachable to scene nodes
//!
//! The set of attachable kinds is fixed and known (camera, light, model,
//! sprite), so the payload is a closed enum rather than open inheritance.
//! Payload behavior (rendering, projection use, script logic) lives
//! outside this crate; the structs here are the data the node carries on
//! behalf of those systems.

use super::node::NodeState;
use crate::foundation::math::{Mat4, Vec2, Vec3};

/// Perspective camera parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane distance
    pub near: f32,
    /// Far clip plane distance
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera
    #[must_use]
    pub const fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y,
            aspect,
            near,
            far,
        }
    }

    /// Projection matrix for the current parameters
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov_y, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Infinitely distant light; direction comes from the node's rotation
    Directional,
    /// Omnidirectional light with a falloff range
    Point {
        /// Distance at which the light's contribution reaches zero
        range: f32,
    },
    /// Cone light with a half-angle in radians
    Spot {
        /// Cone half-angle in radians
        angle: f32,
    },
}

/// Light source parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light kind and its kind-specific parameters
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl Light {
    /// Create a white directional light
    #[must_use]
    pub fn directional() -> Self {
        Self {
            kind: LightKind::Directional,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }

    /// Create a white point light with the given range
    #[must_use]
    pub fn point(range: f32) -> Self {
        Self {
            kind: LightKind::Point { range },
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

/// Reference to renderable model assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Mesh asset name
    pub mesh: String,
    /// Material asset name
    pub material: String,
}

impl Model {
    /// Create a model payload from asset names
    pub fn new(mesh: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            material: material.into(),
        }
    }
}

/// Screen-aligned textured quad.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    /// Texture asset name
    pub texture: String,
    /// Quad size in world units
    pub size: Vec2,
}

impl Sprite {
    /// Create a sprite payload from a texture name and size
    pub fn new(texture: impl Into<String>, size: Vec2) -> Self {
        Self {
            texture: texture.into(),
            size,
        }
    }
}

/// Discriminant of a [`Payload`], for cheap caller-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// No attachment
    Empty,
    /// Camera attachment
    Camera,
    /// Light attachment
    Light,
    /// Model attachment
    Model,
    /// Sprite attachment
    Sprite,
}

/// The object a node carries: one of a fixed, enumerated set.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Pure grouping node with no attachment
    Empty,
    /// Camera attachment
    Camera(Camera),
    /// Light attachment
    Light(Light),
    /// Model attachment
    Model(Model),
    /// Sprite attachment
    Sprite(Sprite),
}

impl Payload {
    /// Discriminant of this payload
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::Empty => PayloadKind::Empty,
            Self::Camera(_) => PayloadKind::Camera,
            Self::Light(_) => PayloadKind::Light,
            Self::Model(_) => PayloadKind::Model,
            Self::Sprite(_) => PayloadKind::Sprite,
        }
    }

    /// Extension hook fired after the owning node's lifecycle state
    /// changed (activation, deactivation, or termination).
    ///
    /// Payload-specific reactions (releasing GPU residency, pausing
    /// script timers) belong to the consuming systems; the core only
    /// records the event.
    pub(super) fn on_state_change(&mut self, state: NodeState) {
        log::trace!("{:?} payload state change: {state:?}", self.kind());
    }
}
