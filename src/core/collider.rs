use std::sync::Arc;

use super::types::Transform;
use glam::{Quat, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Enumeration of supported collider geometries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Sphere {
        radius: f32,
    },
    /// Segment of length `height` along the local +Y axis, swept by `radius`.
    Capsule {
        radius: f32,
        height: f32,
    },
}

impl ColliderShape {
    pub fn radius(&self) -> f32 {
        match self {
            ColliderShape::Sphere { radius } | ColliderShape::Capsule { radius, .. } => *radius,
        }
    }

    /// Distance between the capsule cap centres; zero for spheres.
    pub fn height(&self) -> f32 {
        match self {
            ColliderShape::Sphere { .. } => 0.0,
            ColliderShape::Capsule { height, .. } => *height,
        }
    }
}

/// Volumetric obstacle particles and constraint links are pushed out of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    /// World pose; capsules are centred on `transform.position`.
    pub transform: Transform,
    /// Friction applied to particles resting on top of the collider, in `[0, 1]`.
    pub friction: f32,
}

impl Default for Collider {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Collider {
    pub fn sphere(radius: f32) -> ColliderShape {
        ColliderShape::Sphere { radius }
    }

    pub fn capsule(radius: f32, height: f32) -> ColliderShape {
        if height <= 0.0 {
            ColliderShape::Sphere { radius }
        } else {
            ColliderShape::Capsule { radius, height }
        }
    }

    pub fn is_capsule(&self) -> bool {
        matches!(self.shape, ColliderShape::Capsule { .. })
    }

    pub fn builder() -> ColliderBuilder {
        ColliderBuilder::new()
    }

    /// Wraps the collider in the shared handle the engine reads every step.
    pub fn into_shared(self) -> SharedCollider {
        Arc::new(RwLock::new(self))
    }
}

pub struct ColliderBuilder {
    shape: ColliderShape,
    transform: Transform,
    friction: f32,
}

impl Default for ColliderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColliderBuilder {
    pub fn new() -> Self {
        Self {
            shape: ColliderShape::Sphere { radius: 0.05 },
            transform: Transform::default(),
            friction: 0.5,
        }
    }

    pub fn sphere(mut self, radius: f32) -> Self {
        self.shape = Collider::sphere(radius);
        self
    }

    pub fn capsule(mut self, radius: f32, height: f32) -> Self {
        self.shape = Collider::capsule(radius, height);
        self
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> Collider {
        Collider {
            shape: self.shape,
            transform: self.transform,
            friction: self.friction,
        }
    }
}

/// Attractor that captures nearby particles and pulls them along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grabber {
    pub position: Vec3,
    /// Capture radius.
    pub radius: f32,
    /// Fraction of the remaining distance closed per step, in `[0, 1]`.
    pub force: f32,
    pub enabled: bool,
}

impl Default for Grabber {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 0.1,
            force: 0.5,
            enabled: true,
        }
    }
}

impl Grabber {
    pub fn new(position: Vec3, radius: f32, force: f32) -> Self {
        Self {
            position,
            radius,
            force: force.clamp(0.0, 1.0),
            enabled: true,
        }
    }

    pub fn into_shared(self) -> SharedGrabber {
        Arc::new(RwLock::new(self))
    }
}

/// Host-owned collider the engine samples at the start of every step.
pub type SharedCollider = Arc<RwLock<Collider>>;

/// Host-owned grabber the engine samples at the start of every step.
pub type SharedGrabber = Arc<RwLock<Grabber>>;
