//! Core types describing particles, constraints, colliders, and skeleton poses.

pub mod collider;
pub mod constraints;
pub mod soa;
pub mod types;

pub use collider::{Collider, ColliderBuilder, ColliderShape, Grabber, SharedCollider, SharedGrabber};
pub use constraints::{Constraint, ConstraintType, FamilyMap, Strength};
pub use soa::{GrabBinding, ParticleStore, Point, PointRead, PointState};
pub use types::{BoneTransform, Transform};
