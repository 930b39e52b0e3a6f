//! Joint Dynamics – secondary motion for skeletal hierarchies.
//!
//! Particles hanging off a skeleton are linked by five families of elastic
//! constraints, integrated with Verlet, relaxed batch by batch, pushed out of
//! sphere and capsule colliders and finally written back onto the bones.
//! [`DynamicsController`] covers the usual lifecycle; [`DynamicsJob`] and the
//! stage functions in [`dynamics`] can be driven directly.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod topology;
pub mod utils;
pub mod world;

pub use glam::{Quat, Vec3};

pub use collision::shapes::{ColliderPose, GrabberPose};
pub use crate::core::{
    collider::{Collider, ColliderBuilder, ColliderShape, Grabber, SharedCollider, SharedGrabber},
    constraints::{Constraint, ConstraintType, FamilyMap, Strength},
    soa::{ParticleStore, Point, PointRead, PointState},
    types::{BoneTransform, Transform},
};
pub use dynamics::{
    collision_pass::FloorSettings,
    integrator::Integrator,
    job::{DynamicsJob, StepParams},
    solver::{ConstraintSolver, SolverStepMetrics},
};
pub use error::{DynamicsError, Result};
pub use topology::{
    batches::{build_batches, ConstraintBatch},
    builder::{build_topology, PointLayout, Topology, TopologyOptions},
    hierarchy::{JointHierarchy, JointNode},
};
pub use utils::profiling::StepProfiler;
pub use world::{ControllerSettings, CurveSample, DynamicsController, PointCurves};
