//! Simulation pipeline: integration, relaxation, point collision, transform
//! sync and the job that schedules them.

pub mod collision_pass;
pub mod integrator;
pub mod job;
pub mod parallel;
pub mod solver;
pub mod transform_sync;

pub use collision_pass::{collide_points, FloorSettings};
pub use integrator::Integrator;
pub use job::{DynamicsJob, StepParams};
pub use parallel::ExecutionMode;
pub use solver::{ConstraintCorrection, ConstraintSolver, SolverStepMetrics};
pub use transform_sync::sync_transforms;
