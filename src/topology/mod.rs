//! Constraint topology: joint hierarchy, family construction and batching.

pub mod batches;
pub mod builder;
pub mod hierarchy;

pub use batches::{build_batches, ConstraintBatch};
pub use builder::{build_topology, PointLayout, Topology, TopologyOptions};
pub use hierarchy::{JointHierarchy, JointNode};
