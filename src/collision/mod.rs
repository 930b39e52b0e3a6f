//! Analytic collision geometry: collider snapshots, segment queries, point pushout.

pub mod pushout;
pub mod queries;
pub mod shapes;

pub use pushout::{pushout_from_capsule, pushout_from_sphere, pushout_point};
pub use queries::{nearest_points, segment_capsule, segment_hit, segment_sphere, NearestPoints, SegmentHit};
pub use shapes::{ColliderPose, GrabberPose};
