//! Error types for Joint Dynamics.
//!
//! Only construction and lifecycle calls are fallible. The per-step numerical
//! stages never fail; degenerate geometry is skipped locally instead.

use std::fmt;

/// Main error type for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicsError {
    /// A step or state query was issued before `initialize`.
    NotInitialized,
    /// The number of bones does not match the number of particles.
    BoneCountMismatch { points: usize, bones: usize },
    /// A particle references a parent or child index outside the particle set.
    InvalidLink { index: usize, target: usize, count: usize },
    /// Following parent links from this particle never reaches a root.
    CyclicHierarchy { index: usize },
    /// A root index does not name a node of the hierarchy.
    InvalidRoot { index: usize, count: usize },
    /// A constraint endpoint lies outside the particle set.
    ConstraintOutOfBounds { index: usize, count: usize },
}

impl fmt::Display for DynamicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "dynamics job used before initialization"),
            Self::BoneCountMismatch { points, bones } => {
                write!(f, "bone count {bones} does not match point count {points}")
            }
            Self::InvalidLink {
                index,
                target,
                count,
            } => write!(
                f,
                "point {index} links to {target}, outside of {count} points"
            ),
            Self::CyclicHierarchy { index } => {
                write!(f, "point {index} is part of a parent cycle")
            }
            Self::InvalidRoot { index, count } => {
                write!(f, "root {index} is outside of {count} nodes")
            }
            Self::ConstraintOutOfBounds { index, count } => {
                write!(f, "constraint endpoint {index} is outside of {count} points")
            }
        }
    }
}

impl std::error::Error for DynamicsError {}

/// Convenient Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, DynamicsError>;
