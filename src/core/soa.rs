use crate::config::DEFAULT_INITIAL_FRICTION;
use crate::core::constraints::{ConstraintType, FamilyMap, Strength};
use crate::error::{DynamicsError, Result};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Fully baked description of one particle, handed to the job at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub parent: Option<usize>,
    pub child: Option<usize>,
    /// 0 = pinned (externally driven), 1 = free.
    pub weight: f32,
    pub mass: f32,
    /// Velocity retention factor, 1 = no damping.
    pub resistance: f32,
    pub friction_scale: f32,
    /// Per-family multipliers before the bind-time halving.
    pub strength: FamilyMap<Strength>,
    pub gravity: Vec3,
    /// Local direction towards the structural child.
    pub bone_axis: Vec3,
    /// Rest position in root space.
    pub initial_position: Vec3,
    pub local_rotation: Quat,
    pub position: Vec3,
    pub old_position: Vec3,
    pub previous_direction: Vec3,
}

impl Default for Point {
    fn default() -> Self {
        Self {
            parent: None,
            child: None,
            weight: 1.0,
            mass: 1.0,
            resistance: 1.0,
            friction_scale: 0.0,
            strength: FamilyMap::splat(Strength::default()),
            gravity: Vec3::ZERO,
            bone_axis: Vec3::Y,
            initial_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            old_position: Vec3::ZERO,
            previous_direction: Vec3::ZERO,
        }
    }
}

/// Parameters fixed for the lifetime of a topology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRead {
    pub parent: Option<usize>,
    pub child: Option<usize>,
    pub weight: f32,
    pub mass: f32,
    pub resistance: f32,
    pub friction_scale: f32,
    /// Halved per-family multipliers; two endpoints sum to the configured value.
    pub strength: FamilyMap<Strength>,
    pub gravity: Vec3,
    pub bone_axis: Vec3,
    pub initial_position: Vec3,
    pub local_rotation: Quat,
    pub depth: u32,
}

impl PointRead {
    pub fn is_pinned(&self) -> bool {
        self.weight == 0.0
    }

    pub fn strength(&self, kind: ConstraintType) -> Strength {
        self.strength[kind]
    }
}

/// Particle currently bound to a grabber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabBinding {
    pub grabber: usize,
    pub distance: f32,
}

/// Kinematic state mutated every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointState {
    pub position: Vec3,
    pub old_position: Vec3,
    /// Last non-degenerate parent-to-self direction.
    pub previous_direction: Vec3,
    pub grab: Option<GrabBinding>,
    /// Contact friction accumulated during the previous relaxation.
    pub friction: f32,
}

/// Structure-of-Arrays particle storage: read-only parameters and mutable
/// state live in separate dense vectors addressed by particle index.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    pub read: Vec<PointRead>,
    pub state: Vec<PointState>,
    /// Particle indices grouped by hierarchy depth, shallowest first.
    pub(crate) levels: Vec<Vec<usize>>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates links, resolves depths and bakes the halved strengths.
    pub fn from_points(points: &[Point]) -> Result<Self> {
        let count = points.len();
        for (index, point) in points.iter().enumerate() {
            for target in point.parent.iter().chain(point.child.iter()) {
                if *target >= count {
                    return Err(DynamicsError::InvalidLink {
                        index,
                        target: *target,
                        count,
                    });
                }
            }
        }

        let depths = resolve_depths(points)?;
        let mut levels: Vec<Vec<usize>> = Vec::new();
        for (index, &depth) in depths.iter().enumerate() {
            let depth = depth as usize;
            if levels.len() <= depth {
                levels.resize_with(depth + 1, Vec::new);
            }
            levels[depth].push(index);
        }

        let read = points
            .iter()
            .zip(depths.iter())
            .map(|(point, &depth)| PointRead {
                parent: point.parent,
                child: point.child,
                weight: point.weight,
                mass: point.mass,
                resistance: point.resistance,
                friction_scale: point.friction_scale,
                strength: point.strength.map(|_, s| s.scaled(0.5)),
                gravity: point.gravity,
                bone_axis: point.bone_axis,
                initial_position: point.initial_position,
                local_rotation: point.local_rotation,
                depth,
            })
            .collect();

        let state = points
            .iter()
            .map(|point| PointState {
                position: point.position,
                old_position: point.old_position,
                previous_direction: point.previous_direction,
                grab: None,
                friction: DEFAULT_INITIAL_FRICTION,
            })
            .collect();

        Ok(Self {
            read,
            state,
            levels,
        })
    }

    pub fn len(&self) -> usize {
        self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        self.state[index].position
    }

    /// Moves a particle and clears its velocity.
    pub fn teleport(&mut self, index: usize, position: Vec3) {
        let state = &mut self.state[index];
        state.position = position;
        state.old_position = position;
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.state.iter().map(|s| s.position).collect()
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.read[index].is_pinned()
    }

    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }
}

fn resolve_depths(points: &[Point]) -> Result<Vec<u32>> {
    let count = points.len();
    let mut depths: Vec<Option<u32>> = vec![None; count];
    let mut path = Vec::new();

    for start in 0..count {
        let mut cursor = start;
        path.clear();
        let base = loop {
            if let Some(depth) = depths[cursor] {
                break depth;
            }
            if path.len() > count {
                return Err(DynamicsError::CyclicHierarchy { index: start });
            }
            path.push(cursor);
            match points[cursor].parent {
                Some(parent) => cursor = parent,
                None => {
                    path.pop();
                    depths[cursor] = Some(0);
                    break 0;
                }
            }
        };
        for (offset, &index) in path.iter().rev().enumerate() {
            depths[index] = Some(base + offset as u32 + 1);
        }
    }

    Ok(depths.into_iter().map(|d| d.unwrap_or(0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> Vec<Point> {
        (0..len)
            .map(|i| Point {
                parent: i.checked_sub(1),
                child: if i + 1 < len { Some(i + 1) } else { None },
                weight: if i == 0 { 0.0 } else { 1.0 },
                position: Vec3::new(0.0, -(i as f32), 0.0),
                ..Point::default()
            })
            .collect()
    }

    #[test]
    fn depths_follow_parent_links() {
        let store = ParticleStore::from_points(&chain(4)).unwrap();
        let depths: Vec<u32> = store.read.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3]);
        assert_eq!(store.levels().len(), 4);
        assert_eq!(store.levels()[2], vec![2]);
    }

    #[test]
    fn strengths_are_halved_at_bind() {
        let store = ParticleStore::from_points(&chain(2)).unwrap();
        let s = store.read[1].strength(ConstraintType::Shear);
        assert_eq!(s.shrink, 0.5);
        assert_eq!(s.stretch, 0.5);
    }

    #[test]
    fn out_of_range_links_are_rejected() {
        let mut points = chain(2);
        points[1].child = Some(7);
        let err = ParticleStore::from_points(&points).unwrap_err();
        assert_eq!(
            err,
            DynamicsError::InvalidLink {
                index: 1,
                target: 7,
                count: 2
            }
        );
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let mut points = chain(3);
        points[0].parent = Some(2);
        assert!(matches!(
            ParticleStore::from_points(&points),
            Err(DynamicsError::CyclicHierarchy { .. })
        ));
    }
}
