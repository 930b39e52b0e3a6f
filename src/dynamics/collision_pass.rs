use serde::{Deserialize, Serialize};

use super::parallel::{for_each_mut, ExecutionMode};
use crate::collision::{pushout::pushout_point, shapes::ColliderPose};
use crate::config::DEFAULT_FLOOR_HEIGHT;
use crate::core::soa::PointState;

/// One-sided horizontal floor particles may not sink below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorSettings {
    pub enabled: bool,
    pub height: f32,
}

impl Default for FloorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            height: DEFAULT_FLOOR_HEIGHT,
        }
    }
}

impl FloorSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            height: 0.0,
        }
    }

    pub fn at(height: f32) -> Self {
        Self {
            enabled: true,
            height,
        }
    }
}

/// Clamps every particle above the floor and pushes it out of colliders.
///
/// Only positions change; the previous position keeps its pre-clamp value so
/// the next Verlet step sees the correction as damping.
pub fn collide_points(
    states: &mut [PointState],
    colliders: &[ColliderPose],
    floor: FloorSettings,
    collide_with_colliders: bool,
    mode: ExecutionMode,
) {
    if !floor.enabled && !collide_with_colliders {
        return;
    }

    for_each_mut(states, mode, |_, state| {
        if floor.enabled && state.position.y <= floor.height {
            state.position.y = floor.height;
        }

        if collide_with_colliders {
            for collider in colliders {
                pushout_point(collider, &mut state.position);
            }
        }
    });
}
