//! Additional math helpers layered on top of `glam`.

use glam::{Quat, Vec3};

use crate::config::EPSILON;

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Whether a direction is long enough to normalize safely.
pub fn is_usable_direction(direction: Vec3) -> bool {
    direction.length_squared() > EPSILON * EPSILON
}

/// Shortest-arc rotation turning `from` onto `to`.
///
/// Returns `None` when either vector is too short to define a direction.
pub fn aim_rotation(from: Vec3, to: Vec3) -> Option<Quat> {
    let from = from.try_normalize()?;
    let to = to.try_normalize()?;
    Some(Quat::from_rotation_arc(from, to))
}

/// Re-aims `rotation` so that `axis` (expressed in its local frame) points at `target`.
pub fn aim_axis(rotation: Quat, axis: Vec3, target: Vec3) -> Quat {
    match aim_rotation(rotation * axis, target) {
        Some(arc) => (arc * rotation).normalize(),
        None => rotation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aim_axis_points_local_axis_at_target() {
        let rotation = Quat::from_rotation_z(0.3);
        let aimed = aim_axis(rotation, Vec3::Y, Vec3::new(1.0, 0.0, 1.0));
        let pointing = aimed * Vec3::Y;
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!((pointing - expected).length() < 1e-4, "got {pointing:?}");
    }

    #[test]
    fn zero_target_keeps_rotation() {
        let rotation = Quat::from_rotation_x(1.0);
        assert_eq!(aim_axis(rotation, Vec3::Y, Vec3::ZERO), rotation);
    }
}
