//! Point-versus-collider pushout used by the point collision pass.

use glam::Vec3;

use super::shapes::ColliderPose;
use crate::config::EPSILON;

/// Moves `point` radially onto the sphere surface when it lies inside.
///
/// Points within [`EPSILON`] of the centre have no usable direction and are
/// left alone. Returns whether the point moved.
pub fn pushout_from_sphere(center: Vec3, radius: f32, point: &mut Vec3) -> bool {
    let direction = *point - center;
    let distance_sq = direction.length_squared();
    if distance_sq > EPSILON * EPSILON && distance_sq < radius * radius {
        let distance = distance_sq.sqrt();
        *point = center + direction * (radius / distance);
        return true;
    }
    false
}

/// Moves `point` out of a capsule: beyond either cap the cap sphere is used,
/// otherwise the point is pushed radially away from the nearest axis point.
pub fn pushout_from_capsule(capsule: &ColliderPose, point: &mut Vec3) -> bool {
    if capsule.height <= 0.0 {
        return pushout_from_sphere(capsule.position, capsule.radius, point);
    }

    let axis = capsule.direction / capsule.height;
    let along = axis.dot(*point - capsule.position);
    if along <= 0.0 {
        pushout_from_sphere(capsule.position, capsule.radius, point)
    } else if along >= capsule.height {
        pushout_from_sphere(capsule.end(), capsule.radius, point)
    } else {
        pushout_from_sphere(capsule.position + axis * along, capsule.radius, point)
    }
}

/// Dispatches on the collider kind.
pub fn pushout_point(collider: &ColliderPose, point: &mut Vec3) -> bool {
    if collider.is_sphere() {
        pushout_from_sphere(collider.position, collider.radius, point)
    } else {
        pushout_from_capsule(collider, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_point_is_left_alone() {
        let mut point = Vec3::ZERO;
        assert!(!pushout_from_sphere(Vec3::ZERO, 1.0, &mut point));
        assert_eq!(point, Vec3::ZERO);
    }

    #[test]
    fn capsule_side_pushout_is_radial() {
        let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.5, 2.0, 0.0);
        let mut point = Vec3::new(0.1, 0.3, 0.0);
        assert!(pushout_from_capsule(&capsule, &mut point));
        assert!((point - Vec3::new(0.5, 0.3, 0.0)).length() < 1e-5);
    }

    #[test]
    fn capsule_cap_pushout_uses_cap_sphere() {
        let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.5, 2.0, 0.0);
        let mut point = Vec3::new(0.0, 1.2, 0.0);
        assert!(pushout_from_capsule(&capsule, &mut point));
        assert!((point - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-5);
    }
}
