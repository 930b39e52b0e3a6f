use glam::Vec3;

use crate::core::collider::{Collider, ColliderShape, Grabber};

/// World-space snapshot of a collider taken at the start of a step.
///
/// Capsules are stored as a start point plus an axis vector whose length is
/// the capsule height, so the segment is `position..position + direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderPose {
    pub radius: f32,
    pub height: f32,
    pub friction: f32,
    pub position: Vec3,
    pub direction: Vec3,
}

impl ColliderPose {
    pub fn sphere(center: Vec3, radius: f32, friction: f32) -> Self {
        Self {
            radius,
            height: 0.0,
            friction,
            position: center,
            direction: Vec3::ZERO,
        }
    }

    /// Capsule centred on `center` whose axis runs along `axis` (normalized here).
    pub fn capsule(center: Vec3, axis: Vec3, radius: f32, height: f32, friction: f32) -> Self {
        let direction = axis.normalize_or_zero() * height;
        Self {
            radius,
            height,
            friction,
            position: center - direction * 0.5,
            direction,
        }
    }

    pub fn from_collider(collider: &Collider) -> Self {
        let transform = &collider.transform;
        match collider.shape {
            ColliderShape::Sphere { radius } => {
                Self::sphere(transform.position, radius, collider.friction)
            }
            ColliderShape::Capsule { radius, height } => Self::capsule(
                transform.position,
                transform.rotation * Vec3::Y,
                radius,
                height,
                collider.friction,
            ),
        }
    }

    pub fn is_sphere(&self) -> bool {
        self.height <= 0.0
    }

    /// Far cap centre of a capsule; the centre itself for spheres.
    pub fn end(&self) -> Vec3 {
        self.position + self.direction
    }
}

/// Snapshot of a grabber taken at the start of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabberPose {
    pub position: Vec3,
    pub radius: f32,
    pub force: f32,
    pub enabled: bool,
}

impl GrabberPose {
    pub fn from_grabber(grabber: &Grabber) -> Self {
        Self {
            position: grabber.position,
            radius: grabber.radius,
            force: grabber.force,
            enabled: grabber.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn capsule_pose_is_centred_on_transform() {
        let collider = Collider::builder()
            .capsule(0.1, 2.0)
            .position(Vec3::new(0.0, 1.0, 0.0))
            .rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))
            .build();
        let pose = ColliderPose::from_collider(&collider);
        assert!(!pose.is_sphere());
        let mid = pose.position + pose.direction * 0.5;
        assert!((mid - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        assert!((pose.direction.length() - 2.0).abs() < 1e-5);
        assert!(pose.direction.x.abs() > 1.99);
    }
}
