use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, orientation, and non-uniform scale of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }

    /// Maps a point from this transform's local space into world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Maps a world-space point into this transform's local space.
    ///
    /// Zero scale components collapse the corresponding axis to zero instead
    /// of producing infinities.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (point - self.position);
        let inv_scale = Vec3::new(
            recip_or_zero(self.scale.x),
            recip_or_zero(self.scale.y),
            recip_or_zero(self.scale.z),
        );
        local * inv_scale
    }
}

fn recip_or_zero(value: f32) -> f32 {
    if value == 0.0 {
        0.0
    } else {
        1.0 / value
    }
}

/// World-space pose of the skeleton bone that drives (or is driven by) one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub position: Vec3,
    pub rotation: Quat,
    /// World rotation of the bone's scene parent.
    pub parent_rotation: Quat,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            parent_rotation: Quat::IDENTITY,
        }
    }
}

impl BoneTransform {
    pub fn new(position: Vec3, rotation: Quat, parent_rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            parent_rotation,
        }
    }

    /// Rotation relative to the scene parent.
    pub fn local_rotation(&self) -> Quat {
        (self.parent_rotation.inverse() * self.rotation).normalize()
    }

    pub fn set_local_rotation(&mut self, local: Quat) {
        self.rotation = (self.parent_rotation * local).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_transform_point_round_trips() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::splat(2.0),
        };
        let world = Vec3::new(-0.5, 4.0, 1.25);
        let back = transform.transform_point(transform.inverse_transform_point(world));
        assert!((back - world).length() < 1e-5, "got {back:?}");
    }

    #[test]
    fn local_rotation_is_relative_to_parent() {
        let parent = Quat::from_rotation_z(0.5);
        let mut bone = BoneTransform::new(Vec3::ZERO, Quat::IDENTITY, parent);
        bone.set_local_rotation(Quat::from_rotation_x(0.25));
        let local = bone.local_rotation();
        assert!(local.angle_between(Quat::from_rotation_x(0.25)) < 1e-4);
    }
}
