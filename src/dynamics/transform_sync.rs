//! Writes solved particle positions back onto the driving skeleton.

use glam::{Quat, Vec3};

use super::parallel::{map_collect, ExecutionMode};
use crate::core::{soa::ParticleStore, types::BoneTransform};
use crate::utils::math::{aim_axis, is_usable_direction};

/// Result of syncing one particle, scattered after its depth level is done.
#[derive(Debug, Clone, Copy)]
struct SyncUpdate {
    index: usize,
    position: Vec3,
    previous_direction: Option<Vec3>,
    bone: Option<BoneTransform>,
}

/// Syncs particles level by level, shallowest first, so every particle sees
/// its parent's final position and rotation. Particles sharing a depth are
/// processed in parallel.
pub fn sync_transforms(particles: &mut ParticleStore, bones: &mut [BoneTransform], mode: ExecutionMode) {
    for depth in 0..particles.levels.len() {
        let updates = {
            let particles = &*particles;
            let bones = &*bones;
            map_collect(particles.levels[depth].as_slice(), mode, |&index| {
                sync_point(particles, bones, index)
            })
        };

        for update in updates {
            let state = &mut particles.state[update.index];
            state.position = update.position;
            if let Some(direction) = update.previous_direction {
                state.previous_direction = direction;
            }
            if let Some(bone) = update.bone {
                bones[update.index] = bone;
            }
        }
    }
}

fn sync_point(particles: &ParticleStore, bones: &[BoneTransform], index: usize) -> SyncUpdate {
    let point = &particles.read[index];
    let state = &particles.state[index];
    let bone = bones[index];

    let parent_rotation = match point.parent {
        Some(parent) => bones[parent].rotation,
        None => bone.parent_rotation,
    };

    if point.is_pinned() {
        let position = bone.position;
        return SyncUpdate {
            index,
            position,
            previous_direction: None,
            bone: Some(aim_bone(particles, index, position, bone, parent_rotation)),
        };
    }

    let Some(parent) = point.parent else {
        return SyncUpdate {
            index,
            position: state.position,
            previous_direction: None,
            bone: Some(aim_bone(particles, index, state.position, bone, parent_rotation)),
        };
    };

    let parent_position = particles.state[parent].position;
    let direction = state.position - parent_position;
    if is_usable_direction(direction) {
        SyncUpdate {
            index,
            position: state.position,
            previous_direction: Some(direction),
            bone: Some(aim_bone(particles, index, state.position, bone, parent_rotation)),
        }
    } else {
        SyncUpdate {
            index,
            position: parent_position + state.previous_direction,
            previous_direction: None,
            bone: None,
        }
    }
}

/// Resets the bone to its bind-time local rotation, then turns it so the
/// rest bone axis points at the structural child.
fn aim_bone(
    particles: &ParticleStore,
    index: usize,
    position: Vec3,
    mut bone: BoneTransform,
    parent_rotation: Quat,
) -> BoneTransform {
    let point = &particles.read[index];
    bone.position = position;
    bone.parent_rotation = parent_rotation;
    bone.set_local_rotation(point.local_rotation);

    if let Some(child) = point.child {
        let direction = particles.state[child].position - position;
        if is_usable_direction(direction) {
            bone.rotation = aim_axis(bone.rotation, point.bone_axis, direction);
        }
    }
    bone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::soa::Point;

    /// Pinned root at the origin, a free joint below it and a tip sitting
    /// exactly on that joint.
    fn collapsed_tip() -> (ParticleStore, Vec<BoneTransform>) {
        let points = [
            Point {
                child: Some(1),
                weight: 0.0,
                ..Point::default()
            },
            Point {
                parent: Some(0),
                child: Some(2),
                position: Vec3::NEG_Y,
                previous_direction: Vec3::NEG_Y,
                ..Point::default()
            },
            Point {
                parent: Some(1),
                position: Vec3::NEG_Y,
                previous_direction: Vec3::new(0.3, -0.4, 0.0),
                ..Point::default()
            },
        ];
        let bones = vec![
            BoneTransform::default(),
            BoneTransform::new(Vec3::NEG_Y, Quat::IDENTITY, Quat::IDENTITY),
            BoneTransform::new(Vec3::new(7.0, 7.0, 7.0), Quat::from_rotation_z(0.5), Quat::IDENTITY),
        ];
        (ParticleStore::from_points(&points).expect("valid points"), bones)
    }

    #[test]
    fn coincident_particle_falls_back_to_previous_direction() {
        let (mut particles, mut bones) = collapsed_tip();
        let tip_bone = bones[2];

        sync_transforms(&mut particles, &mut bones, ExecutionMode::Serial);

        let tip = particles.state[2];
        assert!(tip.position.abs_diff_eq(Vec3::new(0.3, -1.4, 0.0), 1e-6), "{:?}", tip.position);
        assert_eq!(tip.previous_direction, Vec3::new(0.3, -0.4, 0.0));
        assert_eq!(bones[2], tip_bone);
    }

    #[test]
    fn usable_direction_is_remembered_and_bone_follows() {
        let (mut particles, mut bones) = collapsed_tip();
        particles.state[1].position = Vec3::new(0.0, -2.0, 0.0);

        sync_transforms(&mut particles, &mut bones, ExecutionMode::Serial);

        assert_eq!(particles.state[1].previous_direction, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(bones[1].position, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(bones[0].position, Vec3::ZERO);
    }
}
