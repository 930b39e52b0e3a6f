//! Line-segment queries against sphere and capsule colliders.

use glam::Vec3;

use super::shapes::ColliderPose;
use crate::utils::math::clamp01;

/// Closest pair found between a constraint segment and a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub point_on_segment: Vec3,
    pub point_on_collider: Vec3,
}

impl SegmentHit {
    /// Vector pushing the segment away from the collider core.
    pub fn pushout(&self) -> Vec3 {
        self.point_on_segment - self.point_on_collider
    }
}

/// Closest points between two infinite lines `P(t) = pos_p + dir_p * t` and
/// `Q(t) = pos_q + dir_q * t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoints {
    pub t_p: f32,
    pub t_q: f32,
    pub point_p: Vec3,
    pub point_q: Vec3,
}

impl NearestPoints {
    pub fn distance_squared(&self) -> f32 {
        (self.point_q - self.point_p).length_squared()
    }
}

/// Closed-form nearest points between two skew lines.
///
/// Parallel (or degenerate) lines have no unique answer; `Q` is then anchored
/// at `t_q = 0` and `P` at the projection of that anchor.
pub fn nearest_points(pos_p: Vec3, dir_p: Vec3, pos_q: Vec3, dir_q: Vec3) -> NearestPoints {
    let normal = dir_p.cross(dir_q);
    let scale = dir_p.length_squared() * dir_q.length_squared();

    let (t_p, t_q) = if normal.length_squared() <= 1e-12 * scale || scale <= f32::EPSILON {
        let len_sq = dir_p.length_squared();
        let t_p = if len_sq > f32::EPSILON {
            (pos_q - pos_p).dot(dir_p) / len_sq
        } else {
            0.0
        };
        (t_p, 0.0)
    } else {
        let n1 = dir_p.cross(dir_q.cross(dir_p));
        let n2 = dir_q.cross(normal);
        (
            (pos_q - pos_p).dot(n2) / dir_p.dot(n2),
            (pos_p - pos_q).dot(n1) / dir_q.dot(n1),
        )
    };

    NearestPoints {
        t_p,
        t_q,
        point_p: pos_p + dir_p * t_p,
        point_q: pos_q + dir_q * t_q,
    }
}

/// Segment `p1..p2` against a sphere: the centre is projected onto the
/// segment and the clamped projection compared with the radius.
pub fn segment_sphere(p1: Vec3, p2: Vec3, center: Vec3, radius: f32) -> Option<SegmentHit> {
    let direction = p2 - p1;
    let length = direction.length();

    let point_on_segment = if length > f32::EPSILON {
        let unit = direction / length;
        p1 + unit * unit.dot(center - p1).clamp(0.0, length)
    } else {
        p1
    };

    if (center - point_on_segment).length_squared() > radius * radius {
        return None;
    }
    Some(SegmentHit {
        point_on_segment,
        point_on_collider: center,
    })
}

/// Segment `p1..p2` against a capsule.
///
/// The unclamped skew-line distance is tested first; both line parameters
/// are then clamped to `[0, 1]` and the distance re-tested. This favours the
/// segment endpoints over the exact segment-to-segment distance and can miss
/// contacts close to the caps.
pub fn segment_capsule(p1: Vec3, p2: Vec3, capsule: &ColliderPose) -> Option<SegmentHit> {
    let radius_sq = capsule.radius * capsule.radius;
    let segment = p2 - p1;

    let nearest = nearest_points(capsule.position, capsule.direction, p1, segment);
    if nearest.distance_squared() > radius_sq {
        return None;
    }

    let point_on_collider = capsule.position + capsule.direction * clamp01(nearest.t_p);
    let point_on_segment = p1 + segment * clamp01(nearest.t_q);

    if (point_on_collider - point_on_segment).length_squared() > radius_sq {
        return None;
    }
    Some(SegmentHit {
        point_on_segment,
        point_on_collider,
    })
}

/// Dispatches on the collider kind.
pub fn segment_hit(collider: &ColliderPose, p1: Vec3, p2: Vec3) -> Option<SegmentHit> {
    if collider.is_sphere() {
        segment_sphere(p1, p2, collider.position, collider.radius)
    } else {
        segment_capsule(p1, p2, collider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_hit_clamps_to_segment() {
        let hit = segment_sphere(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.25, 0.1, 0.0),
            0.2,
        )
        .expect("sphere straddles the segment");
        assert!((hit.point_on_segment - Vec3::new(0.25, 0.0, 0.0)).length() < 1e-6);

        let miss = segment_sphere(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.5, 0.0, 0.0),
            0.2,
        );
        assert!(miss.is_none(), "centre beyond the endpoint is out of reach");
    }

    #[test]
    fn degenerate_segment_tests_its_start_point() {
        let p = Vec3::new(0.0, 0.1, 0.0);
        let hit = segment_sphere(p, p, Vec3::ZERO, 0.5).expect("point inside sphere");
        assert_eq!(hit.point_on_segment, p);
    }

    #[test]
    fn nearest_points_of_crossing_lines() {
        let near = nearest_points(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::X,
            Vec3::new(0.5, 1.0, -1.0),
            Vec3::Z * 2.0,
        );
        assert!((near.t_p - 0.5).abs() < 1e-5);
        assert!((near.t_q - 0.5).abs() < 1e-5);
        assert!((near.distance_squared() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn parallel_lines_fall_back_to_projection() {
        let near = nearest_points(Vec3::ZERO, Vec3::Y, Vec3::new(0.3, 0.4, 0.0), Vec3::Y);
        assert!(near.t_p.is_finite() && near.t_q.is_finite());
        assert!((near.distance_squared() - 0.09).abs() < 1e-5);
    }

    #[test]
    fn capsule_hit_across_the_axis() {
        let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.2, 1.0, 0.0);
        let hit = segment_capsule(
            Vec3::new(-1.0, 0.1, 0.1),
            Vec3::new(1.0, 0.1, 0.1),
            &capsule,
        )
        .expect("segment passes through the capsule body");
        assert!((hit.point_on_collider - Vec3::new(0.0, 0.1, 0.0)).length() < 1e-5);
        assert!((hit.point_on_segment - Vec3::new(0.0, 0.1, 0.1)).length() < 1e-5);
    }

    #[test]
    fn capsule_miss_when_lines_are_far_apart() {
        let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.2, 1.0, 0.0);
        let hit = segment_capsule(
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            &capsule,
        );
        assert!(hit.is_none());
    }

    fn sampled_segment_distance(a0: Vec3, a1: Vec3, b0: Vec3, b1: Vec3) -> f32 {
        const STEPS: usize = 400;
        let mut best = f32::MAX;
        for i in 0..=STEPS {
            let a = a0.lerp(a1, i as f32 / STEPS as f32);
            for j in 0..=STEPS {
                let b = b0.lerp(b1, j as f32 / STEPS as f32);
                best = best.min(a.distance(b));
            }
        }
        best
    }

    #[test]
    fn capsule_clamp_matches_exact_distance_inside_the_body() {
        let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.2, 1.0, 0.0);
        let (p1, p2) = (Vec3::new(-1.0, 0.1, 0.1), Vec3::new(1.0, 0.1, 0.1));
        let hit = segment_capsule(p1, p2, &capsule).expect("segment passes through the capsule body");
        let exact = sampled_segment_distance(capsule.position, capsule.position + capsule.direction, p1, p2);
        assert!((hit.pushout().length() - exact).abs() < 1e-3);
    }

    #[test]
    fn capsule_clamp_misses_a_graze_past_the_cap() {
        // The lines cross below the cap end but before the segment starts, so
        // both parameters are clamped independently and the contact is lost.
        let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.2, 1.0, 0.0);
        let p1 = Vec3::new(0.15, 0.55, 0.0);
        let p2 = Vec3::new(1.15, 1.55, 0.0);

        let exact = sampled_segment_distance(capsule.position, capsule.position + capsule.direction, p1, p2);
        assert!((exact - 0.025f32.sqrt()).abs() < 1e-3);
        assert!(exact < capsule.radius);
        assert!(segment_capsule(p1, p2, &capsule).is_none());
    }
}
