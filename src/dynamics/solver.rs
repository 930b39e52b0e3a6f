use glam::Vec3;

use super::parallel::{map_collect, ExecutionMode};
use crate::collision::{queries::segment_hit, shapes::ColliderPose};
use crate::core::{
    constraints::Constraint,
    soa::{ParticleStore, PointRead, PointState},
};
use crate::topology::batches::ConstraintBatch;
use crate::utils::math::clamp01;

/// New endpoint state produced by relaxing one constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintCorrection {
    pub index_a: usize,
    pub index_b: usize,
    pub position_a: Vec3,
    pub position_b: Vec3,
    /// Friction accumulated against colliders, present for collision-enabled links.
    pub friction: Option<f32>,
}

#[derive(Debug, Default, Clone)]
pub struct SolverStepMetrics {
    pub iterations: u32,
    pub batches_solved: usize,
    pub constraints_solved: usize,
    pub collider_hits: usize,
}

/// Iterative relaxation over the conflict-free batch table.
#[derive(Debug, Clone)]
pub struct ConstraintSolver {
    pub spring_k: f32,
    parallel: bool,
}

impl ConstraintSolver {
    pub fn new(spring_k: f32) -> Self {
        Self {
            spring_k,
            parallel: true,
        }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    /// Runs `iterations` passes over every batch in order.
    ///
    /// Constraints inside one batch share no particle, so their corrections
    /// are computed in parallel from the same snapshot and scattered afterwards.
    pub fn relax(
        &self,
        particles: &mut ParticleStore,
        batches: &[ConstraintBatch],
        colliders: &[ColliderPose],
        iterations: u32,
    ) -> SolverStepMetrics {
        let mode = ExecutionMode::from_flag(self.parallel);
        let mut metrics = SolverStepMetrics {
            iterations,
            ..SolverStepMetrics::default()
        };

        for _ in 0..iterations {
            for batch in batches {
                let corrections = {
                    let read = &particles.read;
                    let state = &particles.state;
                    map_collect(batch.constraints(), mode, |constraint| {
                        Self::solve_constraint(constraint, read, state, colliders, self.spring_k)
                    })
                };

                for correction in corrections.into_iter().flatten() {
                    metrics.constraints_solved += 1;
                    if correction.friction.is_some_and(|f| f > 0.0) {
                        metrics.collider_hits += 1;
                    }
                    Self::apply(particles, &correction);
                }
                metrics.batches_solved += 1;
            }
        }

        metrics
    }

    /// Computes the relaxed endpoint positions of one constraint.
    ///
    /// Returns `None` when both endpoints are pinned.
    pub fn solve_constraint(
        constraint: &Constraint,
        read: &[PointRead],
        state: &[PointState],
        colliders: &[ColliderPose],
        spring_k: f32,
    ) -> Option<ConstraintCorrection> {
        let point_a = &read[constraint.index_a];
        let point_b = &read[constraint.index_b];
        let weight_a = point_a.weight;
        let weight_b = point_b.weight;
        if weight_a == 0.0 && weight_b == 0.0 {
            return None;
        }

        let mut position_a = state[constraint.index_a].position;
        let mut position_b = state[constraint.index_b].position;

        let direction = position_b - position_a;
        let distance = direction.length();
        let force = (distance - constraint.length) * spring_k;

        let is_shrink = force >= 0.0;
        let endpoint_sum = point_a.strength(constraint.kind).select(is_shrink)
            + point_b.strength(constraint.kind).select(is_shrink);
        let power = if is_shrink {
            constraint.shrink * endpoint_sum
        } else {
            constraint.stretch * endpoint_sum
        };

        if power > 0.0 {
            let displacement = direction.normalize_or_zero() * (force * power);
            let inv_weight = 1.0 / (weight_a + weight_b);
            position_a += displacement * (weight_a * inv_weight);
            position_b -= displacement * (weight_b * inv_weight);
        }

        let friction = if constraint.collision {
            Some(Self::push_out_segment(
                &mut position_a,
                &mut position_b,
                colliders,
            ))
        } else {
            None
        };

        Some(ConstraintCorrection {
            index_a: constraint.index_a,
            index_b: constraint.index_b,
            position_a,
            position_b,
            friction,
        })
    }

    /// Pushes the segment `a..b` out of every collider it touches and returns
    /// the strongest friction among the hits.
    ///
    /// Each endpoint receives the share of the pushout proportional to how far
    /// the contact lies from the other endpoint.
    pub fn push_out_segment(a: &mut Vec3, b: &mut Vec3, colliders: &[ColliderPose]) -> f32 {
        let mut friction: f32 = 0.0;

        for collider in colliders {
            let Some(hit) = segment_hit(collider, *a, *b) else {
                continue;
            };

            let pushout = hit.pushout();
            let pushout_distance = pushout.length();
            if pushout_distance <= f32::EPSILON {
                continue;
            }
            let normal = pushout / pushout_distance;

            let half_length = a.distance(*b) * 0.5;
            let (rate_a, rate_b) = if half_length > f32::EPSILON {
                (
                    clamp01(hit.point_on_segment.distance(*a) / half_length),
                    clamp01(hit.point_on_segment.distance(*b) / half_length),
                )
            } else {
                (1.0, 1.0)
            };

            let correction = normal * (collider.radius - pushout_distance).max(0.0);
            *a += correction * rate_b;
            *b += correction * rate_a;

            friction = friction.max(collider.friction * clamp01(Vec3::Y.dot(normal)));
        }

        friction
    }

    pub fn apply(particles: &mut ParticleStore, correction: &ConstraintCorrection) {
        let state = &mut particles.state;
        state[correction.index_a].position = correction.position_a;
        state[correction.index_b].position = correction.position_b;
        if let Some(friction) = correction.friction {
            let a = &mut state[correction.index_a].friction;
            *a = a.max(friction);
            let b = &mut state[correction.index_b].friction;
            *b = b.max(friction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushout_favours_the_nearer_endpoint() {
        let mut a = Vec3::new(-1.0, 0.0, 0.0);
        let mut b = Vec3::new(1.0, 0.0, 0.0);
        let sphere = ColliderPose::sphere(Vec3::new(0.5, -0.1, 0.0), 0.3, 0.8);
        let friction = ConstraintSolver::push_out_segment(&mut a, &mut b, &[sphere]);

        assert!(b.y > a.y, "b is closer to the contact and moves more");
        assert!(a.y > 0.0);
        assert!((friction - 0.8).abs() < 1e-5, "contact normal points up");
    }

    #[test]
    fn side_contact_adds_no_friction() {
        let mut a = Vec3::new(0.0, -1.0, 0.0);
        let mut b = Vec3::new(0.0, 1.0, 0.0);
        let sphere = ColliderPose::sphere(Vec3::new(0.1, 0.0, 0.0), 0.3, 0.8);
        let friction = ConstraintSolver::push_out_segment(&mut a, &mut b, &[sphere]);
        assert!(a.x < 0.0 && b.x < 0.0);
        assert!(friction.abs() < 1e-6);
    }
}
