use glam::Vec3;

use super::parallel::{for_each_mut, ExecutionMode};
use crate::collision::shapes::GrabberPose;
use crate::core::soa::{GrabBinding, ParticleStore, PointRead, PointState};

/// Verlet integrator advancing every free particle by one step.
#[derive(Debug, Clone)]
pub struct Integrator {
    parallel: bool,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Integrator {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    /// Applies gravity, wind, damping, friction decay and grabbers.
    ///
    /// Pinned particles are skipped entirely.
    pub fn step(&self, particles: &mut ParticleStore, grabbers: &[GrabberPose], wind: Vec3, dt: f32) {
        let half_dt_sq = dt * dt * 0.5;
        let read = &particles.read;
        for_each_mut(
            &mut particles.state,
            ExecutionMode::from_flag(self.parallel),
            |index, state| {
                let point = &read[index];
                if point.is_pinned() {
                    return;
                }
                Self::integrate_point(point, state, wind, half_dt_sq);
                Self::apply_grabbers(state, grabbers);
            },
        );
    }

    pub fn integrate_point(point: &PointRead, state: &mut PointState, wind: Vec3, half_dt_sq: f32) {
        let force = (point.gravity + wind) * half_dt_sq;

        let mut displacement = state.position - state.old_position;
        if point.mass > 0.0 {
            displacement += force / point.mass;
        }
        displacement *= point.resistance;
        displacement *= 1.0 - state.friction * point.friction_scale;

        state.old_position = state.position;
        state.position += displacement;
        state.friction = 0.0;
    }

    /// Pulls a bound particle towards its grabber, or binds it to the nearest
    /// enabled grabber in range.
    pub fn apply_grabbers(state: &mut PointState, grabbers: &[GrabberPose]) {
        if let Some(binding) = state.grab {
            let grabber = match grabbers.get(binding.grabber) {
                Some(grabber) if grabber.enabled => grabber,
                _ => {
                    state.grab = None;
                    return;
                }
            };

            let offset = (state.position - grabber.position).normalize_or_zero();
            let target = grabber.position + offset * binding.distance;
            state.position += (target - state.position) * grabber.force;
            return;
        }

        let nearest = grabbers
            .iter()
            .enumerate()
            .filter(|(_, grabber)| grabber.enabled)
            .map(|(index, grabber)| (index, grabber.position.distance_squared(state.position), grabber))
            .filter(|(_, distance_sq, grabber)| *distance_sq < grabber.radius * grabber.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((grabber, distance_sq, _)) = nearest {
            state.grab = Some(GrabBinding {
                grabber,
                distance: distance_sq.sqrt() * 0.5,
            });
        }
    }
}
