//! Step scheduling and the engine-private simulation buffers.
//!
//! [`DynamicsJob::execute`] hands the whole pipeline to the rayon pool and
//! returns immediately. Every other call that touches particle data first
//! blocks until that step has finished, so callers never observe a
//! half-solved state.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use parking_lot::{Condvar, Mutex};

use super::collision_pass::{collide_points, FloorSettings};
use super::integrator::Integrator;
use super::parallel::ExecutionMode;
use super::solver::{ConstraintSolver, SolverStepMetrics};
use super::transform_sync::sync_transforms;
use crate::collision::shapes::{ColliderPose, GrabberPose};
use crate::config::{DEFAULT_RELAXATION, DEFAULT_SPRING_K};
use crate::core::{
    collider::{SharedCollider, SharedGrabber},
    soa::{ParticleStore, Point},
    types::{BoneTransform, Transform},
};
use crate::error::{DynamicsError, Result};
use crate::topology::{batches::ConstraintBatch, builder::Topology};
use crate::utils::{
    logging::{warn_if_step_overran, ScopedTimer},
    profiling::{StageTimer, StepProfiler},
};

/// Per-step inputs supplied by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub dt: f32,
    pub wind: Vec3,
    pub relaxation: u32,
    pub spring_k: f32,
    pub floor: FloorSettings,
    pub collide_with_colliders: bool,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            wind: Vec3::ZERO,
            relaxation: DEFAULT_RELAXATION,
            spring_k: DEFAULT_SPRING_K,
            floor: FloorSettings::default(),
            collide_with_colliders: false,
        }
    }
}

/// Everything one step reads and writes. Owned by exactly one side at a
/// time: the job while idle, the worker while a step is in flight.
#[derive(Debug)]
struct SimulationState {
    particles: ParticleStore,
    bones: Vec<BoneTransform>,
    batches: Vec<ConstraintBatch>,
    colliders: Vec<ColliderPose>,
    grabbers: Vec<GrabberPose>,
    integrator: Integrator,
    solver: ConstraintSolver,
    parallel: bool,
    profiler: StepProfiler,
    metrics: SolverStepMetrics,
}

impl SimulationState {
    fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
        self.integrator.set_parallel(enabled);
        self.solver.set_parallel(enabled);
    }

    fn run(&mut self, params: &StepParams) {
        let _timer = ScopedTimer::new("dynamics_step");
        let start = Instant::now();
        let mode = ExecutionMode::from_flag(self.parallel);

        self.profiler.reset();
        self.profiler.point_count = self.particles.len();
        self.profiler.batch_count = self.batches.len();
        self.profiler.constraint_count = self.batches.iter().map(ConstraintBatch::len).sum();
        self.profiler.relaxation = params.relaxation;
        self.solver.spring_k = params.spring_k;

        {
            let _stage = StageTimer::new(&mut self.profiler.integrate_time);
            self.integrator
                .step(&mut self.particles, &self.grabbers, params.wind, params.dt);
        }

        {
            let _stage = StageTimer::new(&mut self.profiler.relax_time);
            self.metrics = self.solver.relax(
                &mut self.particles,
                &self.batches,
                &self.colliders,
                params.relaxation,
            );
        }

        if params.floor.enabled || params.collide_with_colliders {
            let _stage = StageTimer::new(&mut self.profiler.collision_time);
            collide_points(
                &mut self.particles.state,
                &self.colliders,
                params.floor,
                params.collide_with_colliders,
                mode,
            );
        }

        {
            let _stage = StageTimer::new(&mut self.profiler.sync_time);
            sync_transforms(&mut self.particles, &mut self.bones, mode);
        }

        self.profiler.total_step_time = start.elapsed();
        warn_if_step_overran(self.profiler.total_step_time, params.dt, self.profiler.point_count);
    }
}

/// Completion slot for a step running on the pool.
#[derive(Default)]
struct PendingStep {
    slot: Mutex<Option<Box<SimulationState>>>,
    done: Condvar,
}

impl PendingStep {
    fn finish(&self, state: Box<SimulationState>) {
        *self.slot.lock() = Some(state);
        self.done.notify_all();
    }

    fn wait(&self) -> Box<SimulationState> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(state) = slot.take() {
                return state;
            }
            self.done.wait(&mut slot);
        }
    }
}

/// Owns the simulation buffers and drives one step at a time.
pub struct DynamicsJob {
    root: Transform,
    state: Option<Box<SimulationState>>,
    pending: Option<Arc<PendingStep>>,
    colliders: Vec<SharedCollider>,
    grabbers: Vec<SharedGrabber>,
    parallel: bool,
}

impl Default for DynamicsJob {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicsJob {
    pub fn new() -> Self {
        Self {
            root: Transform::default(),
            state: None,
            pending: None,
            colliders: Vec::new(),
            grabbers: Vec::new(),
            parallel: true,
        }
    }

    /// Binds particles, bones, the batch table and the live host objects.
    ///
    /// `bones[i]` drives particle `i`. Any previous binding is released first.
    pub fn initialize(
        &mut self,
        root: Transform,
        points: &[Point],
        bones: Vec<BoneTransform>,
        topology: &Topology,
        colliders: Vec<SharedCollider>,
        grabbers: Vec<SharedGrabber>,
    ) -> Result<()> {
        self.uninitialize();

        if bones.len() != points.len() {
            return Err(DynamicsError::BoneCountMismatch {
                points: points.len(),
                bones: bones.len(),
            });
        }

        let particles = ParticleStore::from_points(points)?;
        let count = particles.len();
        for constraint in topology.batches.iter().flat_map(ConstraintBatch::constraints) {
            for index in [constraint.index_a, constraint.index_b] {
                if index >= count {
                    return Err(DynamicsError::ConstraintOutOfBounds { index, count });
                }
            }
        }

        let mut state = Box::new(SimulationState {
            particles,
            bones,
            batches: topology.batches.clone(),
            colliders: Vec::with_capacity(colliders.len()),
            grabbers: Vec::with_capacity(grabbers.len()),
            integrator: Integrator::new(),
            solver: ConstraintSolver::new(DEFAULT_SPRING_K),
            parallel: self.parallel,
            profiler: StepProfiler::default(),
            metrics: SolverStepMetrics::default(),
        });
        state.set_parallel(self.parallel);

        log::debug!(
            "dynamics job initialized: {} points, {} batches, {} colliders, {} grabbers",
            count,
            state.batches.len(),
            colliders.len(),
            grabbers.len()
        );

        self.root = root;
        self.colliders = colliders;
        self.grabbers = grabbers;
        self.state = Some(state);
        Ok(())
    }

    /// Releases every engine-private buffer after the in-flight step ends.
    pub fn uninitialize(&mut self) {
        self.wait_for_complete();
        self.state = None;
        self.colliders.clear();
        self.grabbers.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some() || self.pending.is_some()
    }

    /// Whether a dispatched step may still be running.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts one simulation step.
    ///
    /// Waits for the previous step, snapshots colliders and grabbers, then
    /// dispatches the pipeline. With parallel execution the call returns
    /// before the step finishes.
    pub fn execute(&mut self, params: &StepParams) -> Result<()> {
        self.wait_for_complete();
        let Some(mut state) = self.state.take() else {
            log::warn!("dynamics step requested before initialize");
            return Err(DynamicsError::NotInitialized);
        };

        state.colliders.clear();
        state
            .colliders
            .extend(self.colliders.iter().map(|c| ColliderPose::from_collider(&c.read())));
        state.grabbers.clear();
        state
            .grabbers
            .extend(self.grabbers.iter().map(|g| GrabberPose::from_grabber(&g.read())));

        #[cfg(feature = "parallel")]
        if self.parallel {
            let pending = Arc::new(PendingStep::default());
            let worker = Arc::clone(&pending);
            let params = *params;
            rayon::spawn(move || {
                state.run(&params);
                worker.finish(state);
            });
            self.pending = Some(pending);
            return Ok(());
        }

        state.run(params);
        self.state = Some(state);
        Ok(())
    }

    /// Blocks until the dispatched step, if any, has written its results.
    pub fn wait_for_complete(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.state = Some(pending.wait());
        }
    }

    fn state_mut(&mut self) -> Result<&mut SimulationState> {
        self.wait_for_complete();
        self.state
            .as_deref_mut()
            .ok_or(DynamicsError::NotInitialized)
    }

    /// Re-seeds every particle from its live bone, discarding velocity.
    pub fn reset(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        for (index, bone) in state.bones.iter().enumerate() {
            state.particles.teleport(index, bone.position);
        }
        Ok(())
    }

    /// Snaps every particle and bone back to the bind-time rest pose relative
    /// to the root transform.
    pub fn restore(&mut self) -> Result<()> {
        let root = self.root;
        let state = self.state_mut()?;
        for index in 0..state.particles.len() {
            let position = root.transform_point(state.particles.read[index].initial_position);
            state.particles.teleport(index, position);
            state.bones[index].position = position;
        }
        Ok(())
    }

    /// Replaces every rest length with the current distance between its
    /// endpoints.
    pub fn recompute_rest_lengths(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        let positions = state.particles.positions();
        for batch in &mut state.batches {
            batch.recompute_lengths(&positions);
        }
        Ok(())
    }

    pub fn set_root_transform(&mut self, root: Transform) {
        self.root = root;
    }

    pub fn root_transform(&self) -> Transform {
        self.root
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.wait_for_complete();
        self.parallel = enabled;
        if let Some(state) = self.state.as_deref_mut() {
            state.set_parallel(enabled);
        }
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn set_colliders(&mut self, colliders: Vec<SharedCollider>) {
        self.colliders = colliders;
    }

    pub fn set_grabbers(&mut self, grabbers: Vec<SharedGrabber>) {
        self.grabbers = grabbers;
    }

    pub fn bones(&mut self) -> Result<&[BoneTransform]> {
        Ok(&self.state_mut()?.bones)
    }

    /// Bones are the host side of the binding: pinned particles follow them
    /// and `reset` reads them.
    pub fn bones_mut(&mut self) -> Result<&mut [BoneTransform]> {
        Ok(&mut self.state_mut()?.bones)
    }

    pub fn particles(&mut self) -> Result<&ParticleStore> {
        Ok(&self.state_mut()?.particles)
    }

    pub fn particles_mut(&mut self) -> Result<&mut ParticleStore> {
        Ok(&mut self.state_mut()?.particles)
    }

    pub fn positions(&mut self) -> Result<Vec<Vec3>> {
        Ok(self.state_mut()?.particles.positions())
    }

    pub fn batches(&mut self) -> Result<&[ConstraintBatch]> {
        Ok(&self.state_mut()?.batches)
    }

    pub fn profiler(&mut self) -> Result<StepProfiler> {
        Ok(self.state_mut()?.profiler)
    }

    pub fn solver_metrics(&mut self) -> Result<SolverStepMetrics> {
        Ok(self.state_mut()?.metrics.clone())
    }
}

impl Drop for DynamicsJob {
    fn drop(&mut self) {
        self.wait_for_complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn job_is_send() {
        assert_send::<DynamicsJob>();
        assert_send::<SimulationState>();
    }

    #[test]
    fn pending_step_hands_state_back() {
        let pending = Arc::new(PendingStep::default());
        let worker = Arc::clone(&pending);
        let state = Box::new(SimulationState {
            particles: ParticleStore::new(),
            bones: Vec::new(),
            batches: Vec::new(),
            colliders: Vec::new(),
            grabbers: Vec::new(),
            integrator: Integrator::new(),
            solver: ConstraintSolver::new(1.0),
            parallel: false,
            profiler: StepProfiler::default(),
            metrics: SolverStepMetrics::default(),
        });
        let handle = std::thread::spawn(move || worker.finish(state));
        let state = pending.wait();
        handle.join().unwrap();
        assert!(state.particles.is_empty());
    }
}
