use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_GRAVITY, DEFAULT_RELAXATION, DEFAULT_SETTLE_DELAY, DEFAULT_SPRING_K,
        DEFAULT_WIND_FREQUENCY,
    },
    core::{
        collider::{SharedCollider, SharedGrabber},
        constraints::{ConstraintType, FamilyMap, Strength},
        soa::Point,
        types::{BoneTransform, Transform},
    },
    dynamics::{
        collision_pass::FloorSettings,
        job::{DynamicsJob, StepParams},
    },
    error::{DynamicsError, Result},
    topology::{
        builder::{build_topology, Topology, TopologyOptions},
        hierarchy::JointHierarchy,
    },
};

/// Everything the controller feeds into topology building, point baking and
/// every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub relaxation: u32,
    pub spring_k: f32,
    pub gravity: Vec3,
    pub wind_force: Vec3,
    pub wind_frequency: f32,
    pub floor: FloorSettings,
    pub collide_with_colliders: bool,
    pub topology: TopologyOptions,
    /// Families whose shrink response is multiplied by the all-shrink scale.
    pub all_shrink: FamilyMap<bool>,
    /// Families whose stretch response is multiplied by the all-stretch scale.
    pub all_stretch: FamilyMap<bool>,
    /// Seconds to hold still after a rebuild or physics reset.
    pub settle_delay: f32,
    pub ignore_physics_reset: bool,
    pub parallel: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            relaxation: DEFAULT_RELAXATION,
            spring_k: DEFAULT_SPRING_K,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            wind_force: Vec3::ZERO,
            wind_frequency: DEFAULT_WIND_FREQUENCY,
            floor: FloorSettings::default(),
            collide_with_colliders: false,
            topology: TopologyOptions::default(),
            // Vertical structural shrink keeps its own scale.
            all_shrink: FamilyMap::new([false, true, true, true, true]),
            all_stretch: FamilyMap::splat(true),
            settle_delay: DEFAULT_SETTLE_DELAY,
            ignore_physics_reset: false,
            parallel: true,
        }
    }
}

/// Scalars looked up for one particle from its normalised depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSample {
    pub mass_scale: f32,
    pub gravity_scale: f32,
    /// Fraction of velocity removed each step.
    pub resistance: f32,
    pub friction_scale: f32,
    pub family: FamilyMap<Strength>,
    pub all_shrink: f32,
    pub all_stretch: f32,
}

impl Default for CurveSample {
    fn default() -> Self {
        Self {
            mass_scale: 1.0,
            gravity_scale: 1.0,
            resistance: 0.0,
            friction_scale: 0.7,
            family: FamilyMap::splat(Strength::default()),
            all_shrink: 1.0,
            all_stretch: 1.0,
        }
    }
}

/// Precomputed per-particle curve values. Particles without an entry use
/// [`CurveSample::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCurves {
    samples: Vec<CurveSample>,
}

impl PointCurves {
    pub fn new(samples: Vec<CurveSample>) -> Self {
        Self { samples }
    }

    /// Samples `curve` at every particle's normalised depth.
    pub fn from_rates(topology: &Topology, curve: impl Fn(f32) -> CurveSample) -> Self {
        Self {
            samples: (0..topology.point_count())
                .map(|index| curve(topology.rate(index)))
                .collect(),
        }
    }

    pub fn sample(&self, index: usize) -> CurveSample {
        self.samples.get(index).copied().unwrap_or_default()
    }
}

/// Owns one simulated hierarchy: builds its topology, bakes the particles,
/// runs the settle delay and issues one step per update.
pub struct DynamicsController {
    pub settings: ControllerSettings,
    root: Transform,
    hierarchy: JointHierarchy,
    topology: Topology,
    curves: PointCurves,
    points: Vec<Point>,
    colliders: Vec<SharedCollider>,
    grabbers: Vec<SharedGrabber>,
    job: DynamicsJob,
    delay: f32,
    wind_time: f32,
}

impl DynamicsController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            root: Transform::default(),
            hierarchy: JointHierarchy::new(),
            topology: Topology::default(),
            curves: PointCurves::default(),
            points: Vec::new(),
            colliders: Vec::new(),
            grabbers: Vec::new(),
            job: DynamicsJob::new(),
            delay: 0.0,
            wind_time: 0.0,
        }
    }

    pub fn set_hierarchy(&mut self, root: Transform, hierarchy: JointHierarchy) {
        self.root = root;
        self.hierarchy = hierarchy;
    }

    pub fn set_curves(&mut self, curves: PointCurves) {
        self.curves = curves;
    }

    pub fn set_colliders(&mut self, colliders: Vec<SharedCollider>) {
        self.colliders = colliders.clone();
        self.job.set_colliders(colliders);
    }

    pub fn add_collider(&mut self, collider: SharedCollider) {
        self.colliders.push(collider);
        self.job.set_colliders(self.colliders.clone());
    }

    pub fn set_grabbers(&mut self, grabbers: Vec<SharedGrabber>) {
        self.grabbers = grabbers.clone();
        self.job.set_grabbers(grabbers);
    }

    /// Moves the frame the rest pose is expressed in.
    pub fn set_root_transform(&mut self, root: Transform) {
        self.root = root;
        self.job.set_root_transform(root);
    }

    /// Rebuilds the topology, re-bakes every particle and re-initializes the
    /// job. Simulation resumes after the settle delay.
    pub fn rebuild(&mut self) -> Result<()> {
        validate_hierarchy(&self.hierarchy)?;

        self.topology = build_topology(&self.hierarchy, &self.settings.topology);
        self.points = self.bake_points();
        let bones = self.bind_bones();

        self.job.set_parallel(self.settings.parallel);
        self.job.initialize(
            self.root,
            &self.points,
            bones,
            &self.topology,
            self.colliders.clone(),
            self.grabbers.clone(),
        )?;

        self.delay = self.settings.settle_delay;
        self.wind_time = 0.0;
        Ok(())
    }

    fn bake_points(&self) -> Vec<Point> {
        let nodes = self.hierarchy.nodes();
        let settings = &self.settings;

        self.topology
            .layout
            .iter()
            .enumerate()
            .map(|(index, layout)| {
                let node = &nodes[index];
                let sample = self.curves.sample(index);

                let strength = sample.family.map(|kind, family| {
                    let mut strength = *family;
                    if settings.all_shrink[kind] {
                        strength.shrink *= sample.all_shrink;
                    }
                    if settings.all_stretch[kind] {
                        strength.stretch *= sample.all_stretch;
                    }
                    strength
                });

                let previous_direction = layout
                    .parent
                    .map_or(Vec3::ZERO, |parent| node.position - nodes[parent].position);

                Point {
                    parent: layout.parent,
                    child: layout.child,
                    weight: if layout.fixed { 0.0 } else { 1.0 },
                    mass: node.mass * sample.mass_scale,
                    resistance: 1.0 - sample.resistance,
                    friction_scale: sample.friction_scale,
                    strength,
                    gravity: settings.gravity * sample.gravity_scale,
                    bone_axis: layout.bone_axis,
                    initial_position: self.root.inverse_transform_point(node.position),
                    local_rotation: (self.parent_rotation(index).inverse() * node.rotation).normalize(),
                    position: node.position,
                    old_position: node.position,
                    previous_direction,
                }
            })
            .collect()
    }

    fn bind_bones(&self) -> Vec<BoneTransform> {
        self.hierarchy
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| BoneTransform::new(node.position, node.rotation, self.parent_rotation(index)))
            .collect()
    }

    fn parent_rotation(&self, index: usize) -> Quat {
        let nodes = self.hierarchy.nodes();
        match self.topology.layout.get(index).and_then(|layout| layout.parent) {
            Some(parent) => nodes[parent].rotation,
            None => nodes[index].anchor_rotation,
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// While the settle delay runs nothing is simulated; when it expires the
    /// particles are re-seeded from the live bones before stepping resumes.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        if !self.job.is_initialized() {
            return Err(DynamicsError::NotInitialized);
        }

        if self.delay > 0.0 {
            self.delay -= dt;
            if self.delay > 0.0 {
                return Ok(());
            }
            self.job.reset()?;
        }

        let wind_power = self.wind_time.sin() * 0.5 + 0.5;
        self.wind_time += dt * self.settings.wind_frequency;

        let params = StepParams {
            dt,
            wind: self.settings.wind_force * wind_power,
            relaxation: self.settings.relaxation,
            spring_k: self.settings.spring_k,
            floor: self.settings.floor,
            collide_with_colliders: self.settings.collide_with_colliders,
        };
        self.job.execute(&params)
    }

    /// Snaps back to the rest pose and holds still for `delay` seconds.
    pub fn reset_physics(&mut self, delay: f32) -> Result<()> {
        if self.settings.ignore_physics_reset {
            return Ok(());
        }
        self.job.restore()?;
        self.delay = delay;
        Ok(())
    }

    /// Adopts the current particle positions as the new rest lengths.
    pub fn update_joint_distance(&mut self) -> Result<()> {
        self.job.recompute_rest_lengths()?;
        let positions = self.job.positions()?;
        self.topology.recompute_lengths(&positions);
        Ok(())
    }

    pub fn wait_for_complete(&mut self) {
        self.job.wait_for_complete();
    }

    pub fn bones(&mut self) -> Result<&[BoneTransform]> {
        self.job.bones()
    }

    pub fn bones_mut(&mut self) -> Result<&mut [BoneTransform]> {
        self.job.bones_mut()
    }

    pub fn positions(&mut self) -> Result<Vec<Vec3>> {
        self.job.positions()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn hierarchy(&self) -> &JointHierarchy {
        &self.hierarchy
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn job(&self) -> &DynamicsJob {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut DynamicsJob {
        &mut self.job
    }

    /// Remaining settle time in seconds.
    pub fn delay(&self) -> f32 {
        self.delay.max(0.0)
    }

    pub fn family_constraint_count(&self, kind: ConstraintType) -> usize {
        self.topology.families[kind].len()
    }
}

fn validate_hierarchy(hierarchy: &JointHierarchy) -> Result<()> {
    let count = hierarchy.len();
    if let Some(&index) = hierarchy.roots().iter().find(|&&root| root >= count) {
        return Err(DynamicsError::InvalidRoot { index, count });
    }
    for (index, node) in hierarchy.nodes().iter().enumerate() {
        if let Some(&target) = node.children.iter().find(|&&child| child >= count) {
            return Err(DynamicsError::InvalidLink {
                index,
                target,
                count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fill_missing_fields_from_defaults() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.relaxation, 3);
        assert_eq!(settings.gravity, Vec3::new(0.0, -10.0, 0.0));
        assert!(!settings.all_shrink[ConstraintType::StructuralVertical]);
        assert!(settings.all_shrink[ConstraintType::Shear]);
    }

    #[test]
    fn missing_curve_entries_use_stock_values() {
        let curves = PointCurves::new(vec![CurveSample {
            mass_scale: 2.0,
            ..CurveSample::default()
        }]);
        assert_eq!(curves.sample(0).mass_scale, 2.0);
        assert_eq!(curves.sample(5), CurveSample::default());
    }

    #[test]
    fn update_before_rebuild_fails() {
        let mut controller = DynamicsController::new(ControllerSettings::default());
        assert_eq!(controller.update(0.016), Err(DynamicsError::NotInitialized));
    }
}
