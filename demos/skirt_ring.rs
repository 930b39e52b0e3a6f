use joint_dynamics::*;

const STRANDS: usize = 12;
const JOINTS: usize = 6;

fn main() -> Result<()> {
    let mut hierarchy = JointHierarchy::new();
    for s in 0..STRANDS {
        let angle = s as f32 / STRANDS as f32 * std::f32::consts::TAU;
        let out = Vec3::new(angle.cos(), 0.0, angle.sin());
        let joints: Vec<Vec3> = (0..JOINTS)
            .map(|i| out * (0.25 + 0.06 * i as f32) + Vec3::new(0.0, 1.0 - 0.12 * i as f32, 0.0))
            .collect();
        hierarchy.add_chain(&joints, 1.0);
    }

    let mut controller = DynamicsController::new(ControllerSettings {
        collide_with_colliders: true,
        topology: TopologyOptions {
            wrap_horizontal: true,
            enabled: FamilyMap::splat(true),
            ..TopologyOptions::default()
        },
        ..ControllerSettings::default()
    });
    controller.set_hierarchy(Transform::from_position(Vec3::ZERO), hierarchy);

    let leg = Collider::builder()
        .capsule(0.12, 0.6)
        .position(Vec3::new(0.1, 0.5, 0.0))
        .friction(0.4)
        .build()
        .into_shared();
    controller.add_collider(leg.clone());
    controller.rebuild()?;

    for kind in ConstraintType::ALL {
        println!("{kind:?}: {} links", controller.family_constraint_count(kind));
    }

    for frame in 0..180 {
        // Swing the leg forward and back.
        let phase = frame as f32 / 60.0 * std::f32::consts::PI;
        leg.write().transform.position = Vec3::new(0.1, 0.5, 0.3 * phase.sin());
        controller.update(1.0 / 60.0)?;

        if frame % 60 == 59 {
            let lowest = controller
                .positions()?
                .into_iter()
                .map(|p| p.y)
                .fold(f32::INFINITY, f32::min);
            println!("frame {:>3}: lowest hem point at y = {lowest:.3}", frame + 1);
        }
    }

    let profiler = controller.job_mut().profiler()?;
    profiler.report();
    println!(
        "last step: {} points, {} constraints in {} batches, {:?}",
        profiler.point_count, profiler.constraint_count, profiler.batch_count, profiler.total_step_time
    );
    Ok(())
}
