use joint_dynamics::*;

fn main() -> Result<()> {
    let mut hierarchy = JointHierarchy::new();
    let joints: Vec<Vec3> = (0..8).map(|i| Vec3::new(0.0, 1.8 - 0.08 * i as f32, 0.0)).collect();
    hierarchy.add_chain(&joints, 1.0);

    let mut controller = DynamicsController::new(ControllerSettings {
        wind_force: Vec3::new(3.0, 0.0, 0.0),
        ..ControllerSettings::default()
    });
    controller.set_hierarchy(Transform::default(), hierarchy);
    controller.rebuild()?;

    let topology = controller.topology().clone();
    controller.set_curves(PointCurves::from_rates(&topology, |rate| CurveSample {
        resistance: 0.05 + 0.1 * rate,
        gravity_scale: 1.0 - 0.5 * rate,
        ..CurveSample::default()
    }));
    controller.rebuild()?;

    for frame in 0..120 {
        controller.update(1.0 / 60.0)?;
        if frame % 30 == 29 {
            let tip = controller.positions()?[7];
            println!("frame {:>3}: tip at {:?}", frame + 1, tip);
        }
    }
    Ok(())
}

