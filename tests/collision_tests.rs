use approx::assert_abs_diff_eq;
use joint_dynamics::{
    collision::{pushout_point, segment_capsule, segment_sphere},
    dynamics::{collide_points, ExecutionMode},
    *,
};

fn free_state(position: Vec3) -> PointState {
    PointState {
        position,
        old_position: position,
        previous_direction: Vec3::ZERO,
        grab: None,
        friction: 0.0,
    }
}

#[test]
fn floor_clamps_to_exact_height() {
    let mut states = vec![free_state(Vec3::new(0.3, -0.5, 1.0)), free_state(Vec3::new(0.0, 2.0, 0.0))];
    collide_points(&mut states, &[], FloorSettings::at(0.02), false, ExecutionMode::Serial);

    assert_eq!(states[0].position.y, 0.02);
    assert_eq!(states[0].position.x, 0.3);
    assert_eq!(states[0].old_position.y, -0.5, "history keeps the pre-clamp value");
    assert_eq!(states[1].position.y, 2.0);
}

#[test]
fn disabled_floor_leaves_points_alone() {
    let mut states = vec![free_state(Vec3::new(0.0, -3.0, 0.0))];
    collide_points(&mut states, &[], FloorSettings::disabled(), false, ExecutionMode::Serial);
    assert_eq!(states[0].position.y, -3.0);
}

#[test]
fn sphere_pushout_lands_on_the_surface() {
    let center = Vec3::new(1.0, 2.0, -1.0);
    let direction = Vec3::new(1.0, 1.0, 0.0).normalize();
    let sphere = ColliderPose::sphere(center, 0.5, 0.0);
    let mut states = vec![free_state(center + direction * 0.2)];

    collide_points(&mut states, &[sphere], FloorSettings::disabled(), true, ExecutionMode::Serial);

    let offset = states[0].position - center;
    assert_abs_diff_eq!(offset.length(), 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(offset.normalize().dot(direction), 1.0, epsilon = 1e-5);
}

#[test]
fn collider_pushout_needs_the_collider_flag() {
    let sphere = ColliderPose::sphere(Vec3::ZERO, 1.0, 0.0);
    let mut states = vec![free_state(Vec3::new(0.2, 0.5, 0.0))];
    collide_points(&mut states, &[sphere], FloorSettings::at(-10.0), false, ExecutionMode::Serial);
    assert_eq!(states[0].position, Vec3::new(0.2, 0.5, 0.0));
}

#[test]
fn capsule_pushout_from_side_and_caps() {
    let collider = Collider::builder()
        .capsule(0.25, 2.0)
        .position(Vec3::new(0.0, 1.0, 0.0))
        .build();
    let capsule = ColliderPose::from_collider(&collider);

    let mut side = Vec3::new(0.1, 1.5, 0.0);
    assert!(pushout_point(&capsule, &mut side));
    assert_abs_diff_eq!(side.x, 0.25, epsilon = 1e-5);
    assert_abs_diff_eq!(side.y, 1.5, epsilon = 1e-5);

    let mut above = Vec3::new(0.0, 2.1, 0.0);
    assert!(pushout_point(&capsule, &mut above));
    assert_abs_diff_eq!(above.y, 2.25, epsilon = 1e-5);

    let mut outside = Vec3::new(1.0, 1.0, 0.0);
    assert!(!pushout_point(&capsule, &mut outside));
}

#[test]
fn segment_hits_sphere_between_its_endpoints() {
    let hit = segment_sphere(
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.25, -0.1, 0.0),
        0.3,
    )
    .expect("segment passes through the sphere");
    assert_abs_diff_eq!(hit.point_on_segment.x, 0.25, epsilon = 1e-6);

    assert!(segment_sphere(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, 0.3).is_none());
}

#[test]
fn segment_crossing_capsule_is_detected() {
    let capsule = ColliderPose::capsule(Vec3::ZERO, Vec3::Y, 0.3, 2.0, 0.5);
    let crossing = segment_capsule(Vec3::new(-1.0, 0.2, 0.1), Vec3::new(1.0, 0.2, 0.1), &capsule);
    assert!(crossing.is_some());

    let clear = segment_capsule(Vec3::new(-1.0, 0.2, 1.0), Vec3::new(1.0, 0.2, 1.0), &capsule);
    assert!(clear.is_none());
}

#[test]
fn colliding_links_pick_up_friction_from_below() {
    let points = vec![
        Point {
            position: Vec3::new(-1.0, 0.0, 0.0),
            old_position: Vec3::new(-1.0, 0.0, 0.0),
            ..Point::default()
        },
        Point {
            position: Vec3::new(1.0, 0.0, 0.0),
            old_position: Vec3::new(1.0, 0.0, 0.0),
            ..Point::default()
        },
    ];
    let mut particles = ParticleStore::from_points(&points).unwrap();
    particles.state[0].friction = 0.0;
    particles.state[1].friction = 0.0;

    let link = Constraint::new(ConstraintType::StructuralHorizontal, 0, 1, 2.0).with_collision(true);
    let batches = build_batches(&[link]);
    let sphere = ColliderPose::sphere(Vec3::new(0.0, -0.1, 0.0), 0.3, 0.8);

    let metrics = ConstraintSolver::new(1.0).relax(&mut particles, &batches, &[sphere], 1);

    assert_eq!(metrics.collider_hits, 1);
    assert_abs_diff_eq!(particles.position(0).y, 0.2, epsilon = 1e-5);
    assert_abs_diff_eq!(particles.position(1).y, 0.2, epsilon = 1e-5);
    assert_abs_diff_eq!(particles.state[0].friction, 0.8, epsilon = 1e-5);
    assert_abs_diff_eq!(particles.state[1].friction, 0.8, epsilon = 1e-5);
}

#[test]
fn live_collider_moves_are_seen_by_the_next_step() {
    let mut hierarchy = JointHierarchy::new();
    hierarchy.add_chain(&[Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 2.0, 0.0)], 1.0);

    let collider = Collider::builder().sphere(0.5).position(Vec3::new(5.0, 0.0, 0.0)).build().into_shared();

    let mut controller = DynamicsController::new(ControllerSettings {
        gravity: Vec3::ZERO,
        settle_delay: 0.0,
        collide_with_colliders: true,
        ..ControllerSettings::default()
    });
    controller.set_hierarchy(Transform::default(), hierarchy);
    controller.set_colliders(vec![collider.clone()]);
    controller.rebuild().unwrap();

    controller.update(1.0 / 60.0).unwrap();
    assert_eq!(controller.positions().unwrap()[1], Vec3::new(0.0, 2.0, 0.0));

    collider.write().transform.position = Vec3::new(0.2, 2.0, 0.0);
    controller.update(1.0 / 60.0).unwrap();
    let tip = controller.positions().unwrap()[1];
    assert!(tip.distance(Vec3::new(0.2, 2.0, 0.0)) >= 0.5 - 1e-4, "tip inside collider: {tip:?}");
}
