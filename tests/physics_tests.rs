use approx::assert_relative_eq;
use multi_agent_phys::{
    collision::ContactModel,
    constraints::{Boundary, BoundaryPolicy},
    error::PhysicsError,
    forces::{ForceAccumulator, ForceGenerator},
    math::Vector2,
    shapes::Shape,
    ActionSpace, Actions, AgentProperties, Device, Entity, EntityId, World, WorldConfig,
};
use nalgebra::{DMatrix, DVector};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn frictionless() -> WorldConfig {
    WorldConfig {
        linear_damping: 0.0,
        angular_damping: 0.0,
        seed: Some(0),
        ..Default::default()
    }
}

fn action(values: &[f32]) -> DMatrix<f32> {
    DMatrix::from_row_slice(1, values.len(), values)
}

fn single(name: &str, values: &[f32]) -> Actions {
    let mut actions = Actions::new();
    actions.insert(name.to_string(), action(values));
    actions
}

#[test]
fn test_gravity_integration() {
    init_logger();
    let config = WorldConfig {
        gravity: Vector2::new(0.0, -9.81),
        ..frictionless()
    };
    let mut world = World::new(1, Device::Cpu, config).unwrap();
    let id = world.add_agent(Entity::new_agent("a").collide(false)).unwrap();
    world.reset_world_at(None).unwrap();

    let dt = 0.1;
    let mut expected_vel = 0.0;
    let mut expected_pos = 0.0;
    for _ in 0..10 {
        world.step(&Actions::new()).unwrap();
        expected_vel -= 9.81 * dt;
        expected_pos += expected_vel * dt;
    }

    let state = world.state(id).unwrap();
    assert_relative_eq!(state.vel()[(0, 1)], expected_vel, epsilon = 1e-4);
    assert_relative_eq!(state.pos()[(0, 1)], expected_pos, epsilon = 1e-4);
    assert_eq!(state.pos()[(0, 0)], 0.0);
    assert_eq!(world.steps_taken(), 10);
}

#[test]
fn test_gravity_skips_immovable_entities() {
    let config = WorldConfig {
        gravity: Vector2::new(0.0, -9.81),
        ..frictionless()
    };
    let mut world = World::new(1, Device::Cpu, config).unwrap();
    let id = world.add_landmark(Entity::new_landmark("rock").collide(false)).unwrap();
    world.reset_world_at(None).unwrap();
    world.step(&Actions::new()).unwrap();
    assert_eq!(world.state(id).unwrap().pos()[(0, 1)], 0.0);
}

#[test]
fn test_drag_slows_entities() {
    let mut world = World::new(1, Device::Cpu, WorldConfig::default()).unwrap();
    let id = world.add_agent(Entity::new_agent("a").collide(false)).unwrap();
    let slippery = world
        .add_agent(Entity::new_agent("b").collide(false).with_drag(0.0))
        .unwrap();
    world.reset_world_at(None).unwrap();
    world.set_vel(id, &action(&[1.0, 0.0]), None).unwrap();
    world.set_vel(slippery, &action(&[1.0, 0.0]), None).unwrap();

    world.step(&Actions::new()).unwrap();

    assert_relative_eq!(world.state(id).unwrap().vel()[(0, 0)], 0.975, epsilon = 1e-6);
    assert_relative_eq!(world.state(slippery).unwrap().vel()[(0, 0)], 1.0, epsilon = 1e-6);
}

#[test]
fn test_control_force_moves_agent() {
    let mut world = World::new(1, Device::Cpu, frictionless()).unwrap();
    let props = AgentProperties { u_multiplier: 2.0, ..Default::default() };
    let id = world
        .add_agent(Entity::new_agent_with("a", props).with_mass(2.0).collide(false))
        .unwrap();
    world.reset_world_at(None).unwrap();

    world.step(&single("a", &[1.0, -0.5])).unwrap();

    let state = world.state(id).unwrap();
    assert_relative_eq!(state.vel()[(0, 0)], 0.1, epsilon = 1e-6);
    assert_relative_eq!(state.vel()[(0, 1)], -0.05, epsilon = 1e-6);
    assert_relative_eq!(state.pos()[(0, 0)], 0.01, epsilon = 1e-6);
    let applied = world.entity(id).unwrap().action().unwrap().force().clone();
    assert_eq!(applied, action(&[2.0, -1.0]));
}

#[test]
fn test_discrete_actions_map_to_signed_range() {
    let mut world = World::new(1, Device::Cpu, frictionless()).unwrap();
    let props = AgentProperties {
        action_space: ActionSpace::Discrete,
        u_range: 0.5,
        ..Default::default()
    };
    let id = world
        .add_agent(Entity::new_agent_with("a", props).collide(false))
        .unwrap();
    world.reset_world_at(None).unwrap();

    world.step(&single("a", &[2.0, 1.0])).unwrap();

    let force = world.entity(id).unwrap().action().unwrap().force().clone();
    assert_eq!(force, action(&[0.5, -0.5]));
}

#[test]
fn test_rotational_control() {
    let mut world = World::new(1, Device::Cpu, frictionless()).unwrap();
    let props = AgentProperties { u_rot_range: 1.0, ..Default::default() };
    let id = world
        .add_agent(Entity::new_agent_with("a", props).collide(false))
        .unwrap();
    world.reset_world_at(None).unwrap();

    assert!(world.step(&single("a", &[0.0, 0.0])).is_err());
    world.step(&single("a", &[0.0, 0.0, 3.0])).unwrap();

    let state = world.state(id).unwrap();
    assert!(state.ang_vel()[0] > 0.0);
    assert!(state.rot()[0] > 0.0);
    assert_eq!(world.entity(id).unwrap().action().unwrap().torque()[0], 1.0);
}

#[test]
fn test_overlapping_entities_are_pushed_apart() {
    init_logger();
    let mut world = World::new(1, Device::Cpu, frictionless()).unwrap();
    let a = world.add_agent(Entity::new_agent("a")).unwrap();
    let b = world.add_agent(Entity::new_agent("b")).unwrap();
    world.reset_world_at(None).unwrap();
    world.set_pos(b, &action(&[0.05, 0.0]), None).unwrap();

    assert_eq!(world.is_overlapping(a, b).unwrap(), vec![true]);
    assert_relative_eq!(world.distance(a, b).unwrap()[0], -0.05, epsilon = 1e-6);

    world.step(&Actions::new()).unwrap();

    let va = world.state(a).unwrap().vel()[(0, 0)];
    let vb = world.state(b).unwrap().vel()[(0, 0)];
    assert!(va < 0.0);
    assert!(vb > 0.0);
    assert_relative_eq!(va, -vb, epsilon = 1e-6);
}

#[test]
fn test_non_colliding_entities_pass_through() {
    let mut world = World::new(1, Device::Cpu, frictionless()).unwrap();
    let a = world.add_agent(Entity::new_agent("a").collide(false)).unwrap();
    let b = world.add_agent(Entity::new_agent("b")).unwrap();
    world.reset_world_at(None).unwrap();
    world.set_pos(b, &action(&[0.05, 0.0]), None).unwrap();

    world.step(&Actions::new()).unwrap();

    assert_eq!(world.state(a).unwrap().vel()[(0, 0)], 0.0);
    assert_eq!(world.state(b).unwrap().vel()[(0, 0)], 0.0);
}

#[test]
fn test_inelastic_contacts_push_softer() {
    let push = |elasticity: f32| {
        let mut world = World::new(1, Device::Cpu, frictionless()).unwrap();
        world
            .add_landmark(Entity::new_landmark("wall").with_shape(Shape::cuboid(0.2, 2.0)))
            .unwrap();
        let ball = world
            .add_agent(Entity::new_agent("ball").with_elasticity(elasticity))
            .unwrap();
        world.reset_world_at(None).unwrap();
        world.set_pos(ball, &action(&[0.12, 0.0]), None).unwrap();
        world.step(&Actions::new()).unwrap();
        world.state(ball).unwrap().vel()[(0, 0)]
    };

    let elastic = push(1.0);
    let inelastic = push(0.0);
    assert!(elastic > 0.0);
    assert!(inelastic > 0.0);
    assert_relative_eq!(inelastic / elastic, ContactModel::elasticity_factor(0.0, 1.0) / ContactModel::elasticity_factor(1.0, 1.0), epsilon = 1e-4);
}

#[test]
fn test_boundary_clamp_keeps_entities_inside() {
    let config = WorldConfig {
        boundary: Some(Boundary::square(1.0, BoundaryPolicy::Clamp)),
        ..frictionless()
    };
    let mut world = World::new(1, Device::Cpu, config).unwrap();
    let id = world.add_agent(Entity::new_agent("a").collide(false)).unwrap();
    world.reset_world_at(None).unwrap();
    world.set_vel(id, &action(&[20.0, -0.5]), None).unwrap();

    world.step(&Actions::new()).unwrap();

    let state = world.state(id).unwrap();
    assert_eq!(state.pos()[(0, 0)], 1.0);
    assert_eq!(state.vel()[(0, 0)], 0.0);
    assert_relative_eq!(state.vel()[(0, 1)], -0.5, epsilon = 1e-6);
}

#[test]
fn test_boundary_reflect_mirrors_position_and_velocity() {
    let config = WorldConfig {
        boundary: Some(Boundary::square(1.0, BoundaryPolicy::Reflect)),
        ..frictionless()
    };
    let mut world = World::new(1, Device::Cpu, config).unwrap();
    let id = world
        .add_agent(Entity::new_agent("a").collide(false).with_elasticity(0.5))
        .unwrap();
    world.reset_world_at(None).unwrap();
    world.set_pos(id, &action(&[0.95, 0.0]), None).unwrap();
    world.set_vel(id, &action(&[1.0, 0.0]), None).unwrap();

    world.step(&Actions::new()).unwrap();

    let state = world.state(id).unwrap();
    assert_relative_eq!(state.pos()[(0, 0)], 0.95, epsilon = 1e-5);
    assert_relative_eq!(state.vel()[(0, 0)], -0.5, epsilon = 1e-6);
}

#[test]
fn test_invalid_actions_are_rejected_before_mutation() {
    let mut world = World::new(2, Device::Cpu, frictionless()).unwrap();
    let id = world.add_agent(Entity::new_agent("a")).unwrap();
    world.add_landmark(Entity::new_landmark("l")).unwrap();
    world.reset_world_at(None).unwrap();
    world.set_vel(id, &DMatrix::from_element(2, 2, 1.0), None).unwrap();
    let before = world.state(id).unwrap().clone();

    let err = world.step(&single("ghost", &[0.0, 0.0])).unwrap_err();
    assert!(matches!(err, PhysicsError::UnknownEntity(_)));

    let mut to_landmark = Actions::new();
    to_landmark.insert("l".into(), DMatrix::zeros(2, 2));
    assert!(matches!(world.step(&to_landmark), Err(PhysicsError::UnknownEntity(_))));

    let err = world.step(&single("a", &[0.0, 0.0])).unwrap_err();
    assert!(matches!(err, PhysicsError::ShapeMismatch { .. }));

    let mut wide = Actions::new();
    wide.insert("a".into(), DMatrix::zeros(2, 3));
    assert!(matches!(world.step(&wide), Err(PhysicsError::ShapeMismatch { .. })));

    assert_eq!(world.state(id).unwrap(), &before);
    assert_eq!(world.steps_taken(), 0);
}

#[derive(Debug)]
struct Blowup;

impl ForceGenerator for Blowup {
    fn generator_type(&self) -> &'static str {
        "Blowup"
    }

    fn apply_forces(&self, _entities: &[Entity], _config: &WorldConfig, forces: &mut ForceAccumulator) {
        forces.add_force_at(0, 1, f32::INFINITY, 0.0);
    }
}

#[test]
fn test_numeric_instability_rolls_back_the_step() {
    init_logger();
    let mut world = World::new(2, Device::Cpu, frictionless()).unwrap();
    let id = world.add_agent(Entity::new_agent("a").collide(false)).unwrap();
    world.add_force_generator(Box::new(Blowup)).unwrap();
    world.reset_world_at(None).unwrap();
    world.set_pos(id, &DMatrix::from_row_slice(2, 2, &[0.1, 0.2, 0.3, 0.4]), None).unwrap();
    let before = world.state(id).unwrap().clone();

    let err = world.step(&single_batch("a", 2)).unwrap_err();

    assert_eq!(
        err,
        PhysicsError::NumericInstability { entity: "a".into(), env_index: 1 }
    );
    assert_eq!(world.state(id).unwrap(), &before);
    assert_eq!(world.steps_taken(), 0);
}

fn single_batch(name: &str, batch_dim: usize) -> Actions {
    let mut actions = Actions::new();
    actions.insert(name.to_string(), DMatrix::from_element(batch_dim, 2, 1.0));
    actions
}

#[test]
fn test_configuration_errors() {
    let bad_dt = WorldConfig { dt: 0.0, ..Default::default() };
    assert!(matches!(
        World::new(1, Device::Cpu, bad_dt),
        Err(PhysicsError::Configuration(_))
    ));
    let bad_substeps = WorldConfig { substeps: 0, ..Default::default() };
    assert!(World::new(1, Device::Cpu, bad_substeps).is_err());

    let mut world = World::new(1, Device::Cpu, WorldConfig::default()).unwrap();
    assert!(world.add_agent(Entity::new_agent("heavy").with_mass(0.0)).is_err());
    assert!(world.add_agent(Entity::new_agent("bouncy").with_elasticity(1.5)).is_err());
    assert!(world.add_agent(Entity::new_agent("")).is_err());
    assert!(matches!(
        world.reset_world_at(Some(1)),
        Err(PhysicsError::EnvIndexOutOfRange { index: 1, batch_dim: 1 })
    ));
}

#[test]
fn test_lookup_by_name_and_id() {
    let mut world = World::new(3, Device::Cuda(0), WorldConfig::default()).unwrap();
    let a = world.add_agent(Entity::new_agent("a")).unwrap();
    let l = world.add_landmark(Entity::new_landmark("l")).unwrap();

    assert_eq!(world.entity_by_name("l").unwrap().id(), l);
    assert_eq!(world.entity(a).unwrap().name(), "a");
    assert!(world.entity(EntityId::UNASSIGNED).is_err());
    assert!(matches!(world.entity_by_name("x"), Err(PhysicsError::UnknownEntity(_))));
    assert_eq!(world.agents().count(), 1);
    assert_eq!(world.landmarks().count(), 1);
    assert_eq!(world.state(a).unwrap().pos().shape(), (3, 2));
    assert_eq!(world.device().to_string(), "cuda:0");
    assert_eq!(world.dim_p(), 2);
    assert_eq!(world.substeps(), 1);
    assert_eq!(
        world.force_generators(),
        vec!["Control", "Drag", "Gravity", "Contact"]
    );
}

#[test]
fn test_communication_is_copied_unclamped() {
    let config = WorldConfig { dim_c: 3, ..frictionless() };
    let mut world = World::new(1, Device::Cpu, config).unwrap();
    let props = AgentProperties { silent: false, ..Default::default() };
    let speaker = world
        .add_agent(Entity::new_agent_with("speaker", props).collide(false))
        .unwrap();
    let mute = world.add_agent(Entity::new_agent("mute").collide(false)).unwrap();
    world.reset_world_at(None).unwrap();

    let mut actions = single("speaker", &[0.0, 0.0, 5.0, -2.0, 0.5]);
    actions.insert("mute".into(), action(&[0.0, 0.0]));
    world.step(&actions).unwrap();

    let comm = world.state(speaker).unwrap().comm().unwrap().clone();
    assert_eq!(comm, action(&[5.0, -2.0, 0.5]));
    assert!(world.state(mute).unwrap().comm().is_none());
    assert_eq!(world.state(mute).unwrap().rot(), &DVector::zeros(1));
}

#[test]
fn test_coincident_entities_separate_along_fixed_axis() {
    init_logger();
    let config = WorldConfig { min_collision_distance: 0.0, ..frictionless() };
    let mut world = World::new(1, Device::Cpu, config).unwrap();
    let a = world.add_agent(Entity::new_agent("a")).unwrap();
    let b = world.add_agent(Entity::new_agent("b")).unwrap();
    world.reset_world_at(None).unwrap();

    world.step(&Actions::new()).unwrap();

    let va = world.state(a).unwrap().vel().clone();
    let vb = world.state(b).unwrap().vel().clone();
    assert!(va[(0, 0)] > 0.0);
    assert!(vb[(0, 0)] < 0.0);
    assert_eq!(va[(0, 1)], 0.0);
    assert_eq!(vb[(0, 1)], 0.0);
}

#[test]
fn test_spin_decays_under_default_damping() {
    let mut world = World::new(1, Device::Cpu, WorldConfig::default()).unwrap();
    let props = AgentProperties { u_rot_range: 1.0, ..Default::default() };
    let id = world
        .add_agent(Entity::new_agent_with("a", props).collide(false))
        .unwrap();
    world.reset_world_at(None).unwrap();

    world.step(&single("a", &[0.0, 0.0, 0.5])).unwrap();
    let mut spin = world.state(id).unwrap().ang_vel()[0].abs();
    assert!(spin > 0.0);

    for _ in 0..50 {
        world.step(&single("a", &[0.0, 0.0, 0.0])).unwrap();
        let next = world.state(id).unwrap().ang_vel()[0].abs();
        assert!(next <= spin + 1e-6);
        spin = next;
    }
    assert!(spin < 1e-3);
    assert!(world.state(id).unwrap().rot()[0].is_finite());
}

#[test]
fn test_sphere_contacts_do_not_spin() {
    let mut world = World::new(1, Device::Cpu, WorldConfig::default()).unwrap();
    let a = world.add_agent(Entity::new_agent("a")).unwrap();
    let b = world.add_agent(Entity::new_agent("b")).unwrap();
    world.reset_world_at(None).unwrap();
    world.set_pos(b, &action(&[0.06, 0.03]), None).unwrap();

    for _ in 0..30 {
        world.step(&Actions::new()).unwrap();
    }

    for id in [a, b] {
        assert_eq!(world.state(id).unwrap().ang_vel()[0], 0.0);
        assert_eq!(world.state(id).unwrap().rot()[0], 0.0);
    }
}

#[test]
fn test_non_finite_velocity_is_not_hidden_by_velocity_range() {
    let mut world = World::new(2, Device::Cpu, frictionless()).unwrap();
    let id = world
        .add_agent(Entity::new_agent("a").collide(false).with_v_range(1.0))
        .unwrap();
    world.reset_world_at(None).unwrap();
    world.set_vel(id, &action(&[f32::NAN, 0.0]), Some(1)).unwrap();

    let err = world.step(&single_batch("a", 2)).unwrap_err();

    assert_eq!(
        err,
        PhysicsError::NumericInstability { entity: "a".into(), env_index: 1 }
    );
    assert_eq!(world.steps_taken(), 0);
}

#[test]
fn test_rotation_setters() {
    let mut world = World::new(2, Device::Cpu, frictionless()).unwrap();
    let id = world.add_agent(Entity::new_agent("a").collide(false)).unwrap();
    world.reset_world_at(None).unwrap();

    world.set_rot(id, &DVector::from_element(1, 0.5), Some(1)).unwrap();
    world.set_ang_vel(id, &DVector::from_vec(vec![1.0, -1.0]), None).unwrap();
    assert_eq!(world.state(id).unwrap().rot(), &DVector::from_vec(vec![0.0, 0.5]));

    world.step(&Actions::new()).unwrap();

    let state = world.state(id).unwrap();
    assert_relative_eq!(state.rot()[0], 0.1, epsilon = 1e-6);
    assert_relative_eq!(state.rot()[1], 0.4, epsilon = 1e-6);
    assert!(matches!(
        world.set_rot(id, &DVector::zeros(3), None),
        Err(PhysicsError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        world.set_ang_vel(id, &DVector::zeros(1), Some(2)),
        Err(PhysicsError::EnvIndexOutOfRange { index: 2, batch_dim: 2 })
    ));
}
