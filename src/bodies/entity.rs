use crate::bodies::entity_flags::EntityFlags;
use crate::bodies::{ActionState, AgentProperties, EntityState, Material};
use crate::collision::{CollisionGroup, CollisionMask};
use crate::core::EntityId;
use crate::error::PhysicsError;
use crate::math::Vector2;
use crate::shapes::Shape;
use crate::Result;

/// Kind-specific part of an entity. Only agents carry control state.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Agent {
        properties: AgentProperties,
        action: ActionState,
    },
    Landmark,
}

/// A physical object in the world, agent or landmark
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    id: EntityId,
    kind: EntityKind,
    shape: Shape,
    material: Material,
    mass: f32,
    flags: EntityFlags,

    /// Optional cap on the velocity norm
    max_speed: Option<f32>,

    /// Optional per-axis velocity clamp
    v_range: Option<f32>,

    /// Gravity replacing the world's for this entity
    gravity: Option<Vector2>,

    collision_group: CollisionGroup,
    collision_mask: CollisionMask,

    state: EntityState,
}

impl Entity {
    fn new(name: impl Into<String>, kind: EntityKind, flags: EntityFlags) -> Self {
        Self {
            name: name.into(),
            id: EntityId::UNASSIGNED,
            kind,
            shape: Shape::default(),
            material: Material::default(),
            mass: 1.0,
            flags,
            max_speed: None,
            v_range: None,
            gravity: None,
            collision_group: CollisionGroup::DEFAULT,
            collision_mask: CollisionMask::ALL,
            state: EntityState::new(0, 2, None),
        }
    }

    /// Creates a movable, rotatable, colliding agent with default control
    pub fn new_agent(name: impl Into<String>) -> Self {
        Self::new_agent_with(name, AgentProperties::default())
    }

    /// Creates a movable, rotatable, colliding agent with the given control descriptor
    pub fn new_agent_with(name: impl Into<String>, properties: AgentProperties) -> Self {
        Self::new(
            name,
            EntityKind::Agent {
                properties,
                action: ActionState::new(0, 2),
            },
            EntityFlags::MOVABLE | EntityFlags::ROTATABLE | EntityFlags::COLLIDE,
        )
    }

    /// Creates a static, colliding landmark
    pub fn new_landmark(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Landmark, EntityFlags::COLLIDE)
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.material.elasticity = elasticity;
        self
    }

    pub fn with_drag(mut self, linear: f32) -> Self {
        self.material.linear_drag = Some(linear);
        self
    }

    pub fn with_angular_drag(mut self, angular: f32) -> Self {
        self.material.angular_drag = Some(angular);
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    pub fn with_v_range(mut self, v_range: f32) -> Self {
        self.v_range = Some(v_range);
        self
    }

    pub fn with_gravity(mut self, gravity: Vector2) -> Self {
        self.gravity = Some(gravity);
        self
    }

    pub fn with_collision_group(mut self, group: CollisionGroup, mask: CollisionMask) -> Self {
        self.collision_group = group;
        self.collision_mask = mask;
        self
    }

    pub fn movable(self, movable: bool) -> Self {
        self.with_flag(EntityFlags::MOVABLE, movable)
    }

    pub fn rotatable(self, rotatable: bool) -> Self {
        self.with_flag(EntityFlags::ROTATABLE, rotatable)
    }

    pub fn collide(self, collide: bool) -> Self {
        self.with_flag(EntityFlags::COLLIDE, collide)
    }

    fn with_flag(mut self, flag: EntityFlags, on: bool) -> Self {
        self.flags.set(flag, on);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the entity in its world; unassigned until added
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn is_agent(&self) -> bool {
        matches!(self.kind, EntityKind::Agent { .. })
    }

    /// Control descriptor, for agents
    pub fn agent_properties(&self) -> Option<&AgentProperties> {
        match &self.kind {
            EntityKind::Agent { properties, .. } => Some(properties),
            EntityKind::Landmark => None,
        }
    }

    /// Processed control of the current step, for agents
    pub fn action(&self) -> Option<&ActionState> {
        match &self.kind {
            EntityKind::Agent { action, .. } => Some(action),
            EntityKind::Landmark => None,
        }
    }

    pub(crate) fn action_mut(&mut self) -> Option<&mut ActionState> {
        match &mut self.kind {
            EntityKind::Agent { action, .. } => Some(action),
            EntityKind::Landmark => None,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn elasticity(&self) -> f32 {
        self.material.elasticity
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn moment_of_inertia(&self) -> f32 {
        self.shape.moment_of_inertia(self.mass)
    }

    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    pub fn is_movable(&self) -> bool {
        self.flags.contains(EntityFlags::MOVABLE)
    }

    pub fn is_rotatable(&self) -> bool {
        self.flags.contains(EntityFlags::ROTATABLE)
    }

    pub fn is_collidable(&self) -> bool {
        self.flags.contains(EntityFlags::COLLIDE)
    }

    pub fn max_speed(&self) -> Option<f32> {
        self.max_speed
    }

    pub fn v_range(&self) -> Option<f32> {
        self.v_range
    }

    pub fn gravity(&self) -> Option<Vector2> {
        self.gravity
    }

    pub fn collision_group(&self) -> CollisionGroup {
        self.collision_group
    }

    pub fn collision_mask(&self) -> CollisionMask {
        self.collision_mask
    }

    /// Current batched state
    pub fn state(&self) -> &EntityState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    /// Checks the entity's parameters against the world invariants
    pub(crate) fn validate(&self) -> Result<()> {
        let name = self.name.as_str();
        if name.is_empty() {
            return Err(PhysicsError::Configuration("entity names must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.material.elasticity) {
            return Err(PhysicsError::Configuration(format!(
                "entity '{}' has elasticity {} outside [0, 1]",
                name, self.material.elasticity
            )));
        }
        if self.is_movable() && !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(PhysicsError::Configuration(format!(
                "movable entity '{}' needs a positive mass, got {}",
                name, self.mass
            )));
        }
        let drags = [self.material.linear_drag, self.material.angular_drag];
        if drags.iter().flatten().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(PhysicsError::Configuration(format!(
                "entity '{}' has a negative drag override",
                name
            )));
        }
        let limits = [self.max_speed, self.v_range];
        if limits.iter().flatten().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(PhysicsError::Configuration(format!(
                "entity '{}' has a non-positive speed limit",
                name
            )));
        }
        if let Some(g) = self.gravity {
            if !g.iter().all(|v| v.is_finite()) {
                return Err(PhysicsError::Configuration(format!(
                    "entity '{}' has a non-finite gravity override",
                    name
                )));
            }
        }
        self.shape.validate(name)?;
        if let Some(properties) = self.agent_properties() {
            properties.validate(name)?;
        }
        Ok(())
    }

    /// Binds the entity to a world: assigns its id and allocates zeroed
    /// state arrays with `batch_dim` rows.
    pub(crate) fn attach(&mut self, id: EntityId, batch_dim: usize, dim_p: usize, dim_c: usize) {
        self.id = id;
        let comm = match &self.kind {
            EntityKind::Agent { properties, .. } if !properties.silent && dim_c > 0 => Some(dim_c),
            _ => None,
        };
        self.state = EntityState::new(batch_dim, dim_p, comm);
        if let Some(action) = self.action_mut() {
            *action = ActionState::new(batch_dim, dim_p);
        }
    }

    /// Zeroes state and control for all environments or one
    pub(crate) fn reset(&mut self, env_index: Option<usize>) {
        self.state.reset(env_index);
        if let Some(action) = self.action_mut() {
            action.reset(env_index);
        }
    }
}
