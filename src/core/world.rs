use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bodies::{Entity, EntityState};
use crate::collision::detect_pair;
use crate::core::{Actions, Device, EntityId, EntityStorage, WorldConfig};
use crate::error::PhysicsError;
use crate::forces::{ForceAccumulator, ForceGenerator, ForceRegistry};
use crate::integration::{Integrator, SymplecticEulerIntegrator};
use crate::math::{BatchScalar, BatchVector};
use crate::Result;

/// Position dimensionality; the engine is planar
const DIM_P: usize = 2;

/// A batch of `batch_dim` independent copies of one 2D scene.
///
/// The world owns every entity and its batched state. Scenarios mutate it
/// through [`World::reset_world_at`] and the state setters; orchestrators
/// drive it with [`World::step`].
#[derive(Debug)]
pub struct World {
    batch_dim: usize,
    device: Device,
    config: WorldConfig,
    entities: EntityStorage,
    forces: ForceRegistry,
    integrator: Box<dyn Integrator>,
    rng: ChaCha8Rng,
    initialized: bool,
    steps: u64,
}

impl World {
    /// Creates an empty world; fails if the configuration is invalid
    pub fn new(batch_dim: usize, device: Device, config: WorldConfig) -> Result<Self> {
        if batch_dim == 0 {
            return Err(PhysicsError::Configuration("batch_dim must be at least 1".into()));
        }
        config.validate()?;

        if device != Device::Cpu {
            warn!("device {} requested; state is kept in host memory", device);
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        debug!(
            "created world: batch_dim={} dt={} substeps={} device={}",
            batch_dim, config.dt, config.substeps, device
        );

        Ok(Self {
            batch_dim,
            device,
            config,
            entities: EntityStorage::new(),
            forces: ForceRegistry::with_defaults(),
            integrator: Box::new(SymplecticEulerIntegrator::new()),
            rng,
            initialized: false,
            steps: 0,
        })
    }

    /// Adds an agent and allocates its state
    pub fn add_agent(&mut self, entity: Entity) -> Result<EntityId> {
        if !entity.is_agent() {
            return Err(PhysicsError::Configuration(format!(
                "'{}' is a landmark; use add_landmark",
                entity.name()
            )));
        }
        self.add_entity(entity)
    }

    /// Adds a landmark and allocates its state
    pub fn add_landmark(&mut self, entity: Entity) -> Result<EntityId> {
        if entity.is_agent() {
            return Err(PhysicsError::Configuration(format!(
                "'{}' is an agent; use add_agent",
                entity.name()
            )));
        }
        self.add_entity(entity)
    }

    fn add_entity(&mut self, mut entity: Entity) -> Result<EntityId> {
        self.ensure_building("add entities")?;
        entity.validate()?;
        if self.entities.id_of(entity.name()).is_ok() {
            return Err(PhysicsError::Configuration(format!(
                "an entity named '{}' already exists",
                entity.name()
            )));
        }

        let id = EntityId(self.entities.len());
        entity.attach(id, self.batch_dim, DIM_P, self.config.dim_c);
        debug!("added {} '{}' as {}", if entity.is_agent() { "agent" } else { "landmark" }, entity.name(), id);
        self.entities.add(entity)
    }

    /// Appends a force generator after the default ones
    pub fn add_force_generator(&mut self, generator: Box<dyn ForceGenerator>) -> Result<()> {
        self.ensure_building("add force generators")?;
        debug!("added force generator {}", generator.generator_type());
        self.forces.add_generator(generator);
        Ok(())
    }

    /// Replaces the integrator
    pub fn set_integrator(&mut self, integrator: Box<dyn Integrator>) -> Result<()> {
        self.ensure_building("replace the integrator")?;
        self.integrator = integrator;
        Ok(())
    }

    fn ensure_building(&self, what: &str) -> Result<()> {
        if self.initialized {
            Err(PhysicsError::Configuration(format!(
                "cannot {} after the world has been reset",
                what
            )))
        } else {
            Ok(())
        }
    }

    fn check_env(&self, env_index: Option<usize>) -> Result<()> {
        match env_index {
            Some(index) if index >= self.batch_dim => Err(PhysicsError::EnvIndexOutOfRange {
                index,
                batch_dim: self.batch_dim,
            }),
            _ => Ok(()),
        }
    }

    /// Zeroes the state of every entity, for all environments or just one.
    /// Other rows are left untouched.
    pub fn reset_world_at(&mut self, env_index: Option<usize>) -> Result<()> {
        self.check_env(env_index)?;
        for entity in self.entities.iter_mut() {
            entity.reset(env_index);
        }
        self.initialized = true;
        match env_index {
            Some(i) => debug!("reset environment {}", i),
            None => debug!("reset all {} environments", self.batch_dim),
        }
        Ok(())
    }

    /// Advances every environment by one control step.
    ///
    /// The step either completes or leaves the world exactly as it was.
    pub fn step(&mut self, actions: &Actions) -> Result<()> {
        if !self.initialized {
            return Err(PhysicsError::Configuration(
                "reset_world_at must be called before step".into(),
            ));
        }
        self.validate_actions(actions)?;

        let snapshot = self.entities.clone();
        self.apply_actions(actions);

        let sub_dt = self.config.sub_dt();
        for substep in 0..self.config.substeps {
            let mut accumulator = ForceAccumulator::new(self.entities.len(), self.batch_dim, DIM_P);
            self.forces
                .apply_forces(self.entities.as_slice(), &self.config, &mut accumulator);

            for (index, entity) in self.entities.iter_mut().enumerate() {
                self.integrator
                    .integrate(entity, accumulator.force(index), accumulator.torque(index), sub_dt);
                if let Some(boundary) = &self.config.boundary {
                    boundary.enforce(entity);
                }
            }

            if let Some((entity, env_index)) = self.first_non_finite() {
                warn!(
                    "non-finite state for '{}' in environment {} at substep {}; rolling back",
                    entity, env_index, substep
                );
                self.entities = snapshot;
                return Err(PhysicsError::NumericInstability { entity, env_index });
            }
        }

        self.steps += 1;
        trace!("step {} done ({} substeps)", self.steps, self.config.substeps);
        Ok(())
    }

    fn validate_actions(&self, actions: &Actions) -> Result<()> {
        for (name, action) in actions {
            let entity = self.entity_by_name(name)?;
            let properties = entity
                .agent_properties()
                .ok_or_else(|| PhysicsError::UnknownEntity(format!("'{}' is not an agent", name)))?;
            let expected = properties.action_size(DIM_P, self.config.dim_c);
            if action.nrows() != self.batch_dim || action.ncols() != expected {
                return Err(PhysicsError::shape_mismatch(
                    format!("action of '{}'", name),
                    format!("{}x{}", self.batch_dim, expected),
                    format!("{}x{}", action.nrows(), action.ncols()),
                ));
            }
        }
        Ok(())
    }

    fn apply_actions(&mut self, actions: &Actions) {
        let dim_c = self.config.dim_c;
        let batch_dim = self.batch_dim;
        for entity in self.entities.iter_mut() {
            let Some(properties) = entity.agent_properties().cloned() else { continue };
            let (force, torque, comm) = match actions.get(entity.name()) {
                Some(raw) => properties.process_action(raw, DIM_P, dim_c),
                None => (DMatrix::zeros(batch_dim, DIM_P), DVector::zeros(batch_dim), None),
            };
            if let Some(action) = entity.action_mut() {
                action.force = force;
                action.torque = torque;
            }
            if let Some(channel) = entity.state_mut().comm.as_mut() {
                match comm {
                    Some(message) => *channel = message,
                    None => channel.fill(0.0),
                }
            }
        }
    }

    fn first_non_finite(&self) -> Option<(String, usize)> {
        self.entities
            .iter()
            .find_map(|e| e.state().first_non_finite().map(|row| (e.name().to_owned(), row)))
    }

    /// Gets an entity by id
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id)
    }

    /// Gets an entity by name
    pub fn entity_by_name(&self, name: &str) -> Result<&Entity> {
        self.entities.get(self.entities.id_of(name)?)
    }

    /// All entities in insertion order
    pub fn entities(&self) -> &[Entity] {
        self.entities.as_slice()
    }

    /// Agents in insertion order
    pub fn agents(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_agent())
    }

    /// Landmarks in insertion order
    pub fn landmarks(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| !e.is_agent())
    }

    /// Batched state of an entity
    pub fn state(&self, id: EntityId) -> Result<&EntityState> {
        Ok(self.entities.get(id)?.state())
    }

    pub fn batch_dim(&self) -> usize {
        self.batch_dim
    }

    pub fn dim_p(&self) -> usize {
        DIM_P
    }

    pub fn dim_c(&self) -> usize {
        self.config.dim_c
    }

    pub fn substeps(&self) -> u32 {
        self.config.substeps
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of completed steps since construction
    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    /// Whether `reset_world_at` has been called at least once
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Names of the force generators in evaluation order
    pub fn force_generators(&self) -> Vec<&'static str> {
        self.forces.generator_types()
    }

    pub fn integrator_name(&self) -> &str {
        self.integrator.name()
    }

    /// Overwrites the position of an entity, `1×dim_p` with an index, `B×dim_p` without
    pub fn set_pos(&mut self, id: EntityId, value: &BatchVector, env_index: Option<usize>) -> Result<()> {
        self.check_env(env_index)?;
        let entity = self.entities.get_mut(id)?;
        write_rows(&mut entity.state_mut().pos, value, env_index, "position")
    }

    /// Overwrites the velocity of an entity, `1×dim_p` with an index, `B×dim_p` without
    pub fn set_vel(&mut self, id: EntityId, value: &BatchVector, env_index: Option<usize>) -> Result<()> {
        self.check_env(env_index)?;
        let entity = self.entities.get_mut(id)?;
        write_rows(&mut entity.state_mut().vel, value, env_index, "velocity")
    }

    /// Overwrites the rotation of an entity, length 1 with an index, `B` without
    pub fn set_rot(&mut self, id: EntityId, value: &BatchScalar, env_index: Option<usize>) -> Result<()> {
        self.check_env(env_index)?;
        let entity = self.entities.get_mut(id)?;
        write_entries(&mut entity.state_mut().rot, value, env_index, "rotation")
    }

    /// Overwrites the angular velocity of an entity, length 1 with an index, `B` without
    pub fn set_ang_vel(&mut self, id: EntityId, value: &BatchScalar, env_index: Option<usize>) -> Result<()> {
        self.check_env(env_index)?;
        let entity = self.entities.get_mut(id)?;
        write_entries(&mut entity.state_mut().ang_vel, value, env_index, "angular velocity")
    }

    /// Reseeds the world RNG
    pub fn seed(&mut self, seed: u64) {
        debug!("reseeded world rng with {}", seed);
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draws a `rows×cols` matrix uniformly from `[low, high)`, row by row
    pub fn sample_uniform(&mut self, rows: usize, cols: usize, low: f32, high: f32) -> Result<BatchVector> {
        if !(low < high && low.is_finite() && high.is_finite()) {
            return Err(PhysicsError::Configuration(format!(
                "invalid sampling range [{}, {})",
                low, high
            )));
        }
        let dist = Uniform::new(low, high);
        let values: Vec<f32> = (0..rows * cols).map(|_| dist.sample(&mut self.rng)).collect();
        Ok(DMatrix::from_row_slice(rows, cols, &values))
    }

    /// Signed gap between two entities per environment; negative when overlapping
    pub fn distance(&self, a: EntityId, b: EntityId) -> Result<BatchScalar> {
        let contact = detect_pair(self.entity(a)?, self.entity(b)?, self.config.min_collision_distance);
        Ok(-contact.penetration)
    }

    /// Whether the shapes of two entities overlap, per environment
    pub fn is_overlapping(&self, a: EntityId, b: EntityId) -> Result<Vec<bool>> {
        let contact = detect_pair(self.entity(a)?, self.entity(b)?, self.config.min_collision_distance);
        Ok(contact.penetration.iter().map(|&p| p > 0.0).collect())
    }
}

fn write_rows(target: &mut BatchVector, value: &BatchVector, env_index: Option<usize>, context: &str) -> Result<()> {
    let rows = if env_index.is_some() { 1 } else { target.nrows() };
    if value.shape() != (rows, target.ncols()) {
        return Err(PhysicsError::shape_mismatch(
            context,
            format!("{}x{}", rows, target.ncols()),
            format!("{}x{}", value.nrows(), value.ncols()),
        ));
    }
    match env_index {
        Some(i) => target.row_mut(i).copy_from(&value.row(0)),
        None => target.copy_from(value),
    }
    Ok(())
}

fn write_entries(target: &mut BatchScalar, value: &BatchScalar, env_index: Option<usize>, context: &str) -> Result<()> {
    let len = if env_index.is_some() { 1 } else { target.len() };
    if value.len() != len {
        return Err(PhysicsError::shape_mismatch(context, len, value.len()));
    }
    match env_index {
        Some(i) => target[i] = value[0],
        None => target.copy_from(value),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(batch_dim: usize) -> World {
        let config = WorldConfig { seed: Some(7), ..Default::default() };
        World::new(batch_dim, Device::Cpu, config).unwrap()
    }

    #[test]
    fn zero_batch_is_rejected() {
        let err = World::new(0, Device::Cpu, WorldConfig::default()).unwrap_err();
        assert!(matches!(err, PhysicsError::Configuration(_)));
    }

    #[test]
    fn entities_cannot_be_added_after_reset() {
        let mut w = world(2);
        w.add_agent(Entity::new_agent("a")).unwrap();
        w.reset_world_at(None).unwrap();
        let err = w.add_landmark(Entity::new_landmark("l")).unwrap_err();
        assert!(matches!(err, PhysicsError::Configuration(_)));
    }

    #[test]
    fn kinds_and_names_are_checked() {
        let mut w = world(2);
        assert!(w.add_landmark(Entity::new_agent("a")).is_err());
        assert!(w.add_agent(Entity::new_landmark("l")).is_err());
        w.add_agent(Entity::new_agent("a")).unwrap();
        assert!(w.add_agent(Entity::new_agent("a")).is_err());
        assert_eq!(w.entities().len(), 1);
    }

    #[test]
    fn step_requires_reset() {
        let mut w = world(1);
        w.add_agent(Entity::new_agent("a")).unwrap();
        assert!(w.step(&Actions::new()).is_err());
    }

    #[test]
    fn setters_check_shape_and_index() {
        let mut w = world(3);
        let id = w.add_agent(Entity::new_agent("a")).unwrap();
        let row = DMatrix::from_row_slice(1, 2, &[0.5, -0.5]);
        w.set_pos(id, &row, Some(1)).unwrap();
        assert_eq!(w.state(id).unwrap().pos()[(1, 0)], 0.5);
        assert_eq!(w.state(id).unwrap().pos()[(0, 0)], 0.0);

        assert!(matches!(
            w.set_pos(id, &row, None),
            Err(PhysicsError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            w.set_pos(id, &row, Some(3)),
            Err(PhysicsError::EnvIndexOutOfRange { index: 3, batch_dim: 3 })
        ));
    }

    #[test]
    fn sampling_is_reproducible() {
        let mut w = world(1);
        w.seed(3);
        let a = w.sample_uniform(4, 2, -1.0, 1.0).unwrap();
        w.seed(3);
        let b = w.sample_uniform(4, 2, -1.0, 1.0).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&x| (-1.0..1.0).contains(&x)));
        assert!(w.sample_uniform(1, 1, 1.0, 1.0).is_err());
    }
}
