use nalgebra::{DMatrix, DVector};

use crate::bodies::Entity;
use crate::core::WorldConfig;
use crate::forces::{ContactForce, ControlForce, DragForce, GravityForce};
use crate::math::{BatchScalar, BatchVector};

/// Base trait for force generators.
///
/// A generator is a pure function of the current entity states: it reads
/// `entities` and adds its contribution to the accumulator, nothing else.
pub trait ForceGenerator: Send + Sync + std::fmt::Debug {
    /// Returns the type name of the force generator
    fn generator_type(&self) -> &'static str;

    /// Adds this generator's force and torque contributions
    fn apply_forces(&self, entities: &[Entity], config: &WorldConfig, forces: &mut ForceAccumulator);
}

/// Net force (`B×dim_p`) and torque (`B`) per entity, indexed like the entity list
#[derive(Debug, Clone, PartialEq)]
pub struct ForceAccumulator {
    force: Vec<BatchVector>,
    torque: Vec<BatchScalar>,
}

impl ForceAccumulator {
    pub fn new(n_entities: usize, batch_dim: usize, dim_p: usize) -> Self {
        Self {
            force: vec![DMatrix::zeros(batch_dim, dim_p); n_entities],
            torque: vec![DVector::zeros(batch_dim); n_entities],
        }
    }

    pub fn add_force(&mut self, entity: usize, force: &BatchVector) {
        self.force[entity] += force;
    }

    pub fn add_torque(&mut self, entity: usize, torque: &BatchScalar) {
        self.torque[entity] += torque;
    }

    /// Adds a force to a single environment row
    pub fn add_force_at(&mut self, entity: usize, env: usize, fx: f32, fy: f32) {
        self.force[entity][(env, 0)] += fx;
        self.force[entity][(env, 1)] += fy;
    }

    pub fn force(&self, entity: usize) -> &BatchVector {
        &self.force[entity]
    }

    pub fn torque(&self, entity: usize) -> &BatchScalar {
        &self.torque[entity]
    }

    pub fn len(&self) -> usize {
        self.force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }
}

/// Ordered set of force generators evaluated every substep
#[derive(Debug, Default)]
pub struct ForceRegistry {
    generators: Vec<Box<dyn ForceGenerator>>,
}

impl ForceRegistry {
    /// Creates a new empty force registry
    pub fn new() -> Self {
        Self {
            generators: Vec::new(),
        }
    }

    /// Control, drag, gravity and contact, in that order
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_generator(Box::new(ControlForce));
        registry.add_generator(Box::new(DragForce));
        registry.add_generator(Box::new(GravityForce));
        registry.add_generator(Box::new(ContactForce::default()));
        registry
    }

    /// Adds a force generator to the registry
    pub fn add_generator(&mut self, generator: Box<dyn ForceGenerator>) {
        self.generators.push(generator);
    }

    /// Returns the number of generators in the registry
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Names of the registered generators, in evaluation order
    pub fn generator_types(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.generator_type()).collect()
    }

    /// Evaluates all generators against the current state
    pub fn apply_forces(&self, entities: &[Entity], config: &WorldConfig, forces: &mut ForceAccumulator) {
        for generator in &self.generators {
            generator.apply_forces(entities, config, forces);
        }
    }
}
