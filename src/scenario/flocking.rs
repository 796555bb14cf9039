use log::debug;
use nalgebra::DVector;
use serde::Deserialize;

use crate::bodies::{AgentProperties, Entity};
use crate::collision::{CollisionGroup, CollisionMask};
use crate::constraints::{Boundary, BoundaryPolicy};
use crate::core::{Device, EntityId, World, WorldConfig};
use crate::error::PhysicsError;
use crate::math::{row_norms, stack_columns, BatchScalar, BatchVector, EPSILON};
use crate::scenario::{
    parse_options, relative_pos, scatter, sensed_relative_pos, Scenario, ScenarioOptions,
};
use crate::shapes::Shape;
use crate::Result;

/// Options of the `flocking` scenario
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlockingConfig {
    pub n_agents: usize,
    pub n_obstacles: usize,

    /// Added to an agent's reward for every agent or obstacle it overlaps
    pub collision_reward: f32,

    pub agent_radius: f32,
    pub obstacle_radius: f32,

    /// Agents only observe neighbours and obstacles within this radius
    pub obs_range: Option<f32>,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            n_agents: 5,
            n_obstacles: 5,
            collision_reward: -0.1,
            agent_radius: 0.05,
            obstacle_radius: 0.1,
            obs_range: None,
        }
    }
}

impl FlockingConfig {
    fn validate(&self) -> Result<()> {
        if self.n_agents == 0 {
            return Err(PhysicsError::Configuration("flocking needs at least one agent".into()));
        }
        if !(self.agent_radius > 0.0 && self.obstacle_radius > 0.0) {
            return Err(PhysicsError::Configuration("flocking radii must be positive".into()));
        }
        if matches!(self.obs_range, Some(r) if !(r > 0.0)) {
            return Err(PhysicsError::Configuration("obs_range must be positive".into()));
        }
        if !self.collision_reward.is_finite() {
            return Err(PhysicsError::Configuration("collision_reward must be finite".into()));
        }
        Ok(())
    }
}

/// Half extent of the arena
const ARENA: f32 = 1.0;

/// Agents gather around a shared target while avoiding each other and static obstacles
#[derive(Debug, Default)]
pub struct Flocking {
    config: FlockingConfig,
    agents: Vec<EntityId>,
    obstacles: Vec<EntityId>,
    target: Option<EntityId>,
}

impl Flocking {
    fn target(&self) -> Result<EntityId> {
        self.target
            .ok_or_else(|| PhysicsError::Configuration("flocking world has not been built".into()))
    }

    pub fn config(&self) -> &FlockingConfig {
        &self.config
    }

    /// Steers straight at the target at full control. `observation` must be
    /// a flocking observation; the target offset sits in columns 4 and 5.
    pub fn heuristic_action(observation: &BatchVector, u_range: f32) -> BatchVector {
        let offset = observation.columns(4, 2).into_owned();
        let norms = row_norms(&offset);
        BatchVector::from_fn(offset.nrows(), 2, |i, j| {
            if norms[i] > EPSILON {
                offset[(i, j)] / norms[i] * u_range
            } else {
                0.0
            }
        })
    }
}

impl Scenario for Flocking {
    fn name(&self) -> &'static str {
        "flocking"
    }

    fn make_world(&mut self, batch_dim: usize, device: Device, options: &ScenarioOptions) -> Result<World> {
        let config: FlockingConfig = parse_options(self.name(), options)?;
        config.validate()?;

        let world_config = WorldConfig {
            substeps: 5,
            boundary: Some(Boundary::square(ARENA, BoundaryPolicy::Clamp)),
            ..Default::default()
        };
        let mut world = World::new(batch_dim, device, world_config)?;

        let properties = AgentProperties {
            obs_range: config.obs_range,
            ..Default::default()
        };
        let agent_group = CollisionGroup::AGENT;
        let agent_mask = CollisionGroup::AGENT | CollisionGroup::OBSTACLE;
        self.agents = (0..config.n_agents)
            .map(|i| {
                world.add_agent(
                    Entity::new_agent_with(format!("agent_{}", i), properties.clone())
                        .with_shape(Shape::sphere(config.agent_radius))
                        .with_collision_group(agent_group, agent_mask),
                )
            })
            .collect::<Result<_>>()?;

        self.obstacles = (0..config.n_obstacles)
            .map(|i| {
                world.add_landmark(
                    Entity::new_landmark(format!("obstacle_{}", i))
                        .with_shape(Shape::sphere(config.obstacle_radius))
                        .with_collision_group(CollisionGroup::OBSTACLE, CollisionMask::AGENT),
                )
            })
            .collect::<Result<_>>()?;

        self.target = Some(world.add_landmark(Entity::new_landmark("target").collide(false))?);

        debug!(
            "built flocking world: {} agents, {} obstacles",
            config.n_agents, config.n_obstacles
        );
        self.config = config;
        Ok(world)
    }

    fn reset_world_at(&self, world: &mut World, env_index: Option<usize>) -> Result<()> {
        world.reset_world_at(env_index)?;
        scatter(world, &self.agents, ARENA, env_index)?;
        scatter(world, &self.obstacles, ARENA, env_index)?;
        scatter(world, &[self.target()?], ARENA, env_index)
    }

    fn reward(&self, world: &World, agent: EntityId) -> Result<BatchScalar> {
        let to_target = relative_pos(world, agent, self.target()?)?;
        let mut reward = -row_norms(&to_target);

        let others = self.agents.iter().chain(&self.obstacles).filter(|&&id| id != agent);
        for &other in others {
            let hits = world.is_overlapping(agent, other)?;
            reward += DVector::from_fn(hits.len(), |i, _| {
                if hits[i] {
                    self.config.collision_reward
                } else {
                    0.0
                }
            });
        }
        Ok(reward)
    }

    fn observation(&self, world: &World, agent: EntityId) -> Result<BatchVector> {
        let state = world.state(agent)?;
        let mut parts = vec![
            state.pos().clone(),
            state.vel().clone(),
            relative_pos(world, agent, self.target()?)?,
        ];
        for &other in self.agents.iter().filter(|&&id| id != agent) {
            parts.push(sensed_relative_pos(world, agent, other)?);
        }
        for &obstacle in &self.obstacles {
            parts.push(sensed_relative_pos(world, agent, obstacle)?);
        }
        Ok(stack_columns(&parts))
    }

    fn observation_size(&self, world: &World, _agent: EntityId) -> usize {
        world.dim_p() * (3 + self.agents.len().saturating_sub(1) + self.obstacles.len())
    }
}
