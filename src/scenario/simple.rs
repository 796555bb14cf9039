use nalgebra::DVector;
use serde::Deserialize;

use crate::bodies::Entity;
use crate::core::{Device, EntityId, World, WorldConfig};
use crate::error::PhysicsError;
use crate::math::{stack_columns, BatchScalar, BatchVector};
use crate::scenario::{parse_options, relative_pos, scatter, Scenario, ScenarioOptions};
use crate::Result;

/// The `simple` scenario takes no options
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleConfig {}

/// One agent chasing one landmark; neither collides.
///
/// Reward is the negative squared distance to the landmark.
#[derive(Debug, Default)]
pub struct Simple {
    agents: Vec<EntityId>,
    landmarks: Vec<EntityId>,
}

impl Scenario for Simple {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn make_world(&mut self, batch_dim: usize, device: Device, options: &ScenarioOptions) -> Result<World> {
        let _: SimpleConfig = parse_options(self.name(), options)?;
        let mut world = World::new(batch_dim, device, WorldConfig::default())?;

        self.agents = vec![world.add_agent(Entity::new_agent("agent_0").collide(false))?];
        self.landmarks = vec![world.add_landmark(Entity::new_landmark("landmark 0").collide(false))?];
        Ok(world)
    }

    fn reset_world_at(&self, world: &mut World, env_index: Option<usize>) -> Result<()> {
        world.reset_world_at(env_index)?;
        scatter(world, &self.agents, 1.0, env_index)?;
        scatter(world, &self.landmarks, 1.0, env_index)
    }

    fn reward(&self, world: &World, agent: EntityId) -> Result<BatchScalar> {
        let landmark = self
            .landmarks
            .first()
            .copied()
            .ok_or_else(|| PhysicsError::Configuration("simple scenario has no landmark".into()))?;
        let delta = relative_pos(world, agent, landmark)?;
        Ok(DVector::from_fn(delta.nrows(), |i, _| -delta.row(i).norm_squared()))
    }

    fn observation(&self, world: &World, agent: EntityId) -> Result<BatchVector> {
        let mut parts = vec![world.state(agent)?.vel().clone()];
        for &landmark in &self.landmarks {
            parts.push(relative_pos(world, agent, landmark)?);
        }
        Ok(stack_columns(&parts))
    }

    fn observation_size(&self, world: &World, _agent: EntityId) -> usize {
        world.dim_p() * (1 + self.landmarks.len())
    }
}
