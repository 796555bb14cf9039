//! Scenario plugins.
//!
//! A scenario builds a [`World`], places its entities on reset and scores
//! agents. Scenarios are looked up by name through [`make_scenario`].

mod simple;
mod flocking;

pub use self::simple::{Simple, SimpleConfig};
pub use self::flocking::{Flocking, FlockingConfig};

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{Device, EntityId, World};
use crate::error::PhysicsError;
use crate::math::{BatchScalar, BatchVector};
use crate::Result;

/// Flat key/value options handed to [`Scenario::make_world`]
pub type ScenarioOptions = serde_json::Map<String, Value>;

/// Behaviour of a task built on top of the physics world
pub trait Scenario: Send + Sync + std::fmt::Debug {
    /// Registry name of the scenario
    fn name(&self) -> &'static str;

    /// Builds the world. Unrecognised options are a configuration error.
    fn make_world(&mut self, batch_dim: usize, device: Device, options: &ScenarioOptions) -> Result<World>;

    /// Resets the world (all environments, or only `env_index`) and places entities
    fn reset_world_at(&self, world: &mut World, env_index: Option<usize>) -> Result<()>;

    /// Reward of `agent`, one entry per environment
    fn reward(&self, world: &World, agent: EntityId) -> Result<BatchScalar>;

    /// Observation of `agent`, `B×observation_size`
    fn observation(&self, world: &World, agent: EntityId) -> Result<BatchVector>;

    /// Width of the observation of `agent`
    fn observation_size(&self, world: &World, agent: EntityId) -> usize;

    /// Termination flags; never done unless overridden
    fn done(&self, world: &World) -> Vec<bool> {
        vec![false; world.batch_dim()]
    }

    /// Extra per-agent diagnostics
    fn info(&self, _world: &World, _agent: EntityId) -> BTreeMap<String, BatchVector> {
        BTreeMap::new()
    }
}

/// Deserializes scenario options into a typed config, rejecting unknown keys
pub fn parse_options<T: DeserializeOwned>(scenario: &str, options: &ScenarioOptions) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        PhysicsError::Configuration(format!("invalid options for scenario '{}': {}", scenario, e))
    })
}

/// Observations of every agent, in agent order, with their shapes checked
pub fn observe(scenario: &dyn Scenario, world: &World) -> Result<Vec<BatchVector>> {
    world
        .agents()
        .map(|agent| {
            let obs = scenario.observation(world, agent.id())?;
            let expected = (world.batch_dim(), scenario.observation_size(world, agent.id()));
            if obs.shape() != expected {
                return Err(PhysicsError::shape_mismatch(
                    format!("observation of '{}'", agent.name()),
                    format!("{}x{}", expected.0, expected.1),
                    format!("{}x{}", obs.nrows(), obs.ncols()),
                ));
            }
            Ok(obs)
        })
        .collect()
}

/// Rewards of every agent, in agent order, with their lengths checked
pub fn rewards(scenario: &dyn Scenario, world: &World) -> Result<Vec<BatchScalar>> {
    world
        .agents()
        .map(|agent| {
            let reward = scenario.reward(world, agent.id())?;
            if reward.len() != world.batch_dim() {
                return Err(PhysicsError::shape_mismatch(
                    format!("reward of '{}'", agent.name()),
                    world.batch_dim(),
                    reward.len(),
                ));
            }
            Ok(reward)
        })
        .collect()
}

/// Names accepted by [`make_scenario`]
pub fn available_scenarios() -> &'static [&'static str] {
    &["simple", "flocking"]
}

/// Looks up a scenario by name
pub fn make_scenario(name: &str) -> Result<Box<dyn Scenario>> {
    match name {
        "simple" => Ok(Box::new(Simple::default())),
        "flocking" => Ok(Box::new(Flocking::default())),
        other => Err(PhysicsError::Configuration(format!(
            "unknown scenario '{}', expected one of {:?}",
            other,
            available_scenarios()
        ))),
    }
}

/// Samples fresh positions in `[-extent, extent]^2` for the given entities
pub(crate) fn scatter(world: &mut World, ids: &[EntityId], extent: f32, env_index: Option<usize>) -> Result<()> {
    let rows = if env_index.is_some() { 1 } else { world.batch_dim() };
    let dim_p = world.dim_p();
    for &id in ids {
        let pos = world.sample_uniform(rows, dim_p, -extent, extent)?;
        world.set_pos(id, &pos, env_index)?;
    }
    Ok(())
}

/// `other - agent` position, `B×dim_p`
pub(crate) fn relative_pos(world: &World, agent: EntityId, other: EntityId) -> Result<BatchVector> {
    Ok(world.state(other)?.pos() - world.state(agent)?.pos())
}

/// Like [`relative_pos`], but rows where `other` lies beyond the agent's
/// `obs_range` read as zero
pub(crate) fn sensed_relative_pos(world: &World, agent: EntityId, other: EntityId) -> Result<BatchVector> {
    let mut rel = relative_pos(world, agent, other)?;
    let range = world.entity(agent)?.agent_properties().and_then(|p| p.obs_range);
    if let Some(range) = range {
        for i in 0..rel.nrows() {
            if rel.row(i).norm() > range {
                rel.row_mut(i).fill(0.0);
            }
        }
    }
    Ok(rel)
}
