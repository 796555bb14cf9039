use nalgebra::{DMatrix, DVector};

use crate::error::PhysicsError;
use crate::math::{clamp_elements, clamp_row_norms, BatchScalar, BatchVector};
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// How an agent's physical action columns are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ActionSpace {
    /// Raw control values, clamped to the agent's ranges
    #[default]
    Continuous,

    /// One index per physical axis: 0 = none, 1 = negative, 2 = positive
    Discrete,
}

/// Control descriptor of an agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProperties {
    /// Physical actions are clamped to `[-u_range, u_range]`
    pub u_range: f32,

    /// Gain mapping a clamped action to a force
    pub u_multiplier: f32,

    /// Rotational actions are clamped to `[-u_rot_range, u_rot_range]`; zero disables rotational control
    pub u_rot_range: f32,

    /// Gain mapping a clamped rotational action to a torque
    pub u_rot_multiplier: f32,

    /// Optional cap on the norm of the control force
    pub max_f: Option<f32>,

    /// Optional cap on the magnitude of the control torque
    pub max_t: Option<f32>,

    pub action_space: ActionSpace,

    /// Silent agents carry no communication channel
    pub silent: bool,

    /// Sensing radius; neighbours farther away are masked out of observations
    pub obs_range: Option<f32>,
}

impl AgentProperties {
    /// Whether the agent has a rotational control column
    pub fn has_rot_control(&self) -> bool {
        self.u_rot_range > 0.0
    }

    /// Number of physical action columns (force and optional torque)
    pub fn physical_action_size(&self, dim_p: usize) -> usize {
        dim_p + usize::from(self.has_rot_control())
    }

    /// Total number of action columns including communication
    pub fn action_size(&self, dim_p: usize, dim_c: usize) -> usize {
        let comm = if self.silent { 0 } else { dim_c };
        self.physical_action_size(dim_p) + comm
    }

    pub(crate) fn validate(&self, name: &str) -> Result<()> {
        let ranges = [self.u_range, self.u_multiplier, self.u_rot_range, self.u_rot_multiplier];
        if ranges.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(PhysicsError::Configuration(format!(
                "agent '{}' has a negative or non-finite control range",
                name
            )));
        }
        let caps = [self.max_f, self.max_t];
        if caps.iter().flatten().any(|c| !c.is_finite() || *c <= 0.0) {
            return Err(PhysicsError::Configuration(format!(
                "agent '{}' has a non-positive force or torque cap",
                name
            )));
        }
        Ok(())
    }

    /// Turns a raw `B×k` action into a processed control force, torque and
    /// communication message. Out-of-range values are clamped, never rejected.
    pub(crate) fn process_action(
        &self,
        raw: &BatchVector,
        dim_p: usize,
        dim_c: usize,
    ) -> (BatchVector, BatchScalar, Option<BatchVector>) {
        let rows = raw.nrows();
        let physical = raw.columns(0, dim_p).into_owned();

        let force_action = match self.action_space {
            ActionSpace::Continuous => clamp_elements(&physical, -self.u_range, self.u_range),
            ActionSpace::Discrete => physical.map(|index| match index.round().clamp(0.0, 2.0) as u8 {
                1 => -self.u_range,
                2 => self.u_range,
                _ => 0.0,
            }),
        };
        let mut force = force_action * self.u_multiplier;
        if let Some(max_f) = self.max_f {
            force = clamp_row_norms(&force, max_f);
        }

        let torque = if self.has_rot_control() {
            let r = raw.column(dim_p).map(|x| x.clamp(-self.u_rot_range, self.u_rot_range));
            let t = r * self.u_rot_multiplier;
            match self.max_t {
                Some(max_t) => t.map(|x| x.clamp(-max_t, max_t)),
                None => t,
            }
        } else {
            DVector::zeros(rows)
        };

        let comm = (!self.silent && dim_c > 0).then(|| {
            let offset = self.physical_action_size(dim_p);
            raw.columns(offset, dim_c).into_owned()
        });

        (force, torque, comm)
    }
}

impl Default for AgentProperties {
    fn default() -> Self {
        Self {
            u_range: 1.0,
            u_multiplier: 1.0,
            u_rot_range: 0.0,
            u_rot_multiplier: 1.0,
            max_f: None,
            max_t: None,
            action_space: ActionSpace::Continuous,
            silent: true,
            obs_range: None,
        }
    }
}

/// Processed control of an agent for the current step
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ActionState {
    pub(crate) force: BatchVector,
    pub(crate) torque: BatchScalar,
}

impl ActionState {
    pub fn new(batch_dim: usize, dim_p: usize) -> Self {
        Self {
            force: DMatrix::zeros(batch_dim, dim_p),
            torque: DVector::zeros(batch_dim),
        }
    }

    /// Control force after clamping and gain, `B×dim_p`
    pub fn force(&self) -> &BatchVector {
        &self.force
    }

    /// Control torque after clamping and gain, length `B`
    pub fn torque(&self) -> &BatchScalar {
        &self.torque
    }

    pub(crate) fn reset(&mut self, env_index: Option<usize>) {
        match env_index {
            None => {
                self.force.fill(0.0);
                self.torque.fill(0.0);
            }
            Some(i) => {
                self.force.row_mut(i).fill(0.0);
                self.torque[i] = 0.0;
            }
        }
    }
}
