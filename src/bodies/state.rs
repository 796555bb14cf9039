use nalgebra::{DMatrix, DVector};

use crate::math::{first_non_finite_row, BatchScalar, BatchVector};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Batched kinematic state of one entity; row `i` belongs to environment `i`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct EntityState {
    pub(crate) pos: BatchVector,
    pub(crate) vel: BatchVector,
    pub(crate) rot: BatchScalar,
    pub(crate) ang_vel: BatchScalar,
    pub(crate) comm: Option<BatchVector>,
}

impl EntityState {
    /// Creates a zeroed state for `batch_dim` environments
    pub fn new(batch_dim: usize, dim_p: usize, dim_c: Option<usize>) -> Self {
        Self {
            pos: DMatrix::zeros(batch_dim, dim_p),
            vel: DMatrix::zeros(batch_dim, dim_p),
            rot: DVector::zeros(batch_dim),
            ang_vel: DVector::zeros(batch_dim),
            comm: dim_c.map(|c| DMatrix::zeros(batch_dim, c)),
        }
    }

    /// Position, `B×dim_p`
    pub fn pos(&self) -> &BatchVector {
        &self.pos
    }

    /// Velocity, `B×dim_p`
    pub fn vel(&self) -> &BatchVector {
        &self.vel
    }

    /// Rotation angle in radians, length `B`
    pub fn rot(&self) -> &BatchScalar {
        &self.rot
    }

    /// Angular velocity, length `B`
    pub fn ang_vel(&self) -> &BatchScalar {
        &self.ang_vel
    }

    /// Communication channel, `B×dim_c`, present for speaking agents only
    pub fn comm(&self) -> Option<&BatchVector> {
        self.comm.as_ref()
    }

    pub fn batch_dim(&self) -> usize {
        self.pos.nrows()
    }

    /// Zeroes every channel, either for all environments or for one row
    pub(crate) fn reset(&mut self, env_index: Option<usize>) {
        match env_index {
            None => {
                self.pos.fill(0.0);
                self.vel.fill(0.0);
                self.rot.fill(0.0);
                self.ang_vel.fill(0.0);
                if let Some(c) = self.comm.as_mut() {
                    c.fill(0.0);
                }
            }
            Some(i) => {
                self.pos.row_mut(i).fill(0.0);
                self.vel.row_mut(i).fill(0.0);
                self.rot[i] = 0.0;
                self.ang_vel[i] = 0.0;
                if let Some(c) = self.comm.as_mut() {
                    c.row_mut(i).fill(0.0);
                }
            }
        }
    }

    /// Row of the first environment holding a non-finite value
    pub(crate) fn first_non_finite(&self) -> Option<usize> {
        let scalar_rows = self
            .rot
            .iter()
            .zip(self.ang_vel.iter())
            .position(|(r, w)| !r.is_finite() || !w.is_finite());

        [
            first_non_finite_row(&self.pos),
            first_non_finite_row(&self.vel),
            scalar_rows,
            self.comm.as_ref().and_then(first_non_finite_row),
        ]
        .into_iter()
        .flatten()
        .min()
    }
}
