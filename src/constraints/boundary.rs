use crate::bodies::Entity;
use crate::error::PhysicsError;
use crate::Result;

/// What happens to an entity that leaves the world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Position is clamped to the edge and the outward velocity component zeroed
    #[default]
    Clamp,

    /// Position is mirrored back inside and the velocity component negated,
    /// scaled by the entity's elasticity
    Reflect,
}

/// Rectangular world boundary `[-x_semidim, x_semidim] × [-y_semidim, y_semidim]`.
/// An absent extent leaves that axis unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub x_semidim: Option<f32>,
    pub y_semidim: Option<f32>,
    pub policy: BoundaryPolicy,
}

impl Boundary {
    pub fn new(x_semidim: Option<f32>, y_semidim: Option<f32>, policy: BoundaryPolicy) -> Self {
        Self { x_semidim, y_semidim, policy }
    }

    /// Square boundary with the same half-extent on both axes
    pub fn square(semidim: f32, policy: BoundaryPolicy) -> Self {
        Self::new(Some(semidim), Some(semidim), policy)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for extent in [self.x_semidim, self.y_semidim].into_iter().flatten() {
            if !(extent > 0.0 && extent.is_finite()) {
                return Err(PhysicsError::Configuration(format!(
                    "boundary extents must be positive, got {}",
                    extent
                )));
            }
        }
        Ok(())
    }

    /// Applies the boundary to a movable entity across the batch
    pub fn enforce(&self, entity: &mut Entity) {
        if !entity.is_movable() {
            return;
        }
        let elasticity = entity.elasticity();
        let policy = self.policy;
        let state = entity.state_mut();

        for (axis, limit) in [(0, self.x_semidim), (1, self.y_semidim)] {
            let Some(limit) = limit else { continue };
            for i in 0..state.pos.nrows() {
                let p = state.pos[(i, axis)];
                if p.abs() <= limit {
                    continue;
                }
                let edge = limit.copysign(p);
                let outward = state.vel[(i, axis)] * p.signum() > 0.0;
                match policy {
                    BoundaryPolicy::Clamp => {
                        state.pos[(i, axis)] = edge;
                        if outward {
                            state.vel[(i, axis)] = 0.0;
                        }
                    }
                    BoundaryPolicy::Reflect => {
                        // Overshoots larger than the whole box end on the far edge
                        state.pos[(i, axis)] = (2.0 * edge - p).clamp(-limit, limit);
                        if outward {
                            state.vel[(i, axis)] = -state.vel[(i, axis)] * elasticity;
                        }
                    }
                }
            }
        }
    }
}
