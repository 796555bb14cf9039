use crate::bodies::Entity;
use crate::math::{BatchScalar, BatchVector};

/// Trait for numerical integration algorithms
pub trait Integrator: Send + Sync + std::fmt::Debug {
    /// Advances one entity over `dt` under the given net force and torque
    fn integrate(&self, entity: &mut Entity, force: &BatchVector, torque: &BatchScalar, dt: f32);

    /// Returns the name of the integrator
    fn name(&self) -> &str;
}
