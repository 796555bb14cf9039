use crate::collision::ContactModel;
use crate::constraints::Boundary;
use crate::error::PhysicsError;
use crate::math::Vector2;
use crate::Result;

/// Configuration parameters for the physics simulation.
///
/// Fixed at world construction; the world never mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Duration of one control step
    pub dt: f32,

    /// Number of physics updates per control step
    pub substeps: u32,

    /// Constant acceleration applied to movable entities
    pub gravity: Vector2,

    /// Global drag coefficient for linear velocity
    pub linear_damping: f32,

    /// Global drag coefficient for angular velocity
    pub angular_damping: f32,

    /// Soft contact law
    pub contact: ContactModel,

    /// Centre distances at or below this are treated as coincident
    pub min_collision_distance: f32,

    /// Width of the agents' communication channel
    pub dim_c: usize,

    /// Optional rectangular world boundary
    pub boundary: Option<Boundary>,

    /// Seed of the world RNG; drawn from OS entropy when absent
    pub seed: Option<u64>,
}

impl WorldConfig {
    /// Duration of one physics update
    pub fn sub_dt(&self) -> f32 {
        self.dt / self.substeps as f32
    }

    /// Checks every parameter; called once by the world constructor
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(PhysicsError::Configuration(format!("dt must be positive, got {}", self.dt)));
        }
        if self.substeps == 0 {
            return Err(PhysicsError::Configuration("substeps must be at least 1".into()));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(PhysicsError::Configuration("gravity must be finite".into()));
        }
        for (label, value) in [
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
            ("contact stiffness", self.contact.stiffness),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(PhysicsError::Configuration(format!(
                    "{} must be non-negative, got {}",
                    label, value
                )));
            }
        }
        if !(self.contact.margin > 0.0 && self.contact.margin.is_finite()) {
            return Err(PhysicsError::Configuration(format!(
                "contact margin must be positive, got {}",
                self.contact.margin
            )));
        }
        if !(self.min_collision_distance >= 0.0) {
            return Err(PhysicsError::Configuration(
                "min_collision_distance must be non-negative".into(),
            ));
        }
        if let Some(boundary) = &self.boundary {
            boundary.validate()?;
        }
        Ok(())
    }
}

/// With the default contact stiffness, two unit-mass bodies in deep contact
/// oscillate at `ω ≈ sqrt(2 * 500)` rad/s, so `ω * dt` exceeds the symplectic
/// Euler limit of 2 at one substep of 0.1 s. Worlds with sustained contact
/// between light bodies need `substeps >= 2`; `flocking` uses 5.
impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            substeps: 1,
            gravity: Vector2::zeros(),
            linear_damping: 0.25,
            angular_damping: 0.25,
            contact: ContactModel::default(),
            min_collision_distance: 1.0e-6,
            dim_c: 0,
            boundary: None,
            seed: None,
        }
    }
}
