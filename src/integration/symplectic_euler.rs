use crate::bodies::Entity;
use crate::integration::Integrator;
use crate::math::{clamp_elements, clamp_row_norms, BatchScalar, BatchVector};

/// Symplectic Euler integrator (semi-implicit Euler).
///
/// Velocities are updated from the net force first, then positions move
/// with the *new* velocity. Speed limits are applied between the two.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymplecticEulerIntegrator;

impl SymplecticEulerIntegrator {
    /// Creates a new Symplectic Euler integrator
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for SymplecticEulerIntegrator {
    fn integrate(&self, entity: &mut Entity, force: &BatchVector, torque: &BatchScalar, dt: f32) {
        let movable = entity.is_movable();
        let rotatable = entity.is_rotatable();
        let inv_mass = 1.0 / entity.mass();
        let inertia = entity.moment_of_inertia();
        let max_speed = entity.max_speed();
        let v_range = entity.v_range();
        let state = entity.state_mut();

        if movable {
            let mut vel = &state.vel + force * (inv_mass * dt);
            if let Some(limit) = max_speed {
                vel = clamp_row_norms(&vel, limit);
            }
            if let Some(limit) = v_range {
                vel = clamp_elements(&vel, -limit, limit);
            }
            state.pos += &vel * dt;
            state.vel = vel;
        }

        if rotatable && inertia > 0.0 {
            state.ang_vel += torque * (dt / inertia);
            state.rot += &state.ang_vel * dt;
        }
    }

    fn name(&self) -> &str {
        "SymplecticEuler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn attached(entity: Entity) -> Entity {
        let mut entity = entity;
        entity.attach(EntityId(0), 1, 2, 0);
        entity
    }

    #[test]
    fn position_uses_updated_velocity() {
        let mut e = attached(Entity::new_agent("a").with_mass(2.0));
        let force = DMatrix::from_row_slice(1, 2, &[4.0, 0.0]);
        SymplecticEulerIntegrator.integrate(&mut e, &force, &DVector::zeros(1), 0.1);
        assert_relative_eq!(e.state().vel()[(0, 0)], 0.2, epsilon = 1e-6);
        assert_relative_eq!(e.state().pos()[(0, 0)], 0.02, epsilon = 1e-6);
    }

    #[test]
    fn speed_limits_clip_velocity() {
        let mut e = attached(Entity::new_agent("a").with_max_speed(0.5).with_v_range(0.3));
        let force = DMatrix::from_row_slice(1, 2, &[100.0, 100.0]);
        SymplecticEulerIntegrator.integrate(&mut e, &force, &DVector::zeros(1), 0.1);
        let vel = e.state().vel();
        assert_relative_eq!(vel[(0, 0)], 0.3, epsilon = 1e-6);
        assert_relative_eq!(vel[(0, 1)], 0.3, epsilon = 1e-6);
    }

    #[test]
    fn immovable_entities_stay_put() {
        let mut e = attached(Entity::new_landmark("wall"));
        let force = DMatrix::from_row_slice(1, 2, &[10.0, 10.0]);
        SymplecticEulerIntegrator.integrate(&mut e, &force, &DVector::from_element(1, 5.0), 0.1);
        assert_eq!(e.state().pos()[(0, 0)], 0.0);
        assert_eq!(e.state().rot()[0], 0.0);
    }
}
