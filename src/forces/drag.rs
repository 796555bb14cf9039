use crate::bodies::Entity;
use crate::core::WorldConfig;
use crate::forces::{ForceAccumulator, ForceGenerator};

/// Linear drag: `F = -c * v`, `τ = -c_rot * ω`.
///
/// Coefficients come from the world config unless the entity's material
/// overrides them. The effective coefficient is capped at `inertia / dt` so
/// that drag alone can at most bring an entity to rest within one substep.
#[derive(Debug, Default, Clone, Copy)]
pub struct DragForce;

/// Coefficient limited so that `c * dt / inertia <= 1`
#[inline]
fn stable_coefficient(c: f32, inertia: f32, dt: f32) -> f32 {
    c.min(inertia / dt)
}

impl ForceGenerator for DragForce {
    fn generator_type(&self) -> &'static str {
        "Drag"
    }

    fn apply_forces(&self, entities: &[Entity], config: &WorldConfig, forces: &mut ForceAccumulator) {
        let dt = config.sub_dt();
        for (index, entity) in entities.iter().enumerate() {
            let material = entity.material();

            if entity.is_movable() {
                let c = material.linear_drag_or(config.linear_damping);
                if c > 0.0 {
                    let c = stable_coefficient(c, entity.mass(), dt);
                    forces.add_force(index, &(entity.state().vel() * -c));
                }
            }

            if entity.is_rotatable() {
                let c = material.angular_drag_or(config.angular_damping);
                let inertia = entity.moment_of_inertia();
                if c > 0.0 && inertia > 0.0 {
                    let c = stable_coefficient(c, inertia, dt);
                    forces.add_torque(index, &(entity.state().ang_vel() * -c));
                }
            }
        }
    }
}
