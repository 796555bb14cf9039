use crate::bodies::Entity;
use crate::core::WorldConfig;
use crate::forces::{ForceAccumulator, ForceGenerator};
use crate::math::tile_row;

/// Constant `m * g` on movable entities
#[derive(Debug, Default, Clone, Copy)]
pub struct GravityForce;

impl ForceGenerator for GravityForce {
    fn generator_type(&self) -> &'static str {
        "Gravity"
    }

    fn apply_forces(&self, entities: &[Entity], config: &WorldConfig, forces: &mut ForceAccumulator) {
        for (index, entity) in entities.iter().enumerate() {
            if !entity.is_movable() {
                continue;
            }
            let gravity = entity.gravity().unwrap_or(config.gravity);
            if gravity.x == 0.0 && gravity.y == 0.0 {
                continue;
            }
            let weight = gravity * entity.mass();
            forces.add_force(index, &tile_row(&weight, entity.state().batch_dim()));
        }
    }
}
