use crate::bodies::Entity;
use crate::core::WorldConfig;
use crate::forces::{ForceAccumulator, ForceGenerator};

/// Applies each agent's processed action as a force and, with rotational
/// control, a torque. Clamping and gain are applied when the action is
/// received, so this generator only forwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlForce;

impl ForceGenerator for ControlForce {
    fn generator_type(&self) -> &'static str {
        "Control"
    }

    fn apply_forces(&self, entities: &[Entity], _config: &WorldConfig, forces: &mut ForceAccumulator) {
        for (index, entity) in entities.iter().enumerate() {
            let Some(action) = entity.action() else { continue };
            if entity.is_movable() {
                forces.add_force(index, action.force());
            }
            if entity.is_rotatable() {
                forces.add_torque(index, action.torque());
            }
        }
    }
}
