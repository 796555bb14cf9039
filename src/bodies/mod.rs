mod entity;
mod agent;
mod material;
mod state;

pub use self::entity::{Entity, EntityKind};
pub use self::agent::{ActionSpace, ActionState, AgentProperties};
pub use self::material::Material;
pub use self::state::EntityState;

/// Flags for controlling entity behavior
pub mod entity_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Flags for controlling the behavior of entities
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct EntityFlags: u32 {
            /// Entity position and velocity are integrated
            const MOVABLE = 0x01;

            /// Entity rotation and angular velocity are integrated
            const ROTATABLE = 0x02;

            /// Entity takes part in pairwise contact resolution
            const COLLIDE = 0x04;
        }
    }
}
