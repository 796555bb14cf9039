use bitflags::bitflags;
use crate::bodies::Entity;

bitflags! {
    /// A bit mask representing a collision group
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionGroup: u32 {
        /// Default group (collides with everything)
        const DEFAULT  = 0x00000001;

        /// Controllable agents
        const AGENT    = 0x00000002;

        /// Goal or marker landmarks
        const LANDMARK = 0x00000004;

        /// Obstacles and walls
        const OBSTACLE = 0x00000008;

        /// Free for scenario use
        const GROUP5   = 0x00000010;

        /// Free for scenario use
        const GROUP6   = 0x00000020;

        /// Free for scenario use
        const GROUP7   = 0x00000040;

        /// Free for scenario use
        const GROUP8   = 0x00000080;

        /// All groups
        const ALL      = 0xFFFFFFFF;
    }
}

/// Type alias for a collision mask (what groups this object collides with)
pub type CollisionMask = CollisionGroup;

/// A filter for determining whether two entities should exchange contact forces
pub trait CollisionFilter: Send + Sync + std::fmt::Debug {
    /// Returns whether the two entities should be tested for collision
    fn should_collide(&self, entity_a: &Entity, entity_b: &Entity) -> bool;
}

/// A filter based on the collide flag, mobility, and collision groups and masks
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupMaskFilter;

impl GroupMaskFilter {
    pub fn new() -> Self {
        Self
    }
}

impl CollisionFilter for GroupMaskFilter {
    fn should_collide(&self, entity_a: &Entity, entity_b: &Entity) -> bool {
        if !entity_a.is_collidable() || !entity_b.is_collidable() {
            return false;
        }

        // Two fixed entities can never move apart
        if !entity_a.is_movable() && !entity_b.is_movable() {
            return false;
        }

        // A collides with B if A's mask includes B's group AND B's mask includes A's group
        entity_a.collision_group().intersects(entity_b.collision_mask())
            && entity_b.collision_group().intersects(entity_a.collision_mask())
    }
}
