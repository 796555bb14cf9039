pub mod world;
pub mod config;
pub mod storage;

pub use self::world::World;
pub use self::config::WorldConfig;
pub use self::storage::EntityStorage;

use std::collections::HashMap;
use std::fmt;

use crate::math::BatchVector;

/// Index of an entity in its world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    /// Id carried by entities not yet added to a world
    pub const UNASSIGNED: EntityId = EntityId(usize::MAX);

    /// Position of the entity in the world's entity list
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::UNASSIGNED {
            write!(f, "#unassigned")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Storage backend tag. Opaque to the physics: all arrays live in host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,

    /// Accelerator ordinal; recorded only
    Cuda(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

/// Per-agent control inputs of one step: agent name to a `B×action_size` matrix
pub type Actions = HashMap<String, BatchVector>;
