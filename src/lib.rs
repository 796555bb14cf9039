pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod constraints;
pub mod forces;
pub mod integration;
pub mod scenario;

/// Re-export common types for easier usage
pub use crate::core::{World, WorldConfig, Device, EntityId, Actions};
pub use crate::bodies::{Entity, EntityKind, EntityState, AgentProperties, ActionSpace, Material};
pub use crate::shapes::Shape;
pub use crate::scenario::{Scenario, ScenarioOptions, make_scenario, available_scenarios};

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Configuration error: {0}")]
        Configuration(String),

        #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
        ShapeMismatch {
            context: String,
            expected: String,
            found: String,
        },

        #[error("Unknown entity: {0}")]
        UnknownEntity(String),

        #[error("Non-finite state detected for entity '{entity}' in environment {env_index}")]
        NumericInstability {
            entity: String,
            env_index: usize,
        },

        #[error("Environment index {index} out of range for batch of {batch_dim}")]
        EnvIndexOutOfRange {
            index: usize,
            batch_dim: usize,
        },
    }

    impl PhysicsError {
        pub(crate) fn shape_mismatch(
            context: impl Into<String>,
            expected: impl std::fmt::Display,
            found: impl std::fmt::Display,
        ) -> Self {
            Self::ShapeMismatch {
                context: context.into(),
                expected: expected.to_string(),
                found: found.to_string(),
            }
        }
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
