mod force_generator;
mod control;
mod drag;
mod gravity;
mod contact;

pub use self::force_generator::{ForceAccumulator, ForceGenerator, ForceRegistry};
pub use self::control::ControlForce;
pub use self::drag::DragForce;
pub use self::gravity::GravityForce;
pub use self::contact::ContactForce;
