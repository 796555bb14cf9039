mod collision_pair;
mod collision_filter;
mod contact_solver;
pub mod narrow_phase;

pub use self::collision_pair::{CollisionPair, PairKind, PairSet};
pub use self::collision_filter::{CollisionFilter, CollisionGroup, CollisionMask, GroupMaskFilter};
pub use self::contact_solver::ContactModel;
pub use self::narrow_phase::{ContactBatch, detect_group, detect_pair};
