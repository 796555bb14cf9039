mod boundary;

pub use self::boundary::{Boundary, BoundaryPolicy};
