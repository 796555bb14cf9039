use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// An oriented rectangle collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BoxShape {
    /// The half-extents of the box (half-length along local x, half-width along local y)
    half_extents: Vector2,
}

impl BoxShape {
    /// Creates a new box with the given half-extents
    pub fn new(half_extents: Vector2) -> Self {
        Self {
            half_extents: Vector2::new(half_extents.x.max(0.0), half_extents.y.max(0.0)),
        }
    }

    /// Creates a new box with the given full dimensions
    pub fn new_with_dimensions(length: f32, width: f32) -> Self {
        Self::new(Vector2::new(length.max(0.0) * 0.5, width.max(0.0) * 0.5))
    }

    /// Returns the half-extents of the box
    pub fn get_half_extents(&self) -> Vector2 {
        self.half_extents
    }

    /// Returns the full dimensions of the box
    pub fn get_dimensions(&self) -> Vector2 {
        self.half_extents * 2.0
    }

    /// Distance from the centre to the farthest corner
    pub fn circumscribed_radius(&self) -> f32 {
        self.half_extents.norm()
    }

    /// Moment of inertia of a uniform rectangle: `m (l^2 + w^2) / 12`
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        let dims = self.get_dimensions();
        mass * (dims.x.powi(2) + dims.y.powi(2)) / 12.0
    }
}
