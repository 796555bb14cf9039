#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A circular collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Sphere {
    /// The radius of the circle
    radius: f32,
}

impl Sphere {
    /// Creates a new circle with the given radius
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    /// Returns the radius of the circle
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Moment of inertia of a uniform disc about its centre: `m r^2 / 2`
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        0.5 * mass * self.radius.powi(2)
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(0.05)
    }
}
