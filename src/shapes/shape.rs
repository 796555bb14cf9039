use crate::error::PhysicsError;
use crate::math::{Vector2, EPSILON};
use crate::shapes::{BoxShape, Sphere};
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Collision shape of an entity
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Shape {
    Sphere(Sphere),
    Box(BoxShape),
}

impl Shape {
    /// Shorthand for a circle of the given radius
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(Sphere::new(radius))
    }

    /// Shorthand for a box with the given full length and width
    pub fn cuboid(length: f32, width: f32) -> Self {
        Self::Box(BoxShape::new_with_dimensions(length, width))
    }

    /// Returns the type name of the shape
    pub fn shape_type(&self) -> &'static str {
        match self {
            Self::Sphere(_) => "Sphere",
            Self::Box(_) => "Box",
        }
    }

    /// Moment of inertia about the centre for the given mass
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        match self {
            Self::Sphere(s) => s.moment_of_inertia(mass),
            Self::Box(b) => b.moment_of_inertia(mass),
        }
    }

    /// Radius of the smallest circle centred on the entity enclosing the shape
    pub fn circumscribed_radius(&self) -> f32 {
        match self {
            Self::Sphere(s) => s.get_radius(),
            Self::Box(b) => b.circumscribed_radius(),
        }
    }

    /// Returns the half-extents of an axis-aligned box enclosing the shape at rotation zero
    pub fn half_extents(&self) -> Vector2 {
        match self {
            Self::Sphere(s) => Vector2::new(s.get_radius(), s.get_radius()),
            Self::Box(b) => b.get_half_extents(),
        }
    }

    pub(crate) fn validate(&self, entity: &str) -> Result<()> {
        let extents = self.half_extents();
        if !(extents.x > EPSILON && extents.y > EPSILON) || !extents.iter().all(|v| v.is_finite()) {
            return Err(PhysicsError::Configuration(format!(
                "entity '{}' has a degenerate {} shape",
                entity,
                self.shape_type()
            )));
        }
        Ok(())
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::Sphere(Sphere::default())
    }
}
