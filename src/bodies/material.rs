/// Material properties for physics objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Bounciness, 0-1. Scales contact stiffness and boundary reflection.
    pub elasticity: f32,

    /// Per-entity linear drag overriding the world coefficient
    pub linear_drag: Option<f32>,

    /// Per-entity angular drag overriding the world coefficient
    pub angular_drag: Option<f32>,
}

impl Material {
    /// Creates a new material with the given elasticity and world drag
    pub fn new(elasticity: f32) -> Self {
        Self {
            elasticity,
            linear_drag: None,
            angular_drag: None,
        }
    }

    /// Linear drag coefficient, falling back to the world value
    pub fn linear_drag_or(&self, world: f32) -> f32 {
        self.linear_drag.unwrap_or(world)
    }

    /// Angular drag coefficient, falling back to the world value
    pub fn angular_drag_or(&self, world: f32) -> f32 {
        self.angular_drag.unwrap_or(world)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(1.0)
    }
}
