use nalgebra::DMatrix;

use crate::collision::ContactBatch;
use crate::math::{contact_penalty, BatchScalar, BatchVector};

/// Penalty-based soft contact law.
///
/// A pair penetrating by `p` is pushed apart along the contact normal with
/// magnitude `stiffness * elasticity_factor * (k ln(1 + e^(p/k)) - k ln 2)`,
/// where `k` is the contact margin. The curve is zero at `p = 0`, smooth and
/// strictly increasing, and approaches `stiffness * (p - k ln 2)` for deep
/// contacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactModel {
    /// Force per unit of (softened) penetration
    pub stiffness: f32,

    /// Softness length of the penalty curve
    pub margin: f32,
}

impl ContactModel {
    pub fn new(stiffness: f32, margin: f32) -> Self {
        Self { stiffness, margin }
    }

    /// Stiffness scale of a pair: 1 for two fully elastic entities, 1/2 for two inelastic ones
    pub fn elasticity_factor(elasticity_a: f32, elasticity_b: f32) -> f32 {
        0.5 * (1.0 + 0.5 * (elasticity_a + elasticity_b))
    }

    /// Force magnitude for a penetration depth
    pub fn magnitude(&self, penetration: f32, elasticity_factor: f32) -> f32 {
        self.stiffness * elasticity_factor * contact_penalty(penetration, self.margin)
    }

    /// Force acting on the first shape of every contact row; the second
    /// shape receives the opposite force.
    pub fn forces(&self, contacts: &ContactBatch, elasticity_factor: &BatchScalar) -> BatchVector {
        DMatrix::from_fn(contacts.len(), 2, |i, j| {
            contacts.normal[(i, j)] * self.magnitude(contacts.penetration[i], elasticity_factor[i])
        })
    }
}

impl Default for ContactModel {
    fn default() -> Self {
        Self::new(500.0, 1.0e-3)
    }
}
