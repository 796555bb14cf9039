mod batch;

pub use batch::{
    BatchScalar, BatchVector, first_non_finite_row, clamp_elements, clamp_row_norms, cross2,
    row_norms, stack_columns, stack_rows, tile_row,
};

/// 2D vector used for per-entity constants (gravity, half extents, ...)
pub type Vector2 = nalgebra::Vector2<f32>;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Numerically stable `k * ln(1 + exp(x / k))`
#[inline]
pub fn softplus(x: f32, k: f32) -> f32 {
    let z = x / k;
    // ln(1 + e^z) = max(z, 0) + ln(1 + e^-|z|)
    k * (z.max(0.0) + (-z.abs()).exp().ln_1p())
}

/// Penalty magnitude for a penetration depth `p`: a softplus shifted so that
/// it is zero at `p = 0`, strictly increasing, and asymptotically linear.
#[inline]
pub fn contact_penalty(penetration: f32, margin: f32) -> f32 {
    if penetration <= 0.0 {
        return 0.0;
    }
    softplus(penetration, margin) - margin * std::f32::consts::LN_2
}
