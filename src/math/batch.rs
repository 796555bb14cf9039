use nalgebra::{DMatrix, DVector};

use crate::math::{Vector2, EPSILON};

/// A batched vector quantity: one row per environment, one column per component
pub type BatchVector = DMatrix<f32>;

/// A batched scalar quantity: one entry per environment
pub type BatchScalar = DVector<f32>;

/// Euclidean norm of every row
pub fn row_norms(m: &BatchVector) -> BatchScalar {
    DVector::from_fn(m.nrows(), |i, _| m.row(i).norm())
}

/// Clamps every element into `[min, max]`; NaN stays NaN
pub fn clamp_elements(m: &BatchVector, min: f32, max: f32) -> BatchVector {
    m.map(|x| x.clamp(min, max))
}

/// Rescales every row whose norm exceeds `max_norm` down to `max_norm`
pub fn clamp_row_norms(m: &BatchVector, max_norm: f32) -> BatchVector {
    let norms = row_norms(m);
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| {
        let n = norms[i];
        if n > max_norm && n > EPSILON {
            m[(i, j)] * (max_norm / n)
        } else {
            m[(i, j)]
        }
    })
}

/// Row-wise 2D cross product `a.x * b.y - a.y * b.x`
pub fn cross2(a: &BatchVector, b: &BatchVector) -> BatchScalar {
    debug_assert_eq!(a.shape(), b.shape());
    DVector::from_fn(a.nrows(), |i, _| a[(i, 0)] * b[(i, 1)] - a[(i, 1)] * b[(i, 0)])
}

/// Repeats a constant vector over `rows` rows
pub fn tile_row(v: &Vector2, rows: usize) -> BatchVector {
    DMatrix::from_fn(rows, 2, |_, j| v[j])
}

/// Concatenates matrices with the same column count along the row axis
pub fn stack_rows(parts: &[&BatchVector]) -> BatchVector {
    let cols = parts.first().map_or(0, |p| p.ncols());
    let rows: usize = parts.iter().map(|p| p.nrows()).sum();
    let mut out = DMatrix::zeros(rows, cols);
    let mut offset = 0;
    for part in parts {
        debug_assert_eq!(part.ncols(), cols);
        out.rows_mut(offset, part.nrows()).copy_from(*part);
        offset += part.nrows();
    }
    out
}

/// Concatenates matrices with the same row count along the column axis
pub fn stack_columns(parts: &[BatchVector]) -> BatchVector {
    let rows = parts.first().map_or(0, |p| p.nrows());
    let cols: usize = parts.iter().map(|p| p.ncols()).sum();
    let mut out = DMatrix::zeros(rows, cols);
    let mut offset = 0;
    for part in parts {
        debug_assert_eq!(part.nrows(), rows);
        out.columns_mut(offset, part.ncols()).copy_from(part);
        offset += part.ncols();
    }
    out
}

/// Returns the first row index holding a non-finite value, if any
pub fn first_non_finite_row(m: &BatchVector) -> Option<usize> {
    (0..m.nrows()).find(|&i| m.row(i).iter().any(|x| !x.is_finite()))
}
