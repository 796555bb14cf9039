//! Batched narrow phase.
//!
//! Every kernel takes stacked inputs where row `k·B + i` holds pair `k` in
//! environment `i`, and evaluates all rows in one flat pass. Normals point
//! from the second shape towards the first, i.e. the direction in which the
//! first shape is pushed.

use nalgebra::{DMatrix, DVector};

use crate::bodies::Entity;
use crate::collision::{CollisionPair, PairKind};
use crate::math::{stack_rows, BatchScalar, BatchVector, Vector2};
use crate::shapes::Shape;

/// Contact geometry of a batch of pair rows
#[derive(Debug, Clone, PartialEq)]
pub struct ContactBatch {
    /// Unit contact normal, pushing the first shape away from the second
    pub normal: BatchVector,

    /// Overlap depth; negative values are separations
    pub penetration: BatchScalar,

    /// World-space contact point
    pub point: BatchVector,
}

impl ContactBatch {
    fn zeros(rows: usize) -> Self {
        Self {
            normal: DMatrix::zeros(rows, 2),
            penetration: DVector::zeros(rows),
            point: DMatrix::zeros(rows, 2),
        }
    }

    pub fn len(&self) -> usize {
        self.penetration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.penetration.is_empty()
    }
}

/// Fallback contact normal for coincident centres
pub const FALLBACK_NORMAL: [f32; 2] = [1.0, 0.0];

#[inline]
fn unit_or_fallback(v: Vector2, min_dist: f32) -> (Vector2, f32) {
    let dist = v.norm();
    if dist <= min_dist {
        (Vector2::new(FALLBACK_NORMAL[0], FALLBACK_NORMAL[1]), dist)
    } else {
        (v / dist, dist)
    }
}

#[inline]
fn row(m: &BatchVector, i: usize) -> Vector2 {
    Vector2::new(m[(i, 0)], m[(i, 1)])
}

#[inline]
fn rotate(v: Vector2, angle: f32) -> Vector2 {
    let (s, c) = angle.sin_cos();
    Vector2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

#[inline]
fn write_row(m: &mut BatchVector, i: usize, v: Vector2) {
    m[(i, 0)] = v.x;
    m[(i, 1)] = v.y;
}

/// Circle against circle
pub fn sphere_sphere(
    pos_a: &BatchVector,
    radius_a: &BatchScalar,
    pos_b: &BatchVector,
    radius_b: &BatchScalar,
    min_dist: f32,
) -> ContactBatch {
    let rows = pos_a.nrows();
    let mut out = ContactBatch::zeros(rows);
    for i in 0..rows {
        let (normal, dist) = unit_or_fallback(row(pos_a, i) - row(pos_b, i), min_dist);
        out.penetration[i] = radius_a[i] + radius_b[i] - dist;
        write_row(&mut out.normal, i, normal);
        write_row(&mut out.point, i, row(pos_a, i) - normal * radius_a[i]);
    }
    out
}

/// Circle against oriented box, via the closest point in the box frame
pub fn sphere_box(
    center: &BatchVector,
    radius: &BatchScalar,
    box_pos: &BatchVector,
    box_rot: &BatchScalar,
    half_extents: &BatchVector,
    min_dist: f32,
) -> ContactBatch {
    let rows = center.nrows();
    let mut out = ContactBatch::zeros(rows);
    for i in 0..rows {
        let h = row(half_extents, i);
        let local = rotate(row(center, i) - row(box_pos, i), -box_rot[i]);
        let inside = local.x.abs() <= h.x && local.y.abs() <= h.y;

        let (local_normal, surface, penetration) = if inside {
            // Push out through the nearest face
            let gap_x = h.x - local.x.abs();
            let gap_y = h.y - local.y.abs();
            if gap_x <= gap_y {
                let sign = if local.x >= 0.0 { 1.0 } else { -1.0 };
                (Vector2::new(sign, 0.0), Vector2::new(sign * h.x, local.y), radius[i] + gap_x)
            } else {
                let sign = if local.y >= 0.0 { 1.0 } else { -1.0 };
                (Vector2::new(0.0, sign), Vector2::new(local.x, sign * h.y), radius[i] + gap_y)
            }
        } else {
            let closest = Vector2::new(local.x.clamp(-h.x, h.x), local.y.clamp(-h.y, h.y));
            let (normal, dist) = unit_or_fallback(local - closest, min_dist);
            (normal, closest, radius[i] - dist)
        };

        out.penetration[i] = penetration;
        write_row(&mut out.normal, i, rotate(local_normal, box_rot[i]));
        write_row(&mut out.point, i, row(box_pos, i) + rotate(surface, box_rot[i]));
    }
    out
}

/// Support point of an oriented box along `dir`; axes nearly orthogonal to
/// `dir` contribute their face centre rather than a corner.
#[inline]
fn box_support(pos: Vector2, axes: [Vector2; 2], h: Vector2, dir: Vector2) -> Vector2 {
    let pick = |axis: Vector2, extent: f32| {
        let d = axis.dot(&dir);
        if d.abs() < 1.0e-4 {
            Vector2::zeros()
        } else {
            axis * extent * d.signum()
        }
    };
    pos + pick(axes[0], h.x) + pick(axes[1], h.y)
}

#[inline]
fn box_axes(angle: f32) -> [Vector2; 2] {
    let (s, c) = angle.sin_cos();
    [Vector2::new(c, s), Vector2::new(-s, c)]
}

/// Oriented box against oriented box, via the separating-axis test over the
/// four face normals. The penetration is the smallest overlap; when the boxes
/// are apart it is minus the largest separating gap.
pub fn box_box(
    pos_a: &BatchVector,
    rot_a: &BatchScalar,
    half_a: &BatchVector,
    pos_b: &BatchVector,
    rot_b: &BatchScalar,
    half_b: &BatchVector,
) -> ContactBatch {
    let rows = pos_a.nrows();
    let mut out = ContactBatch::zeros(rows);
    for i in 0..rows {
        let (pa, pb) = (row(pos_a, i), row(pos_b, i));
        let (ha, hb) = (row(half_a, i), row(half_b, i));
        let axes_a = box_axes(rot_a[i]);
        let axes_b = box_axes(rot_b[i]);
        let d = pa - pb;

        let mut best_overlap = f32::INFINITY;
        let mut best_axis = Vector2::new(FALLBACK_NORMAL[0], FALLBACK_NORMAL[1]);
        for axis in axes_a.iter().chain(axes_b.iter()) {
            let ra = ha.x * axes_a[0].dot(axis).abs() + ha.y * axes_a[1].dot(axis).abs();
            let rb = hb.x * axes_b[0].dot(axis).abs() + hb.y * axes_b[1].dot(axis).abs();
            let proj = d.dot(axis);
            let overlap = ra + rb - proj.abs();
            if overlap < best_overlap {
                best_overlap = overlap;
                best_axis = if proj >= 0.0 { *axis } else { -*axis };
            }
        }

        let deepest_b = box_support(pb, axes_b, hb, best_axis);
        let deepest_a = box_support(pa, axes_a, ha, -best_axis);
        out.penetration[i] = best_overlap;
        write_row(&mut out.normal, i, best_axis);
        write_row(&mut out.point, i, (deepest_a + deepest_b) * 0.5);
    }
    out
}

fn stacked_pos<'a>(entities: impl Iterator<Item = &'a Entity>) -> BatchVector {
    let parts: Vec<&BatchVector> = entities.map(|e| e.state().pos()).collect();
    stack_rows(&parts)
}

fn stacked_rot<'a>(entities: impl Iterator<Item = &'a Entity> + Clone, batch_dim: usize) -> BatchScalar {
    let rows = entities.clone().count() * batch_dim;
    DVector::from_iterator(rows, entities.flat_map(|e| e.state().rot().iter().copied()))
}

fn stacked_radius<'a>(entities: impl Iterator<Item = &'a Entity> + Clone, batch_dim: usize) -> BatchScalar {
    let rows = entities.clone().count() * batch_dim;
    DVector::from_iterator(
        rows,
        entities.flat_map(|e| std::iter::repeat(e.shape().circumscribed_radius()).take(batch_dim)),
    )
}

fn stacked_half_extents<'a>(entities: impl Iterator<Item = &'a Entity> + Clone, batch_dim: usize) -> BatchVector {
    let extents: Vec<Vector2> = entities.map(|e| e.shape().half_extents()).collect();
    DMatrix::from_fn(extents.len() * batch_dim, 2, |r, c| extents[r / batch_dim][c])
}

/// Evaluates every pair of one shape group in a single stacked pass
pub fn detect_group(
    kind: PairKind,
    pairs: &[CollisionPair],
    entities: &[Entity],
    batch_dim: usize,
    min_dist: f32,
) -> ContactBatch {
    if pairs.is_empty() {
        return ContactBatch::zeros(0);
    }
    let firsts = pairs.iter().map(|p| &entities[p.entity_a.index()]);
    let seconds = pairs.iter().map(|p| &entities[p.entity_b.index()]);

    match kind {
        PairKind::SphereSphere => sphere_sphere(
            &stacked_pos(firsts.clone()),
            &stacked_radius(firsts, batch_dim),
            &stacked_pos(seconds.clone()),
            &stacked_radius(seconds, batch_dim),
            min_dist,
        ),
        PairKind::SphereBox => sphere_box(
            &stacked_pos(firsts.clone()),
            &stacked_radius(firsts, batch_dim),
            &stacked_pos(seconds.clone()),
            &stacked_rot(seconds.clone(), batch_dim),
            &stacked_half_extents(seconds, batch_dim),
            min_dist,
        ),
        PairKind::BoxBox => box_box(
            &stacked_pos(firsts.clone()),
            &stacked_rot(firsts.clone(), batch_dim),
            &stacked_half_extents(firsts, batch_dim),
            &stacked_pos(seconds.clone()),
            &stacked_rot(seconds.clone(), batch_dim),
            &stacked_half_extents(seconds, batch_dim),
        ),
    }
}

/// Contact geometry of a single pair across the batch, oriented so that the
/// normal pushes `a` away from `b`.
pub fn detect_pair(a: &Entity, b: &Entity, min_dist: f32) -> ContactBatch {
    let batch_dim = a.state().batch_dim();
    let one = DVector::from_element(batch_dim, 1.0);
    let rot = |e: &Entity| e.state().rot().clone();
    let half = |e: &Entity| {
        let h = e.shape().half_extents();
        DMatrix::from_fn(batch_dim, 2, |_, c| h[c])
    };
    let radius = |e: &Entity| &one * e.shape().circumscribed_radius();

    match (a.shape(), b.shape()) {
        (Shape::Sphere(_), Shape::Sphere(_)) => {
            sphere_sphere(a.state().pos(), &radius(a), b.state().pos(), &radius(b), min_dist)
        }
        (Shape::Sphere(_), Shape::Box(_)) => sphere_box(
            a.state().pos(),
            &radius(a),
            b.state().pos(),
            &rot(b),
            &half(b),
            min_dist,
        ),
        (Shape::Box(_), Shape::Sphere(_)) => {
            let mut flipped = sphere_box(
                b.state().pos(),
                &radius(b),
                a.state().pos(),
                &rot(a),
                &half(a),
                min_dist,
            );
            flipped.normal = -flipped.normal;
            flipped
        }
        (Shape::Box(_), Shape::Box(_)) => box_box(
            a.state().pos(),
            &rot(a),
            &half(a),
            b.state().pos(),
            &rot(b),
            &half(b),
        ),
    }
}
