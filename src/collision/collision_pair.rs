use crate::bodies::Entity;
use crate::collision::CollisionFilter;
use crate::core::EntityId;
use crate::shapes::Shape;

/// Shape combination of a pair; decides which narrow-phase kernel runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairKind {
    SphereSphere,
    SphereBox,
    BoxBox,
}

/// A pair of entities that could potentially collide.
///
/// For [`PairKind::SphereBox`] `entity_a` is always the sphere. Otherwise the
/// lower id comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
}

impl CollisionPair {
    /// Orders two entities canonically and classifies their shapes
    pub fn classify(a: &Entity, b: &Entity) -> (PairKind, Self) {
        let (lo, hi) = if a.id() <= b.id() { (a, b) } else { (b, a) };
        match (lo.shape(), hi.shape()) {
            (Shape::Sphere(_), Shape::Sphere(_)) => (PairKind::SphereSphere, Self::new(lo.id(), hi.id())),
            (Shape::Box(_), Shape::Box(_)) => (PairKind::BoxBox, Self::new(lo.id(), hi.id())),
            (Shape::Sphere(_), Shape::Box(_)) => (PairKind::SphereBox, Self::new(lo.id(), hi.id())),
            (Shape::Box(_), Shape::Sphere(_)) => (PairKind::SphereBox, Self::new(hi.id(), lo.id())),
        }
    }

    fn new(entity_a: EntityId, entity_b: EntityId) -> Self {
        Self { entity_a, entity_b }
    }
}

/// Candidate pairs of one step, grouped by shape combination
#[derive(Debug, Default, Clone)]
pub struct PairSet {
    pub sphere_sphere: Vec<CollisionPair>,
    pub sphere_box: Vec<CollisionPair>,
    pub box_box: Vec<CollisionPair>,
}

impl PairSet {
    /// Enumerates every unordered pair admitted by `filter`
    pub fn collect(entities: &[Entity], filter: &dyn CollisionFilter) -> Self {
        let mut set = Self::default();
        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                if !filter.should_collide(a, b) {
                    continue;
                }
                let (kind, pair) = CollisionPair::classify(a, b);
                set.group_mut(kind).push(pair);
            }
        }
        set
    }

    pub fn group(&self, kind: PairKind) -> &[CollisionPair] {
        match kind {
            PairKind::SphereSphere => &self.sphere_sphere,
            PairKind::SphereBox => &self.sphere_box,
            PairKind::BoxBox => &self.box_box,
        }
    }

    fn group_mut(&mut self, kind: PairKind) -> &mut Vec<CollisionPair> {
        match kind {
            PairKind::SphereSphere => &mut self.sphere_sphere,
            PairKind::SphereBox => &mut self.sphere_box,
            PairKind::BoxBox => &mut self.box_box,
        }
    }

    pub fn len(&self) -> usize {
        self.sphere_sphere.len() + self.sphere_box.len() + self.box_box.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
