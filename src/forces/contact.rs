use nalgebra::DVector;

use crate::bodies::Entity;
use crate::collision::{
    detect_group, CollisionFilter, ContactModel, GroupMaskFilter, PairKind, PairSet,
};
use crate::core::WorldConfig;
use crate::forces::{ForceAccumulator, ForceGenerator};
use crate::math::cross2;
use crate::shapes::Shape;

/// Contact normals on a circle pass through its centre, so only rotatable
/// boxes receive contact torque.
#[inline]
fn picks_up_torque(entity: &Entity) -> bool {
    entity.is_rotatable() && matches!(entity.shape(), Shape::Box(_))
}

/// Penalty contact forces between every admissible pair.
///
/// Pairs are grouped by shape combination and each group is evaluated in one
/// stacked narrow-phase pass. Each overlapping pair receives equal and
/// opposite forces at the contact point; rotatable boxes also pick up the
/// resulting torque.
#[derive(Debug)]
pub struct ContactForce {
    filter: Box<dyn CollisionFilter>,
}

impl ContactForce {
    pub fn new(filter: Box<dyn CollisionFilter>) -> Self {
        Self { filter }
    }

    fn apply_group(
        &self,
        kind: PairKind,
        pairs: &PairSet,
        entities: &[Entity],
        config: &WorldConfig,
        forces: &mut ForceAccumulator,
    ) {
        let group = pairs.group(kind);
        if group.is_empty() {
            return;
        }
        let batch_dim = entities[group[0].entity_a.index()].state().batch_dim();
        let contacts = detect_group(kind, group, entities, batch_dim, config.min_collision_distance);

        let factors: Vec<f32> = group
            .iter()
            .map(|p| {
                ContactModel::elasticity_factor(
                    entities[p.entity_a.index()].elasticity(),
                    entities[p.entity_b.index()].elasticity(),
                )
            })
            .collect();
        let factor = DVector::from_fn(contacts.len(), |r, _| factors[r / batch_dim]);
        let stacked = config.contact.forces(&contacts, &factor);

        for (k, pair) in group.iter().enumerate() {
            let rows = k * batch_dim;
            let penetration = contacts.penetration.rows(rows, batch_dim);
            if penetration.iter().all(|&p| p <= 0.0) {
                continue;
            }
            let force = stacked.rows(rows, batch_dim).into_owned();
            let point = contacts.point.rows(rows, batch_dim).into_owned();
            let (a, b) = (pair.entity_a.index(), pair.entity_b.index());

            forces.add_force(a, &force);
            forces.add_force(b, &(-&force));

            if picks_up_torque(&entities[a]) {
                let arm = &point - entities[a].state().pos();
                forces.add_torque(a, &cross2(&arm, &force));
            }
            if picks_up_torque(&entities[b]) {
                let arm = &point - entities[b].state().pos();
                forces.add_torque(b, &cross2(&arm, &(-&force)));
            }
        }
    }
}

impl Default for ContactForce {
    fn default() -> Self {
        Self::new(Box::new(GroupMaskFilter::new()))
    }
}

impl ForceGenerator for ContactForce {
    fn generator_type(&self) -> &'static str {
        "Contact"
    }

    fn apply_forces(&self, entities: &[Entity], config: &WorldConfig, forces: &mut ForceAccumulator) {
        let pairs = PairSet::collect(entities, self.filter.as_ref());
        if pairs.is_empty() {
            return;
        }
        for kind in [PairKind::SphereSphere, PairKind::SphereBox, PairKind::BoxBox] {
            self.apply_group(kind, &pairs, entities, config, forces);
        }
    }
}
