use std::collections::HashMap;

use crate::bodies::Entity;
use crate::core::EntityId;
use crate::error::PhysicsError;
use crate::Result;

/// Ordered storage for the entities of one world.
///
/// Insertion order is the iteration order and never changes; ids are
/// positions in that order.
#[derive(Debug, Default, Clone)]
pub struct EntityStorage {
    items: Vec<Entity>,
    names: HashMap<String, EntityId>,
}

impl EntityStorage {
    /// Creates a new empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its id; fails on a duplicate name
    pub fn add(&mut self, entity: Entity) -> Result<EntityId> {
        if self.names.contains_key(entity.name()) {
            return Err(PhysicsError::Configuration(format!(
                "an entity named '{}' already exists",
                entity.name()
            )));
        }
        let id = EntityId(self.items.len());
        self.names.insert(entity.name().to_owned(), id);
        self.items.push(entity);
        Ok(id)
    }

    /// Gets an entity by its id, returning an error if not found
    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.items
            .get(id.0)
            .ok_or_else(|| PhysicsError::UnknownEntity(format!("no entity with id {}", id)))
    }

    /// Gets a mutable reference to an entity by its id, returning an error if not found
    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.items
            .get_mut(id.0)
            .ok_or_else(|| PhysicsError::UnknownEntity(format!("no entity with id {}", id)))
    }

    /// Looks up an id by entity name
    pub fn id_of(&self, name: &str) -> Result<EntityId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| PhysicsError::UnknownEntity(name.to_owned()))
    }

    /// Returns the number of entities in the storage
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.items.iter_mut()
    }
}
