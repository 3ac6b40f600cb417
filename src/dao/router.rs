//! Selects the single DAO responsible for one entity type.

use tracing::{Level, event};

use crate::core::{DaoError, Result};
use crate::entity::Entity;
use crate::hierarchy::TypeHierarchy;

use super::dao_set::{DaoSet, DaoTarget};
use super::SingleTypeDao;

pub struct TypeRouter<'a, T: Entity> {
    super_type: &'a str,
    hierarchy: &'a TypeHierarchy,
    dao_set: &'a DaoSet<T>,
    local: &'a dyn SingleTypeDao<T>,
}

impl<'a, T: Entity> TypeRouter<'a, T> {
    pub fn new(
        super_type: &'a str,
        hierarchy: &'a TypeHierarchy,
        dao_set: &'a DaoSet<T>,
        local: &'a dyn SingleTypeDao<T>,
    ) -> Self {
        Self {
            super_type,
            hierarchy,
            dao_set,
            local,
        }
    }

    /// Resolves the DAO for `routing_key`.
    ///
    /// The super type itself goes to the local DAO without looking at the set.
    /// Any other key goes to the first delegate slot whose type is the key or one
    /// of its ancestors; local slots never match here.
    pub fn resolve(&self, routing_key: &str) -> Result<&'a dyn SingleTypeDao<T>> {
        if routing_key == self.super_type {
            event!(Level::DEBUG, entity_type = routing_key, "routed to local dao");
            return Ok(self.local);
        }

        for slot in self.dao_set.slots() {
            let DaoTarget::Delegate(dao) = slot.target() else {
                continue;
            };
            if self
                .hierarchy
                .is_assignable_from(slot.entity_type(), routing_key)
            {
                event!(
                    Level::DEBUG,
                    entity_type = routing_key,
                    target = slot.entity_type(),
                    "routed to sub dao"
                );
                return Ok(dao.as_ref());
            }
        }

        Err(DaoError::NoMatchingSubtype {
            super_type: self.super_type.to_string(),
            requested: routing_key.to_string(),
        })
    }

    /// Resolves the DAO for the runtime type of `data`.
    pub fn resolve_entity(&self, data: &T) -> Result<&'a dyn SingleTypeDao<T>> {
        self.resolve(data.type_name())
    }

    /// Resolves the DAO shared by every object of a batch.
    ///
    /// Returns `None` for an empty batch. Fails before resolving anything when the
    /// batch mixes entity types.
    pub fn resolve_batch(&self, datas: &[T]) -> Result<Option<&'a dyn SingleTypeDao<T>>> {
        let Some((first, rest)) = datas.split_first() else {
            return Ok(None);
        };
        if let Some(other) = rest
            .iter()
            .find(|data| data.type_name() != first.type_name())
        {
            return Err(DaoError::HeterogeneousBatch {
                first: first.type_name().to_string(),
                other: other.type_name().to_string(),
            });
        }
        self.resolve_entity(first).map(Some)
    }
}
