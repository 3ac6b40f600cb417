use std::fmt;

use crate::core::{DaoError, Result};
use crate::entity::Entity;
use crate::hierarchy::TypeHierarchy;

use super::{DaoHandle, DaoRegistry};

/// Who handles a slot of a [`DaoSet`].
pub enum DaoTarget<T: Entity> {
    /// The super type's own table, served by the polymorphic DAO's local DAO.
    Local,
    /// A direct subclass, served by the DAO obtained from the registry.
    Delegate(DaoHandle<T>),
}

pub struct DaoSlot<T: Entity> {
    entity_type: String,
    target: DaoTarget<T>,
}

impl<T: Entity> DaoSlot<T> {
    pub fn local(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            target: DaoTarget::Local,
        }
    }

    pub fn delegate(entity_type: impl Into<String>, dao: DaoHandle<T>) -> Self {
        Self {
            entity_type: entity_type.into(),
            target: DaoTarget::Delegate(dao),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn target(&self) -> &DaoTarget<T> {
        &self.target
    }

    pub fn is_local(&self) -> bool {
        matches!(self.target, DaoTarget::Local)
    }
}

impl<T: Entity> fmt::Debug for DaoSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            DaoTarget::Local => "local",
            DaoTarget::Delegate(_) => "delegate",
        };
        f.debug_struct("DaoSlot")
            .field("entity_type", &self.entity_type)
            .field("target", &target)
            .finish()
    }
}

/// Ordered DAOs of one super type's hierarchy level.
///
/// Holds one delegate slot per declared direct subclass, in declaration order,
/// followed by a single local slot when the super type is concrete. The slot
/// order is the fan-out order. The set is never modified after it is built.
#[derive(Debug)]
pub struct DaoSet<T: Entity> {
    slots: Vec<DaoSlot<T>>,
}

impl<T: Entity> DaoSet<T> {
    pub async fn build(
        hierarchy: &TypeHierarchy,
        super_type: &str,
        registry: &dyn DaoRegistry<T>,
    ) -> Result<Self> {
        let declared = hierarchy.require(super_type)?;
        let mut slots = Vec::with_capacity(declared.direct_subclasses.len() + 1);

        for subclass in &declared.direct_subclasses {
            let dao = registry.get_or_create(subclass).await?;
            if dao.data_type() != subclass {
                return Err(DaoError::InvalidHierarchy(format!(
                    "registry returned a DAO for '{}' when asked for '{}'",
                    dao.data_type(),
                    subclass
                )));
            }
            slots.push(DaoSlot::delegate(subclass.clone(), dao));
        }

        if declared.is_concrete() {
            slots.push(DaoSlot::local(super_type));
        }

        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[DaoSlot<T>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_delegates(&self) -> bool {
        self.slots.iter().any(|slot| !slot.is_local())
    }

    /// Delegate DAO registered for exactly `entity_type`.
    pub fn handle_for(&self, entity_type: &str) -> Option<&DaoHandle<T>> {
        self.slots
            .iter()
            .find(|slot| slot.entity_type == entity_type)
            .and_then(|slot| match &slot.target {
                DaoTarget::Delegate(dao) => Some(dao),
                DaoTarget::Local => None,
            })
    }

    /// Entity types in fan-out order.
    pub fn entity_types(&self) -> Vec<&str> {
        self.slots.iter().map(DaoSlot::entity_type).collect()
    }
}
