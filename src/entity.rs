use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{DaoError, Result, Value};

/// Value type of an entity hierarchy.
///
/// One Rust type represents the whole hierarchy (usually an enum with a variant per
/// persisted type); [`Entity::type_name`] carries the runtime type used for routing.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Runtime entity type of this value. Must be declared in the `TypeHierarchy`.
    fn type_name(&self) -> &str;

    /// Identifier, `Value::Null` while not yet assigned.
    fn id(&self) -> Value;

    fn set_id(&mut self, id: Value);

    /// Column name of the identifier.
    fn id_field(&self) -> &'static str {
        "id"
    }

    /// Persisted non-id columns.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    fn field(&self, name: &str) -> Option<Value> {
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Assigns an empty collection to the named collection field.
    fn assign_empty_collection(&mut self, field: &str) -> Result<()> {
        Err(DaoError::UnknownField {
            entity_type: self.type_name().to_string(),
            field: field.to_string(),
        })
    }
}

/// Outcome of `create_or_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrUpdateStatus {
    pub created: bool,
    pub updated: bool,
    pub lines_changed: usize,
}

impl CreateOrUpdateStatus {
    pub fn created(lines_changed: usize) -> Self {
        Self {
            created: true,
            updated: false,
            lines_changed,
        }
    }

    pub fn updated(lines_changed: usize) -> Self {
        Self {
            created: false,
            updated: true,
            lines_changed,
        }
    }
}
