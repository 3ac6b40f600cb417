//! Columns whose value is derived from the entity at write time instead of
//! being a field of it.

use std::fmt;
use std::sync::Arc;

use crate::core::{DaoError, Result, Value};

/// Suffix of a column holding the id of a referenced object.
pub const FOREIGN_ID_FIELD_SUFFIX: &str = "_id";

/// Suffix of the shadow column holding the runtime type of a referenced object.
pub const FOREIGN_CLASS_FIELD_SUFFIX: &str = "_class";

pub type ValueDerivation<T> = Arc<dyn Fn(&T) -> Option<Value> + Send + Sync>;

pub struct DerivedField<T> {
    column_name: String,
    derive: ValueDerivation<T>,
}

impl<T> DerivedField<T> {
    pub fn new<F>(column_name: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            column_name: column_name.into(),
            derive: Arc::new(derive),
        }
    }

    /// Shadow column storing the runtime type name of the object referenced by
    /// `foreign_id_column`. `owner_id` gets the shadow column `owner_class`.
    ///
    /// `resolver` returns the referenced object's type name, or `None` when the
    /// reference is empty.
    pub fn class_shadow<F>(foreign_id_column: &str, resolver: F) -> Result<Self>
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        let column_name = class_column_name(foreign_id_column)?;
        Ok(Self::new(column_name, move |entity| {
            resolver(entity).map(Value::Text)
        }))
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Value written to the column for `entity`; `Null` when nothing is derived.
    pub fn value_for(&self, entity: &T) -> Value {
        (self.derive)(entity).unwrap_or(Value::Null)
    }
}

impl<T> Clone for DerivedField<T> {
    fn clone(&self) -> Self {
        Self {
            column_name: self.column_name.clone(),
            derive: Arc::clone(&self.derive),
        }
    }
}

impl<T> fmt::Debug for DerivedField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedField")
            .field("column_name", &self.column_name)
            .finish_non_exhaustive()
    }
}

/// Name of the shadow type column paired with a foreign id column.
pub fn class_column_name(foreign_id_column: &str) -> Result<String> {
    match foreign_id_column.strip_suffix(FOREIGN_ID_FIELD_SUFFIX) {
        Some(base) if !base.is_empty() => Ok(format!("{}{}", base, FOREIGN_CLASS_FIELD_SUFFIX)),
        _ => Err(DaoError::Config(format!(
            "foreign column '{}' does not end with '{}'",
            foreign_id_column, FOREIGN_ID_FIELD_SUFFIX
        ))),
    }
}
