//! Data-access traits and the polymorphic dispatch layer built on top of them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{DaoError, FieldValues, Result, Value};
use crate::entity::{CreateOrUpdateStatus, Entity};

pub mod combinator;
pub mod dao_set;
pub mod fan_out;
pub mod polymorphic;
pub mod router;

pub use combinator::{AllTrueCombinator, Combinator, Fold, ListCombinator, SumCombinator};
pub use dao_set::{DaoSet, DaoSlot, DaoTarget};
pub use fan_out::{FanOutExecutor, FanOutOperation};
pub use polymorphic::PolymorphicDao;
pub use router::TypeRouter;

/// Shared handle to a DAO, as handed out by a [`DaoRegistry`].
pub type DaoHandle<T> = Arc<dyn SingleTypeDao<T>>;

/// Data access for the rows of one entity type.
///
/// Every operation may fail with a storage error, which the dispatch layer
/// propagates unchanged.
#[async_trait]
pub trait SingleTypeDao<T: Entity>: Send + Sync {
    /// Entity type managed by this DAO.
    fn data_type(&self) -> &str;

    async fn query_for_all(&self) -> Result<Vec<T>>;

    async fn query_for_eq(&self, field: &str, value: &Value) -> Result<Vec<T>>;

    async fn query_for_field_values(&self, values: &FieldValues) -> Result<Vec<T>>;

    /// Same as `query_for_field_values`, with values bound as statement arguments.
    async fn query_for_field_values_args(&self, values: &FieldValues) -> Result<Vec<T>>;

    async fn query_for_id(&self, id: &Value) -> Result<Option<T>>;

    async fn query_for_id_of(&self, id: &Value, entity_type: &str) -> Result<Option<T>> {
        self.ensure_own_type(entity_type)?;
        self.query_for_id(id).await
    }

    async fn query_for_matching(&self, example: &T) -> Result<Vec<T>>;

    async fn query_for_matching_args(&self, example: &T) -> Result<Vec<T>>;

    async fn query_for_same_id(&self, data: &T) -> Result<Option<T>>;

    /// Inserts `data`, assigning a generated id when its id is `Null`.
    async fn create(&self, data: &mut T) -> Result<usize>;

    /// Returns the stored row with the same id, or inserts `data` and returns it.
    async fn create_if_not_exists(&self, data: &T) -> Result<T>;

    async fn create_or_update(&self, data: &mut T) -> Result<CreateOrUpdateStatus>;

    async fn update(&self, data: &T) -> Result<usize>;

    async fn update_id(&self, data: &T, new_id: &Value) -> Result<usize>;

    /// Reloads `data` from its stored row.
    async fn refresh(&self, data: &mut T) -> Result<usize>;

    async fn delete(&self, data: &T) -> Result<usize>;

    async fn delete_by_id(&self, id: &Value) -> Result<usize>;

    async fn delete_by_id_of(&self, id: &Value, entity_type: &str) -> Result<usize> {
        self.ensure_own_type(entity_type)?;
        self.delete_by_id(id).await
    }

    async fn delete_all(&self, datas: &[T]) -> Result<usize>;

    async fn delete_ids(&self, ids: &[Value]) -> Result<usize>;

    async fn delete_ids_of(&self, ids: &[Value], entity_type: &str) -> Result<usize> {
        self.ensure_own_type(entity_type)?;
        self.delete_ids(ids).await
    }

    async fn count_of(&self) -> Result<u64>;

    async fn count_of_matching(&self, values: &FieldValues) -> Result<u64>;

    async fn is_table_exists(&self) -> Result<bool>;

    async fn id_exists(&self, id: &Value) -> Result<bool>;

    async fn id_exists_of(&self, id: &Value, entity_type: &str) -> Result<bool> {
        self.ensure_own_type(entity_type)?;
        self.id_exists(id).await
    }

    fn object_to_string(&self, data: &T) -> Result<String>;

    fn objects_equal(&self, first: &T, second: &T) -> Result<bool>;

    async fn assign_empty_foreign_collection(&self, parent: &mut T, field: &str) -> Result<()>;

    /// Rejects explicit entity types this DAO does not manage.
    fn ensure_own_type(&self, entity_type: &str) -> Result<()> {
        if entity_type == self.data_type() {
            Ok(())
        } else {
            Err(DaoError::NoMatchingSubtype {
                super_type: self.data_type().to_string(),
                requested: entity_type.to_string(),
            })
        }
    }
}

/// Looks up, or lazily creates, the DAO for an entity type.
#[async_trait]
pub trait DaoRegistry<T: Entity>: Send + Sync {
    /// Repeated calls for the same type return the same handle.
    async fn get_or_create(&self, entity_type: &str) -> Result<DaoHandle<T>>;
}
