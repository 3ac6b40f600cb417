//! DAO for a super type whose direct subclasses are persisted in their own tables.
//!
//! Hierarchy-wide operations (row queries, counts, table existence) fan out over
//! every sub-DAO and fold the results. Operations on one object, one identifier or
//! one explicit type are routed to exactly one DAO. Writes are never fanned out.
//!
//! A `PolymorphicDao` is itself a [`SingleTypeDao`], so a direct subclass that has
//! subclasses of its own is served by a nested `PolymorphicDao`.
//!
//! An object whose runtime type is the super type itself always goes to the local
//! DAO, even when the super type is abstract. An abstract super type has no local
//! slot in the fan-out though, so such rows are not seen by `query_for_all`,
//! `count_of` or the other hierarchy-wide operations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, Level, event, info_span};

use crate::core::{DaoError, FieldValues, Result, Value};
use crate::entity::{CreateOrUpdateStatus, Entity};
use crate::hierarchy::TypeHierarchy;

use super::combinator::{AllTrueCombinator, ListCombinator, SumCombinator};
use super::dao_set::DaoSet;
use super::fan_out::{
    CountOf, CountOfMatching, FanOutExecutor, QueryForAll, QueryForEq, QueryForFieldValues,
    TableExists,
};
use super::router::TypeRouter;
use super::{DaoHandle, DaoRegistry, SingleTypeDao};

pub struct PolymorphicDao<T: Entity> {
    super_type: String,
    hierarchy: Arc<TypeHierarchy>,
    local: DaoHandle<T>,
    dao_set: DaoSet<T>,
}

impl<T: Entity> PolymorphicDao<T> {
    /// Builds the DAO for `super_type`.
    ///
    /// `local` serves the super type's own table. The DAO of every declared direct
    /// subclass is obtained from `registry`, which creates and caches it if needed.
    pub async fn build(
        hierarchy: Arc<TypeHierarchy>,
        super_type: &str,
        local: DaoHandle<T>,
        registry: &dyn DaoRegistry<T>,
    ) -> Result<Self> {
        let span = info_span!("polymorphic_dao.build", super_type = %super_type);

        async move {
            hierarchy.require(super_type)?;
            if local.data_type() != super_type {
                return Err(DaoError::InvalidHierarchy(format!(
                    "local DAO manages '{}' but the super type is '{}'",
                    local.data_type(),
                    super_type
                )));
            }

            let dao_set = DaoSet::build(&hierarchy, super_type, registry).await?;
            event!(
                Level::DEBUG,
                slots = dao_set.len(),
                order = ?dao_set.entity_types(),
                "polymorphic dao ready"
            );

            Ok(Self {
                super_type: super_type.to_string(),
                hierarchy,
                local,
                dao_set,
            })
        }
        .instrument(span)
        .await
    }

    pub fn super_type(&self) -> &str {
        &self.super_type
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    pub fn dao_set(&self) -> &DaoSet<T> {
        &self.dao_set
    }

    /// DAO of the super type's own table.
    pub fn local(&self) -> &DaoHandle<T> {
        &self.local
    }

    fn router(&self) -> TypeRouter<'_, T> {
        TypeRouter::new(
            &self.super_type,
            &self.hierarchy,
            &self.dao_set,
            self.local.as_ref(),
        )
    }

    fn fan_out(&self) -> FanOutExecutor<'_, T> {
        FanOutExecutor::new(&self.dao_set, self.local.as_ref())
    }

    /// Target of an identifier operation called without an entity type.
    ///
    /// An identifier carries no runtime type, so this is only unambiguous when no
    /// sub-DAO exists.
    fn untyped_target(&self, operation: &'static str) -> Result<&dyn SingleTypeDao<T>> {
        if self.dao_set.has_delegates() {
            event!(
                Level::DEBUG,
                operation,
                super_type = %self.super_type,
                "identifier operation without entity type rejected"
            );
            return Err(DaoError::RoutingTypeRequired(operation));
        }
        Ok(self.local.as_ref())
    }
}

impl<T: Entity> fmt::Debug for PolymorphicDao<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicDao")
            .field("super_type", &self.super_type)
            .field("dao_set", &self.dao_set)
            .finish()
    }
}

#[async_trait]
impl<T: Entity> SingleTypeDao<T> for PolymorphicDao<T> {
    fn data_type(&self) -> &str {
        &self.super_type
    }

    async fn query_for_all(&self) -> Result<Vec<T>> {
        self.fan_out()
            .run(&QueryForAll, &ListCombinator::<T>::new(), Vec::new())
            .await
    }

    async fn query_for_eq(&self, field: &str, value: &Value) -> Result<Vec<T>> {
        let operation = QueryForEq { field, value };
        self.fan_out()
            .run(&operation, &ListCombinator::<T>::new(), Vec::new())
            .await
    }

    async fn query_for_field_values(&self, values: &FieldValues) -> Result<Vec<T>> {
        let operation = QueryForFieldValues {
            values,
            bind_args: false,
        };
        self.fan_out()
            .run(&operation, &ListCombinator::<T>::new(), Vec::new())
            .await
    }

    async fn query_for_field_values_args(&self, values: &FieldValues) -> Result<Vec<T>> {
        let operation = QueryForFieldValues {
            values,
            bind_args: true,
        };
        self.fan_out()
            .run(&operation, &ListCombinator::<T>::new(), Vec::new())
            .await
    }

    async fn query_for_id(&self, id: &Value) -> Result<Option<T>> {
        self.untyped_target("query_for_id")?.query_for_id(id).await
    }

    async fn query_for_id_of(&self, id: &Value, entity_type: &str) -> Result<Option<T>> {
        self.router()
            .resolve(entity_type)?
            .query_for_id_of(id, entity_type)
            .await
    }

    async fn query_for_matching(&self, example: &T) -> Result<Vec<T>> {
        self.router()
            .resolve_entity(example)?
            .query_for_matching(example)
            .await
    }

    async fn query_for_matching_args(&self, example: &T) -> Result<Vec<T>> {
        self.router()
            .resolve_entity(example)?
            .query_for_matching_args(example)
            .await
    }

    async fn query_for_same_id(&self, data: &T) -> Result<Option<T>> {
        self.router()
            .resolve_entity(data)?
            .query_for_same_id(data)
            .await
    }

    async fn create(&self, data: &mut T) -> Result<usize> {
        let dao = self.router().resolve_entity(data)?;
        dao.create(data).await
    }

    async fn create_if_not_exists(&self, data: &T) -> Result<T> {
        self.router()
            .resolve_entity(data)?
            .create_if_not_exists(data)
            .await
    }

    async fn create_or_update(&self, data: &mut T) -> Result<CreateOrUpdateStatus> {
        let dao = self.router().resolve_entity(data)?;
        dao.create_or_update(data).await
    }

    async fn update(&self, data: &T) -> Result<usize> {
        self.router().resolve_entity(data)?.update(data).await
    }

    async fn update_id(&self, data: &T, new_id: &Value) -> Result<usize> {
        self.router()
            .resolve_entity(data)?
            .update_id(data, new_id)
            .await
    }

    async fn refresh(&self, data: &mut T) -> Result<usize> {
        let dao = self.router().resolve_entity(data)?;
        dao.refresh(data).await
    }

    async fn delete(&self, data: &T) -> Result<usize> {
        self.router().resolve_entity(data)?.delete(data).await
    }

    async fn delete_by_id(&self, id: &Value) -> Result<usize> {
        self.untyped_target("delete_by_id")?.delete_by_id(id).await
    }

    async fn delete_by_id_of(&self, id: &Value, entity_type: &str) -> Result<usize> {
        self.router()
            .resolve(entity_type)?
            .delete_by_id_of(id, entity_type)
            .await
    }

    async fn delete_all(&self, datas: &[T]) -> Result<usize> {
        match self.router().resolve_batch(datas)? {
            Some(dao) => dao.delete_all(datas).await,
            None => Ok(0),
        }
    }

    async fn delete_ids(&self, ids: &[Value]) -> Result<usize> {
        self.untyped_target("delete_ids")?.delete_ids(ids).await
    }

    async fn delete_ids_of(&self, ids: &[Value], entity_type: &str) -> Result<usize> {
        self.router()
            .resolve(entity_type)?
            .delete_ids_of(ids, entity_type)
            .await
    }

    async fn count_of(&self) -> Result<u64> {
        self.fan_out().run(&CountOf, &SumCombinator, 0).await
    }

    async fn count_of_matching(&self, values: &FieldValues) -> Result<u64> {
        self.fan_out()
            .run(&CountOfMatching { values }, &SumCombinator, 0)
            .await
    }

    async fn is_table_exists(&self) -> Result<bool> {
        self.fan_out()
            .run(&TableExists, &AllTrueCombinator, true)
            .await
    }

    async fn id_exists(&self, id: &Value) -> Result<bool> {
        self.untyped_target("id_exists")?.id_exists(id).await
    }

    async fn id_exists_of(&self, id: &Value, entity_type: &str) -> Result<bool> {
        self.router()
            .resolve(entity_type)?
            .id_exists_of(id, entity_type)
            .await
    }

    fn object_to_string(&self, data: &T) -> Result<String> {
        self.router().resolve_entity(data)?.object_to_string(data)
    }

    fn objects_equal(&self, first: &T, second: &T) -> Result<bool> {
        if first.type_name() != second.type_name() {
            return Ok(false);
        }
        self.router()
            .resolve_entity(first)?
            .objects_equal(first, second)
    }

    async fn assign_empty_foreign_collection(&self, parent: &mut T, field: &str) -> Result<()> {
        let dao = self.router().resolve_entity(parent)?;
        dao.assign_empty_foreign_collection(parent, field).await
    }
}
