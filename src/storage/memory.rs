use std::fmt::Write;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockMappedWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use tracing::{Level, event};

use crate::core::{DaoError, FieldValues, Result, Value};
use crate::dao::SingleTypeDao;
use crate::entity::{CreateOrUpdateStatus, Entity};
use crate::field::DerivedField;

use super::table::EntityTable;

/// In-memory [`SingleTypeDao`] storing the rows of exactly one entity type.
///
/// The table starts out missing unless built with [`MemoryDao::with_table`];
/// every operation except `is_table_exists` fails with `TableNotFound` until
/// [`MemoryDao::create_table`] is called.
pub struct MemoryDao<T: Entity> {
    entity_type: String,
    table_name: String,
    table: RwLock<Option<EntityTable<T>>>,
    derived_fields: Vec<DerivedField<T>>,
}

impl<T: Entity> MemoryDao<T> {
    pub fn new(entity_type: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            table_name: table_name.into(),
            table: RwLock::new(None),
            derived_fields: Vec::new(),
        }
    }

    /// Starts with an empty table already created.
    pub fn with_table(mut self) -> Self {
        self.table = RwLock::new(Some(EntityTable::new(self.table_name.clone())));
        self
    }

    /// Adds a derived column that queries can filter on.
    pub fn with_derived_field(mut self, field: DerivedField<T>) -> Self {
        self.derived_fields.push(field);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates the table. Returns `false` when it already exists.
    pub async fn create_table(&self) -> bool {
        let mut table = self.table.write().await;
        if table.is_some() {
            return false;
        }
        *table = Some(EntityTable::new(self.table_name.clone()));
        event!(Level::DEBUG, table = %self.table_name, "table created");
        true
    }

    /// Drops the table and its rows. Returns `false` when it did not exist.
    pub async fn drop_table(&self) -> bool {
        let dropped = self.table.write().await.take().is_some();
        if dropped {
            event!(Level::DEBUG, table = %self.table_name, "table dropped");
        }
        dropped
    }

    async fn table(&self) -> Result<RwLockReadGuard<'_, EntityTable<T>>> {
        RwLockReadGuard::try_map(self.table.read().await, Option::as_ref)
            .map_err(|_| DaoError::TableNotFound(self.table_name.clone()))
    }

    async fn table_mut(&self) -> Result<RwLockMappedWriteGuard<'_, EntityTable<T>>> {
        RwLockWriteGuard::try_map(self.table.write().await, Option::as_mut)
            .map_err(|_| DaoError::TableNotFound(self.table_name.clone()))
    }

    fn column_value(&self, row: &T, column: &str) -> Option<Value> {
        if column == row.id_field() {
            return Some(row.id());
        }
        if let Some(derived) = self
            .derived_fields
            .iter()
            .find(|field| field.column_name() == column)
        {
            return Some(derived.value_for(row));
        }
        row.field(column)
    }

    fn matches(&self, row: &T, values: &FieldValues) -> bool {
        values
            .iter()
            .all(|(column, value)| self.column_value(row, column).as_ref() == Some(value))
    }

    async fn select(&self, values: &FieldValues) -> Result<Vec<T>> {
        let table = self.table().await?;
        Ok(table
            .rows()
            .filter(|row| self.matches(row, values))
            .cloned()
            .collect())
    }

    /// Id column plus every non-null field of `example`.
    fn example_values(example: &T) -> FieldValues {
        let mut values = FieldValues::new();
        let id = example.id();
        if !id.is_null() {
            values.insert(example.id_field().to_string(), id);
        }
        for (field, value) in example.fields() {
            if !value.is_null() {
                values.insert(field.to_string(), value);
            }
        }
        values
    }

    fn require_id(&self, data: &T, operation: &str) -> Result<Value> {
        let id = data.id();
        if id.is_null() {
            return Err(DaoError::ConstraintViolation(format!(
                "cannot {} a '{}' without an id",
                operation,
                data.type_name()
            )));
        }
        Ok(id)
    }

    fn insert_row(table: &mut EntityTable<T>, data: &mut T) -> Result<()> {
        if data.id().is_null() {
            data.set_id(table.next_generated_id()?);
        }
        table.insert(data.clone())
    }
}

#[async_trait]
impl<T: Entity> SingleTypeDao<T> for MemoryDao<T> {
    fn data_type(&self) -> &str {
        &self.entity_type
    }

    async fn query_for_all(&self) -> Result<Vec<T>> {
        let table = self.table().await?;
        Ok(table.rows().cloned().collect())
    }

    async fn query_for_eq(&self, field: &str, value: &Value) -> Result<Vec<T>> {
        let mut values = FieldValues::new();
        values.insert(field.to_string(), value.clone());
        self.select(&values).await
    }

    async fn query_for_field_values(&self, values: &FieldValues) -> Result<Vec<T>> {
        self.select(values).await
    }

    // Values are compared directly, so binding them as arguments changes nothing here.
    async fn query_for_field_values_args(&self, values: &FieldValues) -> Result<Vec<T>> {
        self.select(values).await
    }

    async fn query_for_id(&self, id: &Value) -> Result<Option<T>> {
        let table = self.table().await?;
        Ok(table.get(id).cloned())
    }

    async fn query_for_matching(&self, example: &T) -> Result<Vec<T>> {
        self.select(&Self::example_values(example)).await
    }

    async fn query_for_matching_args(&self, example: &T) -> Result<Vec<T>> {
        self.select(&Self::example_values(example)).await
    }

    async fn query_for_same_id(&self, data: &T) -> Result<Option<T>> {
        let id = data.id();
        if id.is_null() {
            return Ok(None);
        }
        self.query_for_id(&id).await
    }

    async fn create(&self, data: &mut T) -> Result<usize> {
        self.ensure_own_type(data.type_name())?;
        let mut table = self.table_mut().await?;
        Self::insert_row(&mut table, data)?;
        Ok(1)
    }

    async fn create_if_not_exists(&self, data: &T) -> Result<T> {
        self.ensure_own_type(data.type_name())?;
        let mut table = self.table_mut().await?;
        if let Some(existing) = table.get(&data.id()) {
            return Ok(existing.clone());
        }
        let mut created = data.clone();
        Self::insert_row(&mut table, &mut created)?;
        Ok(created)
    }

    async fn create_or_update(&self, data: &mut T) -> Result<CreateOrUpdateStatus> {
        self.ensure_own_type(data.type_name())?;
        let mut table = self.table_mut().await?;
        if !data.id().is_null() && table.replace(data.clone()) {
            return Ok(CreateOrUpdateStatus::updated(1));
        }
        Self::insert_row(&mut table, data)?;
        Ok(CreateOrUpdateStatus::created(1))
    }

    async fn update(&self, data: &T) -> Result<usize> {
        self.ensure_own_type(data.type_name())?;
        self.require_id(data, "update")?;
        let mut table = self.table_mut().await?;
        Ok(usize::from(table.replace(data.clone())))
    }

    async fn update_id(&self, data: &T, new_id: &Value) -> Result<usize> {
        self.ensure_own_type(data.type_name())?;
        let old_id = self.require_id(data, "update the id of")?;
        let mut table = self.table_mut().await?;
        Ok(usize::from(table.rekey(&old_id, new_id)?))
    }

    async fn refresh(&self, data: &mut T) -> Result<usize> {
        let id = self.require_id(data, "refresh")?;
        let table = self.table().await?;
        match table.get(&id) {
            Some(stored) => {
                *data = stored.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, data: &T) -> Result<usize> {
        let id = self.require_id(data, "delete")?;
        self.delete_by_id(&id).await
    }

    async fn delete_by_id(&self, id: &Value) -> Result<usize> {
        let mut table = self.table_mut().await?;
        Ok(usize::from(table.remove(id).is_some()))
    }

    async fn delete_all(&self, datas: &[T]) -> Result<usize> {
        let ids = datas
            .iter()
            .map(|data| self.require_id(data, "delete"))
            .collect::<Result<Vec<_>>>()?;
        self.delete_ids(&ids).await
    }

    async fn delete_ids(&self, ids: &[Value]) -> Result<usize> {
        let mut table = self.table_mut().await?;
        Ok(ids.iter().filter(|id| table.remove(id).is_some()).count())
    }

    async fn count_of(&self) -> Result<u64> {
        let table = self.table().await?;
        Ok(table.len() as u64)
    }

    async fn count_of_matching(&self, values: &FieldValues) -> Result<u64> {
        let table = self.table().await?;
        Ok(table.rows().filter(|row| self.matches(row, values)).count() as u64)
    }

    async fn is_table_exists(&self) -> Result<bool> {
        Ok(self.table.read().await.is_some())
    }

    async fn id_exists(&self, id: &Value) -> Result<bool> {
        let table = self.table().await?;
        Ok(table.contains(id))
    }

    fn object_to_string(&self, data: &T) -> Result<String> {
        let mut rendered = format!("{} {}={}", data.type_name(), data.id_field(), data.id());
        for (field, value) in data.fields() {
            write!(rendered, ", {}={}", field, value)
                .map_err(|err| DaoError::Storage(err.to_string()))?;
        }
        Ok(rendered)
    }

    fn objects_equal(&self, first: &T, second: &T) -> Result<bool> {
        Ok(first.type_name() == second.type_name()
            && first.id() == second.id()
            && first.fields() == second.fields())
    }

    async fn assign_empty_foreign_collection(&self, parent: &mut T, field: &str) -> Result<()> {
        parent.assign_empty_collection(field)
    }
}
