use std::collections::{BTreeMap, HashMap};

use crate::core::{DaoError, Result, Value};
use crate::entity::Entity;

/// Rows of one entity type, in insertion order, indexed by id.
#[derive(Debug, Clone)]
pub struct EntityTable<T> {
    name: String,
    rows: BTreeMap<u64, T>,
    ids: HashMap<Value, u64>,
    next_row_id: u64,
}

impl<T: Entity> EntityTable<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            ids: HashMap::new(),
            next_row_id: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn get(&self, id: &Value) -> Option<&T> {
        self.ids.get(id).and_then(|row_id| self.rows.get(row_id))
    }

    pub fn contains(&self, id: &Value) -> bool {
        self.ids.contains_key(id)
    }

    /// Next free integer id. Fails once the largest stored id is `i64::MAX`.
    pub fn next_generated_id(&self) -> Result<Value> {
        match self.ids.keys().filter_map(Value::as_i64).max() {
            None => Ok(Value::Integer(1)),
            Some(max) => max.checked_add(1).map(Value::Integer).ok_or_else(|| {
                DaoError::ConstraintViolation(format!(
                    "no id left to generate in table '{}'",
                    self.name
                ))
            }),
        }
    }

    pub fn insert(&mut self, row: T) -> Result<()> {
        let id = row.id();
        if id.is_null() {
            return Err(DaoError::ConstraintViolation(format!(
                "row inserted into '{}' has no id",
                self.name
            )));
        }
        if self.ids.contains_key(&id) {
            return Err(DaoError::ConstraintViolation(format!(
                "duplicate id {} in table '{}'",
                id, self.name
            )));
        }

        let row_id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(row_id, row);
        self.ids.insert(id, row_id);
        Ok(())
    }

    /// Replaces the row with the same id. Returns `false` when there is none.
    pub fn replace(&mut self, row: T) -> bool {
        match self.ids.get(&row.id()) {
            Some(row_id) => {
                self.rows.insert(*row_id, row);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &Value) -> Option<T> {
        let row_id = self.ids.remove(id)?;
        self.rows.remove(&row_id)
    }

    /// Moves the row stored under `old_id` to `new_id`.
    pub fn rekey(&mut self, old_id: &Value, new_id: &Value) -> Result<bool> {
        if old_id == new_id {
            return Ok(self.contains(old_id));
        }
        if new_id.is_null() {
            return Err(DaoError::ConstraintViolation(format!(
                "cannot change an id to NULL in table '{}'",
                self.name
            )));
        }
        if self.ids.contains_key(new_id) {
            return Err(DaoError::ConstraintViolation(format!(
                "duplicate id {} in table '{}'",
                new_id, self.name
            )));
        }
        let Some(row_id) = self.ids.remove(old_id) else {
            return Ok(false);
        };
        if let Some(row) = self.rows.get_mut(&row_id) {
            row.set_id(new_id.clone());
        }
        self.ids.insert(new_id.clone(), row_id);
        Ok(true)
    }
}
