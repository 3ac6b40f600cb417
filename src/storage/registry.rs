use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{Level, event};

use crate::core::Result;
use crate::dao::{DaoHandle, DaoRegistry, PolymorphicDao, SingleTypeDao};
use crate::entity::Entity;
use crate::field::DerivedField;
use crate::hierarchy::{EntityType, TypeHierarchy};

use super::config::RegistryConfig;
use super::memory::MemoryDao;

/// [`DaoRegistry`] that creates [`MemoryDao`]s on demand and caches them per type.
///
/// Types that have persisted subclasses get a [`PolymorphicDao`] whose local DAO
/// is a `MemoryDao` for the type itself. Its sub-DAOs come from this registry too,
/// so every type has exactly one cached DAO.
///
/// The `MemoryDao` behind every cached DAO stays reachable through
/// [`MemoryDaoRegistry::create_table`] and [`MemoryDaoRegistry::create_tables`], which
/// is how tables get created when `auto_create_tables` is off.
pub struct MemoryDaoRegistry<T: Entity> {
    hierarchy: Arc<TypeHierarchy>,
    config: RegistryConfig,
    derived_fields: HashMap<String, Vec<DerivedField<T>>>,
    daos: Mutex<HashMap<String, DaoHandle<T>>>,
    stores: Mutex<HashMap<String, Arc<MemoryDao<T>>>>,
}

impl<T: Entity> MemoryDaoRegistry<T> {
    pub fn new(hierarchy: Arc<TypeHierarchy>, config: RegistryConfig) -> Self {
        Self {
            hierarchy,
            config,
            derived_fields: HashMap::new(),
            daos: Mutex::new(HashMap::new()),
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a derived column to the table of `entity_type`.
    pub fn with_derived_field(mut self, entity_type: &str, field: DerivedField<T>) -> Self {
        self.derived_fields
            .entry(entity_type.to_string())
            .or_default()
            .push(field);
        self
    }

    pub fn hierarchy(&self) -> &Arc<TypeHierarchy> {
        &self.hierarchy
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a DAO built elsewhere, replacing any cached DAO for its type.
    ///
    /// The registry no longer manages the table of that type afterwards.
    pub fn register_dao(&self, dao: DaoHandle<T>) -> Result<Option<DaoHandle<T>>> {
        let entity_type = self.hierarchy.require(dao.data_type())?.name.clone();
        self.stores.lock()?.remove(&entity_type);
        let mut daos = self.daos.lock()?;
        Ok(daos.insert(entity_type, dao))
    }

    /// Creates the table of `entity_type`, creating its DAO first if needed.
    ///
    /// Returns `false` when the table already exists or the type is served by a
    /// DAO registered through [`MemoryDaoRegistry::register_dao`].
    pub async fn create_table(&self, entity_type: &str) -> Result<bool> {
        self.get_or_create(entity_type).await?;
        let store = self.stores.lock()?.get(entity_type).cloned();
        match store {
            Some(store) => Ok(store.create_table().await),
            None => Ok(false),
        }
    }

    /// Creates the missing tables of every DAO created so far. Returns how many
    /// tables were created.
    pub async fn create_tables(&self) -> Result<usize> {
        let stores: Vec<Arc<MemoryDao<T>>> = self.stores.lock()?.values().cloned().collect();
        let mut created = 0;
        for store in stores {
            if store.create_table().await {
                created += 1;
            }
        }
        event!(Level::DEBUG, created, "tables created");
        Ok(created)
    }

    pub fn cached(&self, entity_type: &str) -> Result<Option<DaoHandle<T>>> {
        let daos = self.daos.lock()?;
        Ok(daos.get(entity_type).cloned())
    }

    pub fn cached_count(&self) -> Result<usize> {
        Ok(self.daos.lock()?.len())
    }

    fn memory_dao_for(&self, entity_type: &EntityType) -> MemoryDao<T> {
        let table_name = self.config.table_name_for(entity_type);
        let mut dao = MemoryDao::new(entity_type.name.clone(), table_name);
        if self.config.auto_create_tables {
            dao = dao.with_table();
        }
        for field in self
            .derived_fields
            .get(&entity_type.name)
            .into_iter()
            .flatten()
        {
            dao = dao.with_derived_field(field.clone());
        }
        dao
    }
}

#[async_trait]
impl<T: Entity> DaoRegistry<T> for MemoryDaoRegistry<T> {
    async fn get_or_create(&self, entity_type: &str) -> Result<DaoHandle<T>> {
        if let Some(dao) = self.cached(entity_type)? {
            return Ok(dao);
        }

        let declared = self.hierarchy.require(entity_type)?;
        let polymorphic = self.hierarchy.is_super_class(entity_type);
        let store = Arc::new(self.memory_dao_for(declared));
        let base: DaoHandle<T> = Arc::clone(&store) as DaoHandle<T>;
        let created: DaoHandle<T> = if polymorphic {
            let dao =
                PolymorphicDao::build(Arc::clone(&self.hierarchy), entity_type, base, self).await?;
            Arc::new(dao)
        } else {
            base
        };

        let mut daos = self.daos.lock()?;
        if let Some(existing) = daos.get(entity_type) {
            return Ok(Arc::clone(existing));
        }
        self.stores.lock()?.insert(entity_type.to_string(), store);
        daos.insert(entity_type.to_string(), Arc::clone(&created));
        event!(Level::DEBUG, entity_type, polymorphic, "dao created");
        Ok(created)
    }
}
