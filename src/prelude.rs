//! Traits and types needed by most code that declares a hierarchy and talks to its DAOs.

pub use crate::core::{DaoError, FieldValues, Result, Value};
pub use crate::dao::{DaoHandle, DaoRegistry, PolymorphicDao, SingleTypeDao};
pub use crate::entity::{CreateOrUpdateStatus, Entity};
pub use crate::field::DerivedField;
pub use crate::hierarchy::{EntityType, TypeHierarchy};
pub use crate::storage::{MemoryDao, MemoryDaoRegistry, RegistryConfig};
