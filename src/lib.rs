// ============================================================================
// polydao Library
// ============================================================================

//! Polymorphic data access over an entity type hierarchy.
//!
//! Each persisted type of a hierarchy lives in its own table behind its own
//! [`SingleTypeDao`]. A [`PolymorphicDao`] for the super type fans hierarchy-wide
//! queries and counts out over every table, and routes single-object operations
//! to the one DAO that manages the object's runtime type.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use polydao::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Shape {
//!     kind: &'static str,
//!     id: Value,
//!     label: String,
//! }
//!
//! impl Entity for Shape {
//!     fn type_name(&self) -> &str {
//!         self.kind
//!     }
//!     fn id(&self) -> Value {
//!         self.id.clone()
//!     }
//!     fn set_id(&mut self, id: Value) {
//!         self.id = id;
//!     }
//!     fn fields(&self) -> Vec<(&'static str, Value)> {
//!         vec![("label", Value::from(self.label.as_str()))]
//!     }
//! }
//!
//! # fn main() -> polydao::Result<()> {
//! tokio_test::block_on(async {
//!     let hierarchy = TypeHierarchy::builder()
//!         .declare(EntityType::abstract_type("Shape").with_subclasses(["Circle", "Square"]))
//!         .declare(EntityType::concrete("Circle").extends("Shape"))
//!         .declare(EntityType::concrete("Square").extends("Shape"))
//!         .build()?;
//!     let registry = MemoryDaoRegistry::<Shape>::new(Arc::new(hierarchy), RegistryConfig::default());
//!     let shapes = registry.get_or_create("Shape").await?;
//!
//!     let mut circle = Shape { kind: "Circle", id: Value::Null, label: "c".into() };
//!     let mut square = Shape { kind: "Square", id: Value::Null, label: "s".into() };
//!     shapes.create(&mut circle).await?;
//!     shapes.create(&mut square).await?;
//!
//!     assert_eq!(shapes.count_of().await?, 2);
//!     assert_eq!(shapes.query_for_id_of(&circle.id(), "Circle").await?.unwrap().label, "c");
//!     Ok(())
//! })
//! # }
//! ```

pub mod core;
pub mod dao;
pub mod entity;
pub mod field;
pub mod hierarchy;
pub mod prelude;
pub mod storage;

// Re-export main types for convenience
pub use core::{DaoError, FieldValues, Result, Value};
pub use dao::{DaoHandle, DaoRegistry, PolymorphicDao, SingleTypeDao};
pub use entity::{CreateOrUpdateStatus, Entity};
pub use field::DerivedField;
pub use hierarchy::{EntityType, TypeHierarchy};
pub use storage::{MemoryDao, MemoryDaoRegistry, RegistryConfig};
