//! In-memory implementations of the DAO and registry traits.

pub mod config;
pub mod memory;
pub mod registry;
pub mod table;

pub use config::RegistryConfig;
pub use memory::MemoryDao;
pub use registry::MemoryDaoRegistry;
pub use table::EntityTable;
