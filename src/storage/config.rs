use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::hierarchy::EntityType;

/// Settings of the in-memory DAO registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Prefix prepended to every generated table name
    pub table_prefix: Option<String>,

    /// Create each table together with its DAO
    pub auto_create_tables: bool,

    /// Lowercase type names when deriving table names
    pub lowercase_table_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            table_prefix: None,
            auto_create_tables: true,
            lowercase_table_names: true,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Set the table name prefix
    pub fn table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = Some(prefix.to_string());
        self
    }

    /// Set whether tables are created with their DAO
    pub fn auto_create_tables(mut self, enabled: bool) -> Self {
        self.auto_create_tables = enabled;
        self
    }

    /// Set whether derived table names are lowercased
    pub fn lowercase_table_names(mut self, enabled: bool) -> Self {
        self.lowercase_table_names = enabled;
        self
    }

    /// Table backing `entity_type`. An explicit table name wins over the derived one.
    pub fn table_name_for(&self, entity_type: &EntityType) -> String {
        if let Some(explicit) = &entity_type.table_name {
            return explicit.clone();
        }

        let base = if self.lowercase_table_names {
            entity_type.name.to_lowercase()
        } else {
            entity_type.name.clone()
        };

        match &self.table_prefix {
            Some(prefix) => format!("{}{}", prefix, base),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_names() {
        let config = RegistryConfig::default();
        assert!(config.auto_create_tables);
        assert_eq!(config.table_name_for(&EntityType::concrete("Circle")), "circle");
    }

    #[test]
    fn test_builder_table_names() {
        let config = RegistryConfig::new()
            .table_prefix("geo_")
            .lowercase_table_names(false);
        assert_eq!(config.table_name_for(&EntityType::concrete("Circle")), "geo_Circle");

        let explicit = EntityType::concrete("Square").with_table_name("squares");
        assert_eq!(config.table_name_for(&explicit), "squares");
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = RegistryConfig::from_json(r#"{"auto_create_tables": false}"#).unwrap();
        assert!(!config.auto_create_tables);
        assert!(config.lowercase_table_names);
        assert_eq!(config.table_prefix, None);
    }
}
