//! Entity type declarations and the ancestry predicates the dispatch layer routes on.
//!
//! A [`TypeHierarchy`] is built once and never mutated. Building validates the
//! declarations so that, for any entity type, at most one declared direct subclass
//! of a given super type is an ancestor of it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::{DaoError, Result};

/// Declaration of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub direct_subclasses: Vec<String>,
    #[serde(default)]
    pub table_name: Option<String>,
}

impl EntityType {
    /// Declares a concrete (persisted) type.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            parent: None,
            direct_subclasses: Vec::new(),
            table_name: None,
        }
    }

    /// Declares an abstract type. Abstract types own no rows of their own.
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self {
            is_abstract: true,
            ..Self::concrete(name)
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declares the direct subclasses persisted in their own tables, in fan-out order.
    pub fn with_subclasses<I, S>(mut self, subclasses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direct_subclasses = subclasses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn is_concrete(&self) -> bool {
        !self.is_abstract
    }

    pub fn declares_subclasses(&self) -> bool {
        !self.direct_subclasses.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct HierarchyDocument {
    types: Vec<EntityType>,
}

/// Validated, immutable set of entity type declarations.
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    types: HashMap<String, EntityType>,
    declaration_order: Vec<String>,
}

impl TypeHierarchy {
    pub fn builder() -> TypeHierarchyBuilder {
        TypeHierarchyBuilder::default()
    }

    /// Loads a hierarchy from a JSON document of the form
    /// `{"types": [{"name": "Shape", "direct_subclasses": ["Circle"]}, ...]}`.
    pub fn from_json(document: &str) -> Result<Self> {
        let document: HierarchyDocument = serde_json::from_str(document)?;
        let mut builder = Self::builder();
        for entity_type in document.types {
            builder = builder.declare(entity_type);
        }
        builder.build()
    }

    pub fn get(&self, name: &str) -> Option<&EntityType> {
        self.types.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&EntityType> {
        self.get(name)
            .ok_or_else(|| DaoError::UnknownEntityType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Type names in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.declaration_order.iter().map(String::as_str)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|t| t.parent.as_deref())
    }

    pub fn direct_subclasses(&self, name: &str) -> &[String] {
        self.get(name)
            .map(|t| t.direct_subclasses.as_slice())
            .unwrap_or(&[])
    }

    /// `name` followed by each of its ancestors up to the root.
    pub fn lineage<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut next = self.contains(name).then_some(name);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.parent_of(current);
            Some(current)
        })
    }

    /// Whether `name` has persisted subclasses: walks the ancestry until a type with
    /// declared direct subclasses is found, or the root is passed.
    pub fn is_super_class(&self, name: &str) -> bool {
        self.lineage(name)
            .filter_map(|t| self.get(t))
            .any(EntityType::declares_subclasses)
    }

    /// Whether values of `candidate` can be handled by a DAO managing `base`,
    /// i.e. `candidate` is `base` or one of its descendants.
    pub fn is_assignable_from(&self, base: &str, candidate: &str) -> bool {
        self.lineage(candidate).any(|t| t == base)
    }
}

#[derive(Debug, Default)]
pub struct TypeHierarchyBuilder {
    declarations: Vec<EntityType>,
}

impl TypeHierarchyBuilder {
    pub fn declare(mut self, entity_type: EntityType) -> Self {
        self.declarations.push(entity_type);
        self
    }

    pub fn build(self) -> Result<TypeHierarchy> {
        let mut types = HashMap::with_capacity(self.declarations.len());
        let mut declaration_order = Vec::with_capacity(self.declarations.len());

        for entity_type in self.declarations {
            if types.contains_key(&entity_type.name) {
                return Err(DaoError::InvalidHierarchy(format!(
                    "type '{}' is declared twice",
                    entity_type.name
                )));
            }
            declaration_order.push(entity_type.name.clone());
            types.insert(entity_type.name.clone(), entity_type);
        }

        for name in &declaration_order {
            let entity_type = &types[name];
            if let Some(parent) = &entity_type.parent
                && !types.contains_key(parent)
            {
                return Err(DaoError::InvalidHierarchy(format!(
                    "type '{}' extends undeclared type '{}'",
                    name, parent
                )));
            }

            let mut seen = HashSet::new();
            for subclass in &entity_type.direct_subclasses {
                if !seen.insert(subclass.as_str()) {
                    return Err(DaoError::InvalidHierarchy(format!(
                        "type '{}' lists subclass '{}' twice",
                        name, subclass
                    )));
                }
                let Some(declared) = types.get(subclass) else {
                    return Err(DaoError::InvalidHierarchy(format!(
                        "type '{}' lists undeclared subclass '{}'",
                        name, subclass
                    )));
                };
                if declared.parent.as_deref() != Some(name.as_str()) {
                    return Err(DaoError::InvalidHierarchy(format!(
                        "type '{}' lists '{}' as a direct subclass, but '{}' does not extend it",
                        name, subclass, subclass
                    )));
                }
            }
        }

        for name in &declaration_order {
            let mut visited = HashSet::new();
            let mut current = Some(name.as_str());
            while let Some(t) = current {
                if !visited.insert(t) {
                    return Err(DaoError::InvalidHierarchy(format!(
                        "ancestry of '{}' contains a cycle",
                        name
                    )));
                }
                current = types.get(t).and_then(|e| e.parent.as_deref());
            }
        }

        Ok(TypeHierarchy {
            types,
            declaration_order,
        })
    }
}
