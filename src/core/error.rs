use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error("Invalid type hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No DAO under '{super_type}' handles entity type '{requested}'")]
    NoMatchingSubtype {
        super_type: String,
        requested: String,
    },

    #[error(
        "All objects in a batch must share one entity type, found '{first}' and '{other}'; delete them one by one"
    )]
    HeterogeneousBatch { first: String, other: String },

    #[error("Operation '{0}' on a polymorphic DAO needs an explicit entity type")]
    RoutingTypeRequired(&'static str),

    #[error("Field '{field}' is not a collection on '{entity_type}'")]
    UnknownField { entity_type: String, field: String },
}

impl DaoError {
    /// Errors raised by the dispatch layer itself, before any DAO was invoked.
    pub fn is_routing_error(&self) -> bool {
        matches!(
            self,
            Self::NoMatchingSubtype { .. }
                | Self::HeterogeneousBatch { .. }
                | Self::RoutingTypeRequired(_)
        )
    }

    /// Errors that originate in a storage collaborator.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound(_)
                | Self::ConstraintViolation(_)
                | Self::Storage(_)
                | Self::LockError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DaoError>;

impl<T> From<std::sync::PoisonError<T>> for DaoError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DaoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
