//! Error types for the catalog and adoption service.

use thiserror::Error;

/// Errors raised while building a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog document is not valid YAML/JSON or does not match the record shape
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two records share an id
    #[error("Duplicate animal id '{0}'")]
    DuplicateId(String),

    /// A record has an empty id
    #[error("Animal record at position {0} has an empty id")]
    EmptyId(usize),
}

/// Reasons an adoption produced no certificate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdoptionError {
    #[error("no animal with id '{id}'")]
    NotFound { id: String },

    #[error("animal '{id}' has already been adopted")]
    AlreadyAdopted { id: String },
}

/// Result type alias for catalog construction.
pub type Result<T> = std::result::Result<T, CatalogError>;
