//! Error types for the Animal Rescue MCP server.

use animal_rescue_adoption::CatalogError;
use thiserror::Error;

/// Main error type for the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration errors (unreadable file, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// MCP transport failed to start or crashed
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
