//! Error types for Concord operations

use crate::{EntityType, Snowflake};
use thiserror::Error;

/// Failures reported by the remote service, one variant per failure kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Not found: {route}")]
    NotFound { route: String },

    #[error("Rate limited on {route}, retry after {retry_after_ms}ms")]
    RateLimited { route: String, retry_after_ms: u64 },

    #[error("Request to {route} rejected with status {status}: {message}")]
    ClientError {
        route: String,
        status: u16,
        message: String,
    },

    #[error("Server error on {route} with status {status}")]
    ServerError { route: String, status: u16 },

    #[error("Transport failure on {route}: {reason}")]
    Transport { route: String, reason: String },

    #[error("Failed to decode response from {route}: {reason}")]
    Decode { route: String, reason: String },
}

impl RequestError {
    /// Returns true for the not-found kind, the only kind absorbed into `None`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RequestError::NotFound { .. })
    }

    /// The route the failure was reported for.
    pub fn route(&self) -> &str {
        match self {
            RequestError::NotFound { route }
            | RequestError::RateLimited { route, .. }
            | RequestError::ClientError { route, .. }
            | RequestError::ServerError { route, .. }
            | RequestError::Transport { route, .. }
            | RequestError::Decode { route, .. } => route,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid batch size {batch_size}: must be at least 1")]
    InvalidBatchSize { batch_size: usize },

    #[error("Invalid LRU capacity for {entity_type}: must be at least 1")]
    InvalidCapacity { entity_type: EntityType },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for all Concord errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConcordError {
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound { entity_type: EntityType, id: Snowflake },

    #[error("Pagination order violated: id {id} does not follow cursor {cursor}")]
    PaginationOrder { cursor: Snowflake, id: Snowflake },
}

impl ConcordError {
    /// Returns true if this wraps a remote not-found failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConcordError::Request(e) if e.is_not_found())
    }

    /// Returns true for operations that have no implementation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ConcordError::Unsupported { .. })
    }
}

/// Result type alias for Concord operations.
pub type ConcordResult<T> = Result<T, ConcordError>;

// =============================================================================
// TESTS
// =============================================================================
