/// Error types for the persistence layer
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("quota exceeded: {attempted} bytes (limit: {limit})")]
    QuotaExceeded { limit: usize, attempted: usize },

    #[error("storage backend error: {0}")]
    Backend(String),
}
