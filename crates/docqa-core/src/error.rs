use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to acquire document '{source_id}': {reason}")]
    Acquisition { source_id: String, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to create index '{index}': {reason}")]
    IndexCreation { index: String, reason: String },

    #[error("Failed to write {count} record(s) to the index: {reason}")]
    IndexWrite { count: usize, reason: String },

    #[error("Indexing aborted: {0}")]
    Indexing(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation service unreachable: {0}")]
    GenerationConnectivity(String),

    #[error("Generation service returned an unusable response: {0}")]
    GenerationProtocol(String),

    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "invalid_config",
            Error::NotFound(_) => "not_found",
            Error::Acquisition { .. } => "acquisition_failure",
            Error::Embedding(_) => "embedding_failure",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::IndexCreation { .. } => "index_creation_failure",
            Error::IndexWrite { .. } => "index_write_failure",
            Error::Indexing(_) => "indexing_failure",
            Error::Retrieval(_) => "retrieval_failure",
            Error::GenerationConnectivity(_) => "generation_connectivity_failure",
            Error::GenerationProtocol(_) => "generation_protocol_failure",
            Error::GenerationTimeout(_) => "generation_timeout",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }

    /// True for the three failure kinds the orchestrator folds into a fallback answer.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Error::GenerationConnectivity(_) | Error::GenerationProtocol(_) | Error::GenerationTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
