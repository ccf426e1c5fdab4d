//! Error types for the poextract-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the poextract library.
#[derive(Error, Debug)]
pub enum PoError {
    /// Block graph construction error.
    #[error("block graph error: {0}")]
    Graph(#[from] GraphError),

    /// Document analysis provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Purchase order extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while building a block graph from provider output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two blocks share the same id.
    #[error("duplicate block id: {0}")]
    DuplicateId(String),

    /// CHILD relationships form a cycle through the given block.
    #[error("CHILD relationships form a cycle at block {0}")]
    Cycle(String),
}

/// Errors related to the document analysis provider boundary.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider response could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider response is not valid JSON for the expected shape.
    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider returned neither blocks nor expense documents.
    #[error("provider returned an empty document")]
    EmptyDocument,
}

/// Errors related to purchase order field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No document data was supplied.
    #[error("no document data found")]
    NoData,

    /// A configured pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A required vocabulary is empty.
    #[error("empty vocabulary: {0}")]
    Vocabulary(String),
}

/// Result type for the poextract library.
pub type Result<T> = std::result::Result<T, PoError>;
