// src/error.rs
use thiserror::Error;
use xslbridge_traits::{EngineError, FetchError};

/// Errors surfaced by a transformation run.
///
/// Sorting and document loading never fail on their own: they degrade to
/// the original order or an absent document, and the engine decides what
/// that means. Everything that does reach the caller ends up here.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to parse the source document: {0}")]
    SourceParse(String),

    #[error("Failed to parse the stylesheet: {0}")]
    StylesheetParse(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to serialize the result: {0}")]
    Serialize(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("No xml-stylesheet processing instruction with an XSLT type was found")]
    NoStylesheet,

    #[error("No stylesheet has been imported")]
    StylesheetNotImported,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for TransformError {
    fn from(e: serde_json::Error) -> Self {
        TransformError::Config(e.to_string())
    }
}

impl TransformError {
    /// Serialization failures get their own variant; everything else the
    /// engine reports stays an engine error.
    pub(crate) fn from_engine(err: EngineError) -> Self {
        match err {
            EngineError::Serialize(message) => TransformError::Serialize(message),
            other => TransformError::Engine(other),
        }
    }
}
