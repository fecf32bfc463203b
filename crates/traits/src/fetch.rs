//! Fetcher trait for retrieving external documents by URI.
//!
//! Fetching is asynchronous. The engine's import processing is not, so the
//! fetch crate bridges the two; this module only defines what a fetcher is.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error type for fetch operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Request for '{uri}' failed with status {status}")]
    Status { uri: String, status: u16 },

    #[error("Transport error while fetching '{uri}': {message}")]
    Transport { uri: String, message: String },

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Fetch of '{0}' timed out")]
    Timeout(String),

    #[error("Access to '{0}' is forbidden by the security policy")]
    Forbidden(String),

    #[error("Fetch bridge is closed")]
    BridgeClosed,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

/// Bytes returned by a successful fetch. Ownership moves to the caller.
pub type FetchedBytes = Vec<u8>;

/// Retrieves the raw bytes behind a URI.
///
/// # Implementations
///
/// - `InMemoryFetcher`: serves pre-populated bytes (always available)
/// - `HttpFetcher`: HTTP(S) GET via reqwest (fetch crate, feature `http`)
/// - `FilesystemFetcher`: `file:` URIs beneath a base directory (fetch crate)
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch the document at `uri`.
    ///
    /// Any non-success outcome, including a non-2xx status, is an error.
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, FetchError>;

    /// Returns a human-readable name for this fetcher (for logging/debugging).
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, FetchError> {
        (**self).fetch(uri).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Body(Arc<Vec<u8>>),
    Status(u16),
}

/// An in-memory fetcher.
///
/// Documents must be added before use. A URI can also be primed with a
/// status code to simulate a failing server.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document under `uri`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Io` if the internal lock is poisoned.
    pub fn add(&self, uri: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<(), FetchError> {
        self.insert(uri.into(), Entry::Body(Arc::new(data.into())))
    }

    /// Make every fetch of `uri` fail with the given HTTP status.
    pub fn fail_with_status(&self, uri: impl Into<String>, status: u16) -> Result<(), FetchError> {
        self.insert(uri.into(), Entry::Status(status))
    }

    fn insert(&self, uri: String, entry: Entry) -> Result<(), FetchError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| FetchError::Io("fetcher store lock poisoned".to_string()))?;
        entries.insert(uri, entry);
        Ok(())
    }

    /// Remove an entry. Returns `false` if it was absent or the lock is poisoned.
    pub fn remove(&self, uri: &str) -> bool {
        self.entries
            .write()
            .map(|mut e| e.remove(uri).is_some())
            .unwrap_or(false)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Fetcher for InMemoryFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, FetchError> {
        let entry = {
            let entries = self
                .entries
                .read()
                .map_err(|_| FetchError::Io("fetcher store lock poisoned".to_string()))?;
            entries.get(uri).cloned()
        };
        match entry {
            Some(Entry::Body(data)) => Ok(data.as_ref().clone()),
            Some(Entry::Status(status)) => Err(FetchError::Status {
                uri: uri.to_string(),
                status,
            }),
            None => Err(FetchError::NotFound(uri.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "InMemoryFetcher"
    }
}
