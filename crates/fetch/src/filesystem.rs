//! Filesystem fetcher for `file:` URIs and relative references.
//!
//! # Security
//!
//! Every resolved path must stay within the base directory. References
//! that escape it (e.g. `../../etc/passwd`, or a `file:` URI elsewhere on
//! disk) fail with `FetchError::Forbidden`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;
use xslbridge_traits::{FetchError, FetchedBytes, Fetcher};

/// Loads documents from beneath a base directory.
#[derive(Debug)]
pub struct FilesystemFetcher {
    base_path: PathBuf,
    /// Canonicalized base path for containment checks
    canonical_base: Option<PathBuf>,
}

impl FilesystemFetcher {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    fn candidate_path(&self, uri: &str) -> Result<PathBuf, FetchError> {
        let is_file_uri = uri
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:"));
        if is_file_uri {
            return Url::parse(uri)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| FetchError::InvalidUri(uri.to_string()));
        }

        let relative = Path::new(uri);
        if relative.is_absolute() {
            return Err(FetchError::Forbidden(uri.to_string()));
        }
        Ok(self.base_path.join(relative))
    }

    /// Resolves `uri` to a canonical path inside the base directory.
    fn resolve_path_safe(&self, uri: &str) -> Result<PathBuf, FetchError> {
        let candidate = self.candidate_path(uri)?;
        let canonical = candidate
            .canonicalize()
            .map_err(|_| FetchError::NotFound(uri.to_string()))?;
        match &self.canonical_base {
            Some(base) if canonical.starts_with(base) => Ok(canonical),
            _ => Err(FetchError::Forbidden(uri.to_string())),
        }
    }
}

#[async_trait]
impl Fetcher for FilesystemFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, FetchError> {
        let path = self.resolve_path_safe(uri)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(uri.to_string())
            } else {
                FetchError::from(e)
            }
        })
    }

    fn name(&self) -> &'static str {
        "FilesystemFetcher"
    }
}
