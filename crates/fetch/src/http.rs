//! HTTP(S) fetcher backed by reqwest.

use async_trait::async_trait;
use log::debug;
use url::Url;
use xslbridge_traits::{FetchError, FetchedBytes, Fetcher};

/// Fetches `http:` and `https:` URIs with a GET request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a default client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the TLS backend cannot be set up.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport {
                uri: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchedBytes, FetchError> {
        let url = Url::parse(uri).map_err(|e| FetchError::InvalidUri(format!("{}: {}", uri, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUri(format!(
                "{}: unsupported scheme '{}'",
                uri,
                url.scheme()
            )));
        }

        let transport = |e: reqwest::Error| FetchError::Transport {
            uri: uri.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        debug!("GET {} -> {}", uri, status);
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "HttpFetcher"
    }
}
