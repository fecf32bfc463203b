use async_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use xslbridge_traits::{FetchError, FetchedBytes, Fetcher, SecurityPolicy};

/// Settings for one bridge.
#[derive(Debug, Clone, Default)]
pub struct FetchBridgeConfig {
    /// Resume the engine with a failure if a fetch has not settled in time.
    pub timeout: Option<Duration>,
    /// Read capabilities are checked before a request leaves the bridge.
    pub security: SecurityPolicy,
}

impl FetchBridgeConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_security(mut self, security: SecurityPolicy) -> Self {
        self.security = security;
        self
    }
}

struct FetchRequest {
    uri: String,
    reply: Sender<Option<FetchedBytes>>,
}

/// The synchronous end of the bridge, held by the engine-facing resolver.
#[derive(Debug)]
pub struct FetchBridge {
    requests: Sender<FetchRequest>,
    security: SecurityPolicy,
}

/// The asynchronous end of the bridge. [`run`](FetchService::run) serves
/// requests until the [`FetchBridge`] is dropped.
pub struct FetchService {
    requests: Receiver<FetchRequest>,
    fetcher: Arc<dyn Fetcher>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for FetchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchService")
            .field("fetcher", &self.fetcher.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Creates a connected bridge and service.
pub fn fetch_bridge(fetcher: Arc<dyn Fetcher>, config: FetchBridgeConfig) -> (FetchBridge, FetchService) {
    let (tx, rx) = async_channel::bounded(1);
    (
        FetchBridge {
            requests: tx,
            security: config.security,
        },
        FetchService {
            requests: rx,
            fetcher,
            timeout: config.timeout,
        },
    )
}

impl FetchBridge {
    /// Fetches `uri`, blocking the calling thread until the fetch settles.
    ///
    /// Returns `None` on any failure; the cause is logged. Must not be called
    /// from the thread that drives the paired [`FetchService`].
    pub fn fetch(&self, uri: &str) -> Option<FetchedBytes> {
        let capability = SecurityPolicy::read_capability_for(uri);
        if !self.security.allows(capability) {
            warn!("Refusing to load '{}': {:?} is forbidden by the security policy", uri, capability);
            return None;
        }

        let (reply_tx, reply_rx) = async_channel::bounded(1);
        let request = FetchRequest {
            uri: uri.to_string(),
            reply: reply_tx,
        };
        if self.requests.send_blocking(request).is_err() {
            error!("Cannot load '{}': {}", uri, FetchError::BridgeClosed);
            return None;
        }
        match reply_rx.recv_blocking() {
            Ok(result) => result,
            Err(_) => {
                error!("Cannot load '{}': {}", uri, FetchError::BridgeClosed);
                None
            }
        }
    }
}

impl FetchService {
    /// Serves fetch requests one at a time until the bridge is dropped.
    pub async fn run(self) {
        debug!("Fetch service started ({})", self.fetcher.name());
        while let Ok(request) = self.requests.recv().await {
            let result = self.fetch_one(&request.uri).await;
            if request.reply.send(result).await.is_err() {
                warn!("Fetch of '{}' completed after its caller went away", request.uri);
            }
        }
        debug!("Fetch service stopped");
    }

    async fn fetch_one(&self, uri: &str) -> Option<FetchedBytes> {
        info!("Loading external document from URL {}...", uri);
        let fetch = self.fetcher.fetch(uri);
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout(uri.to_string())),
            },
            None => fetch.await,
        };

        match outcome {
            Ok(bytes) => {
                debug!("Fetched {} bytes from {}", bytes.len(), uri);
                Some(bytes)
            }
            Err(err) => {
                error!(
                    "Failed to fetch an external document included via <xsl:import>, \
                     <xsl:include> or document().\nURL: {}\nCause: {}\n\
                     This is often due to the same-origin (CORS) policy: fetching is more \
                     restrictive than a native XSLT engine's resource access.",
                    uri, err
                );
                None
            }
        }
    }
}

/// Runs `work` on the current thread with a bridge served by a dedicated
/// thread that owns a single-threaded runtime.
///
/// For callers with no async runtime of their own. If the service thread
/// cannot start its runtime, every fetch through the bridge fails.
pub fn run_blocking<R>(
    fetcher: Arc<dyn Fetcher>,
    config: FetchBridgeConfig,
    work: impl FnOnce(FetchBridge) -> R,
) -> R {
    let (bridge, service) = fetch_bridge(fetcher, config);
    std::thread::scope(|scope| {
        let server = scope.spawn(move || {
            match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(service.run()),
                Err(err) => error!("Could not start the fetch runtime: {}", err),
            }
        });
        // `work` owns the bridge; when it returns the channel closes and the
        // service loop ends.
        let result = work(bridge);
        if server.join().is_err() {
            error!("Fetch service thread panicked");
        }
        result
    })
}

/// Runs `work` on a blocking thread while the current task serves its
/// fetches. Requires a runtime with timers enabled when a timeout is set.
pub async fn run_async<R, W>(
    fetcher: Arc<dyn Fetcher>,
    config: FetchBridgeConfig,
    work: W,
) -> Result<R, JoinError>
where
    R: Send + 'static,
    W: FnOnce(FetchBridge) -> R + Send + 'static,
{
    let (bridge, service) = fetch_bridge(fetcher, config);
    let handle = tokio::task::spawn_blocking(move || work(bridge));
    let ((), result) = tokio::join!(service.run(), handle);
    result
}
