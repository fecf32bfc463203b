//! Resolution of external documents for a synchronous transformation engine.
//!
//! The engine loads `xsl:import`/`xsl:include` targets and `document()`
//! arguments from inside a synchronous, re-entrant call chain, while a
//! [`Fetcher`] is asynchronous. The [`FetchBridge`] parks the engine's thread
//! on a rendezvous channel while a [`FetchService`] task performs the fetch,
//! then resumes it with the result substituted at the call site:
//!
//! ```text
//!   engine thread                         async side
//!   ─────────────                         ──────────
//!   resolver.resolve(uri)
//!     bridge.fetch(uri) ──request──▶  FetchService::run
//!       (parked)                         fetcher.fetch(uri).await
//!     ◀──────────reply───────────────     Some(bytes) | None
//!   parser.parse_document(bytes)
//! ```
//!
//! Only one fetch is ever outstanding: the engine resolves references one at
//! a time and stays parked until each settles.
//!
//! [`Fetcher`]: xslbridge_traits::Fetcher

mod bridge;
mod filesystem;
#[cfg(feature = "http")]
mod http;
mod resolver;

pub use bridge::{
    FetchBridge, FetchBridgeConfig, FetchService, fetch_bridge, run_async, run_blocking,
};
pub use filesystem::FilesystemFetcher;
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use resolver::{ExternalDocumentResolver, ResolverStats};

// Re-export the in-memory fetcher from xslbridge-traits for convenience
pub use xslbridge_traits::InMemoryFetcher;
