//! Extensions for a synchronous XSLT engine: collation-aware, stable
//! sorting of selections, and loading of imports and `document()` targets
//! through an asynchronous fetcher.
//!
//! A [`TransformDriver`] owns the engine and a [`Fetcher`]. For each run it
//! builds fresh [`BridgeHooks`] (a [`SortEngine`] and an
//! [`ExternalDocumentResolver`]) and hands them to the engine, which calls
//! back into them while it evaluates. Afterwards the result's media type is
//! inferred and HTML results get a `Content-Type` `<meta>` element.
//!
//! ```ignore
//! let driver = TransformDriver::new(engine, HttpFetcher::new()?)
//!     .with_config(TransformConfig::default().with_default_locale("de"));
//! let output = driver.transform(&xml, &xslt, "https://example.com/style.xsl", &[])?;
//! println!("{}", output.media_type);
//! ```
//!
//! [`Fetcher`]: xslbridge_traits::Fetcher
//! [`SortEngine`]: xslbridge_sort::SortEngine
//! [`ExternalDocumentResolver`]: xslbridge_fetch::ExternalDocumentResolver

pub mod config;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod output;
pub mod processor;

pub use config::TransformConfig;
pub use discovery::{find_stylesheet_href, load_url_with_stylesheet, load_with_stylesheet};
pub use driver::{BridgeHooks, TransformDriver, TransformOutput};
pub use error::TransformError;
pub use output::{MediaType, infer_media_type, normalize_html_meta};
pub use processor::{Processor, xpath_string_literal};

// Re-export the component crates
pub use xslbridge_collation as collation;
pub use xslbridge_fetch as fetch;
pub use xslbridge_sort as sort;
pub use xslbridge_traits as traits;
