use crate::bridge::FetchBridge;
use log::{info, warn};
use xslbridge_traits::{DocumentParser, LoadKind};

/// Counters for the loads a resolver has handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub loaded: usize,
    pub failed: usize,
}

/// Answers the engine's requests for stylesheets and source documents by
/// fetching through a [`FetchBridge`] and parsing the bytes.
///
/// A failed load is reported to the engine as an absent document; the
/// engine decides whether that is fatal (a missing import is, a missing
/// `document()` argument usually is not).
#[derive(Debug)]
pub struct ExternalDocumentResolver {
    bridge: FetchBridge,
    stats: ResolverStats,
}

impl ExternalDocumentResolver {
    pub fn new(bridge: FetchBridge) -> Self {
        Self {
            bridge,
            stats: ResolverStats::default(),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Fetches and parses the document at `uri`.
    pub fn resolve<P: DocumentParser + ?Sized>(
        &mut self,
        parser: &P,
        uri: &str,
        kind: LoadKind,
    ) -> Option<P::Document> {
        info!("Resolving {:?} '{}'", kind, uri);
        let Some(bytes) = self.bridge.fetch(uri) else {
            self.stats.failed += 1;
            return None;
        };

        // The bytes are dropped once parsed; the parser copies what it keeps.
        match parser.parse_document(&bytes, uri) {
            Ok(document) => {
                self.stats.loaded += 1;
                Some(document)
            }
            Err(err) => {
                warn!("Fetched '{}' but it could not be parsed: {}", uri, err);
                self.stats.failed += 1;
                None
            }
        }
    }
}
