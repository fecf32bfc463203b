use crate::config::TransformConfig;
use crate::error::TransformError;
use crate::output::{MediaType, infer_media_type, normalize_html_meta};
use log::{debug, info};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use xslbridge_fetch::{ExternalDocumentResolver, FetchBridge, run_async, run_blocking};
use xslbridge_sort::SortEngine;
use xslbridge_traits::{
    DocumentParser, Engine, ExpressionEvaluator, Fetcher, LoadKind, ResultTree, SortSpecification,
    TransformHooks, TransformRequest,
};

/// Serialized result of a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl TransformOutput {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_string(self) -> Result<String, TransformError> {
        String::from_utf8(self.bytes).map_err(|e| TransformError::Serialize(e.to_string()))
    }
}

/// The callbacks handed to the engine for one run: collation-aware sorting
/// and document loading through the fetch bridge.
#[derive(Debug)]
pub struct BridgeHooks {
    sorter: SortEngine,
    resolver: ExternalDocumentResolver,
}

impl BridgeHooks {
    pub fn new(sorter: SortEngine, bridge: FetchBridge) -> Self {
        Self {
            sorter,
            resolver: ExternalDocumentResolver::new(bridge),
        }
    }
}

impl<E, P> TransformHooks<E, P> for BridgeHooks
where
    E: ExpressionEvaluator + ?Sized,
    P: DocumentParser + ?Sized,
{
    fn sort(&mut self, evaluator: &E, items: &mut [E::Item], specs: &[SortSpecification<E::Expr>]) {
        self.sorter.sort(evaluator, items, specs);
    }

    fn load_document(&mut self, parser: &P, uri: &str, kind: LoadKind) -> Option<P::Document> {
        self.resolver.resolve(parser, uri, kind)
    }
}

/// Runs transformations on an engine, serving its sort and document-load
/// callbacks.
///
/// Every run gets its own [`BridgeHooks`]; nothing outlives the call. Runs
/// on one driver are serialized on the engine.
pub struct TransformDriver<E, F> {
    engine: Arc<Mutex<E>>,
    fetcher: Arc<F>,
    config: TransformConfig,
}

impl<E, F> TransformDriver<E, F>
where
    E: Engine + Send + 'static,
    F: Fetcher + 'static,
{
    pub fn new(engine: E, fetcher: F) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            fetcher: Arc::new(fetcher),
            config: TransformConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TransformConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn sorter(&self) -> SortEngine {
        match &self.config.default_locale {
            Some(locale) => SortEngine::new().with_default_locale(locale.clone()),
            None => SortEngine::new(),
        }
    }

    /// Transforms `source` with `stylesheet` on the calling thread.
    ///
    /// `base_uri` resolves relative imports. `params` are top-level
    /// parameters as `(name, expression)` pairs; quote string values as
    /// XPath literals. Fetches are served by a private runtime on a helper
    /// thread, so this must not be called from inside an async task.
    pub fn transform(
        &self,
        source: &[u8],
        stylesheet: &[u8],
        base_uri: &str,
        params: &[(String, String)],
    ) -> Result<TransformOutput, TransformError> {
        let options = self.config.engine_options();
        let request = TransformRequest {
            source,
            stylesheet,
            base_uri,
            params,
            options: &options,
        };
        let sorter = self.sorter();
        let fetcher: Arc<dyn Fetcher> = self.fetcher.clone();
        run_blocking(fetcher, self.config.bridge_config(), |bridge| {
            let mut hooks = BridgeHooks::new(sorter, bridge);
            run_engine(&self.engine, &request, &mut hooks)
        })
    }

    /// Transforms on a blocking thread while the current task serves the
    /// engine's fetches.
    pub async fn transform_async(
        &self,
        source: Vec<u8>,
        stylesheet: Vec<u8>,
        base_uri: String,
        params: Vec<(String, String)>,
    ) -> Result<TransformOutput, TransformError> {
        let engine = Arc::clone(&self.engine);
        let options = self.config.engine_options();
        let sorter = self.sorter();
        let fetcher: Arc<dyn Fetcher> = self.fetcher.clone();

        run_async(fetcher, self.config.bridge_config(), move |bridge| {
            let request = TransformRequest {
                source: &source,
                stylesheet: &stylesheet,
                base_uri: &base_uri,
                params: &params,
                options: &options,
            };
            let mut hooks = BridgeHooks::new(sorter, bridge);
            run_engine(&engine, &request, &mut hooks)
        })
        .await
        .map_err(|e| TransformError::Runtime(e.to_string()))?
    }
}

fn run_engine<E: Engine>(
    engine: &Mutex<E>,
    request: &TransformRequest<'_>,
    hooks: &mut BridgeHooks,
) -> Result<TransformOutput, TransformError> {
    let start = Instant::now();
    info!(
        "Transforming {} bytes with a {} byte stylesheet (base URI '{}')",
        request.source.len(),
        request.stylesheet.len(),
        request.base_uri
    );

    let mut engine = engine
        .lock()
        .map_err(|_| TransformError::Runtime("engine lock poisoned by an earlier run".to_string()))?;
    let mut tree = engine.transform(request, hooks).map_err(TransformError::from_engine)?;
    drop(engine);

    let media_type = infer_media_type(&tree);
    normalize_html_meta(&mut tree);
    let bytes = tree.serialize().map_err(TransformError::from_engine)?;

    let stats = hooks.resolver.stats();
    debug!(
        "Transformation finished in {:.2?}: {} bytes of {}, {} documents loaded, {} failed",
        start.elapsed(),
        bytes.len(),
        media_type,
        stats.loaded,
        stats.failed
    );
    Ok(TransformOutput { bytes, media_type })
}
