use crate::discovery::check_well_formed;
use crate::driver::{TransformDriver, TransformOutput};
use crate::error::TransformError;
use log::debug;
use xslbridge_traits::{Engine, Fetcher};

const DEFAULT_BASE_URI: &str = "about:blank";

/// Quotes `value` as an XPath 1.0 string literal.
///
/// Top-level parameters reach the engine as expressions, so plain strings
/// must be quoted. XPath 1.0 literals have no escapes; a value holding both
/// quote characters is assembled with `concat()`.
pub fn xpath_string_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{}'", part)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

struct ImportedStylesheet {
    bytes: Vec<u8>,
    base_uri: String,
}

/// A stateful processor in the style of the DOM `XSLTProcessor`: import a
/// stylesheet once, set parameters, then transform any number of sources.
pub struct Processor<E, F> {
    driver: TransformDriver<E, F>,
    stylesheet: Option<ImportedStylesheet>,
    /// Insertion-ordered `(name, value)` pairs.
    parameters: Vec<(String, String)>,
}

impl<E, F> Processor<E, F>
where
    E: Engine + Send + 'static,
    F: Fetcher + 'static,
{
    pub fn new(driver: TransformDriver<E, F>) -> Self {
        Self {
            driver,
            stylesheet: None,
            parameters: Vec::new(),
        }
    }

    pub fn driver(&self) -> &TransformDriver<E, F> {
        &self.driver
    }

    /// Imports a stylesheet whose relative imports cannot be resolved.
    pub fn import_stylesheet(&mut self, stylesheet: &[u8]) -> Result<(), TransformError> {
        self.import_stylesheet_with_base(stylesheet, DEFAULT_BASE_URI)
    }

    /// Imports a stylesheet located at `base_uri`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::StylesheetParse` if it is not well-formed XML.
    pub fn import_stylesheet_with_base(
        &mut self,
        stylesheet: &[u8],
        base_uri: &str,
    ) -> Result<(), TransformError> {
        check_well_formed(stylesheet).map_err(TransformError::StylesheetParse)?;
        self.stylesheet = Some(ImportedStylesheet {
            bytes: stylesheet.to_vec(),
            base_uri: base_uri.to_string(),
        });
        Ok(())
    }

    pub fn has_stylesheet(&self) -> bool {
        self.stylesheet.is_some()
    }

    /// Sets a top-level parameter. Parameters are not namespaced; the
    /// namespace is accepted and ignored.
    pub fn set_parameter(&mut self, _namespace: Option<&str>, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.parameters.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.parameters.push((name.to_string(), value)),
        }
    }

    pub fn get_parameter(&self, _namespace: Option<&str>, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove_parameter(&mut self, _namespace: Option<&str>, name: &str) {
        self.parameters.retain(|(n, _)| n != name);
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    /// Forgets the stylesheet and all parameters.
    pub fn reset(&mut self) {
        self.stylesheet = None;
        self.clear_parameters();
    }

    fn engine_params(&self) -> Vec<(String, String)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.clone(), xpath_string_literal(value)))
            .collect()
    }

    fn prepare(&self, source: &[u8]) -> Result<&ImportedStylesheet, TransformError> {
        let stylesheet = self.stylesheet.as_ref().ok_or(TransformError::StylesheetNotImported)?;
        check_well_formed(source).map_err(TransformError::SourceParse)?;
        Ok(stylesheet)
    }

    pub fn transform_to_output(&self, source: &[u8]) -> Result<TransformOutput, TransformError> {
        let stylesheet = self.prepare(source)?;
        let params = self.engine_params();
        debug!("Transforming with {} parameters", params.len());
        self.driver
            .transform(source, &stylesheet.bytes, &stylesheet.base_uri, &params)
    }

    pub fn transform_to_text(&self, source: &[u8]) -> Result<String, TransformError> {
        self.transform_to_output(source)?.into_string()
    }

    pub async fn transform_to_output_async(&self, source: &[u8]) -> Result<TransformOutput, TransformError> {
        let stylesheet = self.prepare(source)?;
        self.driver
            .transform_async(
                source.to_vec(),
                stylesheet.bytes.clone(),
                stylesheet.base_uri.clone(),
                self.engine_params(),
            )
            .await
    }
}
