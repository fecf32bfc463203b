//! The surface of the transformation engine that the bridge configures and
//! calls into, and the callbacks it receives from it.

use crate::security::SecurityPolicy;
use crate::sort::SortSpecification;
use crate::value::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Expression evaluation error: {0}")]
    Evaluation(String),

    #[error("Transformation error: {0}")]
    Transform(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Dynamic context for one expression evaluation.
#[derive(Debug)]
pub struct EvalContext<'a, I> {
    pub item: &'a I,
    /// 1-based position of `item` within the selection.
    pub position: usize,
    pub size: usize,
}

impl<I> Clone for EvalContext<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for EvalContext<'_, I> {}

/// Evaluates compiled expressions against items of the current selection.
pub trait ExpressionEvaluator {
    /// A handle to one node of a selection.
    type Item;
    /// A compiled expression, owned by the engine.
    type Expr;

    fn evaluate(
        &self,
        expr: &Self::Expr,
        context: EvalContext<'_, Self::Item>,
    ) -> Result<Value, EngineError>;
}

/// Parses fetched bytes into an engine-owned document tree.
pub trait DocumentParser {
    type Document;

    fn parse_document(&self, bytes: &[u8], uri: &str) -> Result<Self::Document, EngineError>;
}

/// What an external reference is being loaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// `xsl:import` / `xsl:include`.
    Stylesheet,
    /// `document()` and friends.
    Document,
}

/// Callbacks the engine invokes during a transformation run.
///
/// A fresh implementation is handed to [`Engine::transform`] for each run;
/// nothing is registered process-wide.
pub trait TransformHooks<E: ExpressionEvaluator + ?Sized, P: DocumentParser + ?Sized> {
    /// Reorder `items` according to `specs`. Must not fail: on any problem
    /// the items are left as they are.
    fn sort(&mut self, evaluator: &E, items: &mut [E::Item], specs: &[SortSpecification<E::Expr>]);

    /// Load and parse the external document at `uri`. `None` means the
    /// reference could not be resolved; the engine decides whether that is
    /// fatal.
    fn load_document(&mut self, parser: &P, uri: &str, kind: LoadKind) -> Option<P::Document>;
}

/// Per-run engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub omit_xml_declaration: bool,
    pub max_variables: usize,
    pub exslt: bool,
    pub security: SecurityPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            omit_xml_declaration: true,
            max_variables: 20_000,
            exslt: true,
            security: SecurityPolicy::default(),
        }
    }
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    pub source: &'a [u8],
    pub stylesheet: &'a [u8],
    /// Base URI of the stylesheet, used to resolve relative imports.
    pub base_uri: &'a str,
    /// Top-level parameters as `(name, xpath-expression)` pairs, in order.
    pub params: &'a [(String, String)],
    pub options: &'a EngineOptions,
}

/// The transformation engine.
pub trait Engine {
    type Evaluator: ExpressionEvaluator;
    type Parser: DocumentParser;
    type Output: ResultTree;

    fn transform(
        &mut self,
        request: &TransformRequest<'_>,
        hooks: &mut dyn TransformHooks<Self::Evaluator, Self::Parser>,
    ) -> Result<Self::Output, EngineError>;
}

/// The two attributes of a `<meta>` element that declare an encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaAttributes {
    pub charset: Option<String>,
    pub http_equiv: Option<String>,
}

/// The `<head>` element of an HTML result.
pub trait HeadElement {
    /// Encoding-related attributes of each `<meta>` child, in order.
    /// Attribute names are matched case-insensitively by the engine.
    fn metas(&self) -> Vec<MetaAttributes>;

    /// Insert `<meta http-equiv=… content=…>` as the first child.
    fn prepend_meta(&mut self, http_equiv: &str, content: &str);
}

/// A result tree produced by a transformation.
pub trait ResultTree {
    /// The `method` of the effective `xsl:output`, if declared.
    fn output_method(&self) -> Option<&str>;

    /// The `encoding` of the effective `xsl:output`, if declared.
    fn output_encoding(&self) -> Option<&str>;

    /// Whether the engine built the result as an HTML document.
    fn is_html_document(&self) -> bool;

    /// The `<head>` child of the root `<html>` element, matched
    /// case-insensitively.
    fn html_head(&mut self) -> Option<&mut dyn HeadElement>;

    fn serialize(&self) -> Result<Vec<u8>, EngineError>;
}
