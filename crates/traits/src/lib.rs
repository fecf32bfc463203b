//! Shared abstractions for the xslbridge crates.
//!
//! The transformation engine itself lives outside this workspace. This crate
//! describes the narrow surface the bridge needs from it (expression
//! evaluation, document parsing, a transform entry point) and the callbacks
//! the bridge hands back to it (sorting and external document loading).

pub mod engine;
pub mod fetch;
pub mod security;
pub mod sort;
pub mod value;

pub use engine::{
    DocumentParser, Engine, EngineError, EngineOptions, EvalContext, ExpressionEvaluator,
    HeadElement, LoadKind, MetaAttributes, ResultTree, TransformHooks, TransformRequest,
};
pub use fetch::{FetchError, FetchedBytes, Fetcher, InMemoryFetcher};
pub use security::{Access, Capability, SecurityPolicy};
pub use sort::{CaseOrder, MAX_SORT_KEYS, SortDataType, SortOrder, SortSpecification};
pub use value::{Value, format_number, parse_number};
