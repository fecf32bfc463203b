//! Sorting of engine selections by one or more sort keys.
//!
//! The engine hands over the selected items and the ordered list of
//! [`SortSpecification`]s attached to the ordering construct. Keys are
//! evaluated through the engine's expression evaluator ([`SortKeyEvaluator`])
//! and compared level by level ([`SortEngine`]); the result is always a
//! stable permutation of the input.
//!
//! [`SortSpecification`]: xslbridge_traits::SortSpecification

mod engine;
mod key;

pub use engine::{SortEngine, apply_permutation, compare_keys};
pub use key::{SortKey, SortKeyEvaluator};
