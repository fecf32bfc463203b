use log::debug;
use xslbridge_traits::{
    EvalContext, ExpressionEvaluator, SortDataType, SortSpecification, Value, parse_number,
};

/// The evaluated, type-coerced value of one sort key for one item.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Text(String),
    Number(f64),
    /// A numeric key whose value was not a number. Never stores an actual
    /// NaN float: `Number` always holds a comparable value.
    NaN,
}

impl SortKey {
    /// Coerces an evaluation result to the declared key type.
    ///
    /// Numeric keys are parsed from the string-value, so booleans and
    /// infinities become [`SortKey::NaN`].
    pub fn from_value(value: &Value, data_type: SortDataType) -> Self {
        match data_type {
            SortDataType::Text => SortKey::Text(value.to_string()),
            SortDataType::Number => {
                let n = parse_number(&value.to_string());
                if n.is_nan() {
                    SortKey::NaN
                } else {
                    SortKey::Number(n)
                }
            }
        }
    }
}

/// Evaluates sort keys through the engine's expression evaluator.
pub struct SortKeyEvaluator<'e, E: ExpressionEvaluator + ?Sized> {
    evaluator: &'e E,
}

impl<'e, E: ExpressionEvaluator + ?Sized> SortKeyEvaluator<'e, E> {
    pub fn new(evaluator: &'e E) -> Self {
        Self { evaluator }
    }

    /// Evaluates `spec` for `item`.
    ///
    /// `position` is the 1-based position of the item in the selection as
    /// it was before sorting started, and `size` the selection length.
    /// Returns `None` ("absent") when a text key's expression fails to
    /// evaluate; a failing numeric key yields [`SortKey::NaN`].
    pub fn evaluate(
        &self,
        spec: &SortSpecification<E::Expr>,
        item: &E::Item,
        size: usize,
        position: usize,
    ) -> Option<SortKey> {
        let context = EvalContext {
            item,
            position,
            size,
        };
        match self.evaluator.evaluate(&spec.select, context) {
            Ok(value) => Some(SortKey::from_value(&value, spec.data_type)),
            Err(err) => {
                debug!("Sort key evaluation failed at position {}: {}", position, err);
                match spec.data_type {
                    SortDataType::Number => Some(SortKey::NaN),
                    SortDataType::Text => None,
                }
            }
        }
    }

    /// Evaluates `spec` for every item, indexed by original position.
    ///
    /// Returns `None` if the key array cannot be allocated.
    pub fn evaluate_all(
        &self,
        spec: &SortSpecification<E::Expr>,
        items: &[E::Item],
    ) -> Option<Vec<Option<SortKey>>> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(items.len()).ok()?;
        let size = items.len();
        keys.extend(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| self.evaluate(spec, item, size, i + 1)),
        );
        Some(keys)
    }
}
