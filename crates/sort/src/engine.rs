//! Diminishing-increment insertion sort with lazily evaluated key levels.

use crate::key::{SortKey, SortKeyEvaluator};
use log::debug;
use std::cmp::Ordering;
use xslbridge_collation::CollationComparator;
use xslbridge_traits::{
    ExpressionEvaluator, MAX_SORT_KEYS, SortDataType, SortOrder, SortSpecification,
};

/// Sorts engine selections by an ordered list of sort specifications.
///
/// The primary key is evaluated for every item up front. A deeper key is
/// only evaluated once some pair is still tied on every key before it, and
/// then once for the whole selection; its array is reused for every later
/// comparison of the same sort. Items whose keys all tie keep their
/// original relative order.
#[derive(Debug, Clone, Default)]
pub struct SortEngine {
    default_locale: Option<String>,
}

impl SortEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locale used for text keys that do not name one.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    /// Reorders `items` in place.
    ///
    /// Never fails. With fewer than two items, no specifications, too many
    /// specifications, or when key storage cannot be allocated, `items` is
    /// left exactly as it was.
    pub fn sort<E: ExpressionEvaluator + ?Sized>(
        &self,
        evaluator: &E,
        items: &mut [E::Item],
        specs: &[SortSpecification<E::Expr>],
    ) {
        if items.len() < 2 || specs.is_empty() {
            return;
        }
        if specs.len() >= MAX_SORT_KEYS {
            debug!(
                "Ignoring sort with {} keys (limit is {})",
                specs.len(),
                MAX_SORT_KEYS - 1
            );
            return;
        }

        match self.sorted_permutation(evaluator, items, specs) {
            Some(permutation) => apply_permutation(items, permutation),
            None => debug!("Sort abandoned, keeping {} items in input order", items.len()),
        }
    }

    /// Computes the sorted order as a list of original positions, without
    /// touching `items`.
    fn sorted_permutation<E: ExpressionEvaluator + ?Sized>(
        &self,
        evaluator: &E,
        items: &[E::Item],
        specs: &[SortSpecification<E::Expr>],
    ) -> Option<Vec<usize>> {
        let len = items.len();
        let mut run = SortRun::new(self, evaluator, items, specs)?;

        let mut permutation = Vec::new();
        permutation.try_reserve_exact(len).ok()?;
        permutation.extend(0..len);

        let mut incr = len / 2;
        while incr > 0 {
            for i in incr..len {
                let mut j = i;
                while j >= incr {
                    let (a, b) = (permutation[j - incr], permutation[j]);
                    if run.compare(a, b)? == Ordering::Greater {
                        permutation.swap(j - incr, j);
                        j -= incr;
                    } else {
                        break;
                    }
                }
            }
            incr /= 2;
        }

        debug!(
            "Sorted {} items, evaluated {} of {} key levels",
            len,
            run.evaluated_levels(),
            specs.len()
        );
        Some(permutation)
    }
}

/// State of one sort call. Dropped, with every key array it computed, when
/// the sort returns.
struct SortRun<'r, E: ExpressionEvaluator + ?Sized> {
    keys: SortKeyEvaluator<'r, E>,
    items: &'r [E::Item],
    specs: &'r [SortSpecification<E::Expr>],
    default_locale: Option<&'r str>,
    /// Key arrays per level, indexed by original position.
    levels: Vec<Option<Vec<Option<SortKey>>>>,
    collators: Vec<Option<CollationComparator>>,
}

impl<'r, E: ExpressionEvaluator + ?Sized> SortRun<'r, E> {
    fn new(
        engine: &'r SortEngine,
        evaluator: &'r E,
        items: &'r [E::Item],
        specs: &'r [SortSpecification<E::Expr>],
    ) -> Option<Self> {
        let mut run = Self {
            keys: SortKeyEvaluator::new(evaluator),
            items,
            specs,
            default_locale: engine.default_locale(),
            levels: (0..specs.len()).map(|_| None).collect(),
            collators: (0..specs.len()).map(|_| None).collect(),
        };
        run.ensure_level(0)?;
        Some(run)
    }

    fn evaluated_levels(&self) -> usize {
        self.levels.iter().filter(|l| l.is_some()).count()
    }

    fn ensure_level(&mut self, level: usize) -> Option<()> {
        if self.levels[level].is_none() {
            let specs = self.specs;
            let spec = &specs[level];
            self.levels[level] = Some(self.keys.evaluate_all(spec, self.items)?);
            if spec.data_type == SortDataType::Text {
                let locale = spec.lang.as_deref().or(self.default_locale);
                self.collators[level] = Some(CollationComparator::new(locale, spec.case_order));
            }
        }
        Some(())
    }

    /// Compares the items originally at positions `a` and `b`. `None` means
    /// a key array could not be allocated and the sort must be abandoned.
    fn compare(&mut self, a: usize, b: usize) -> Option<Ordering> {
        for level in 0..self.specs.len() {
            self.ensure_level(level)?;
            let keys = self.levels[level].as_deref()?;
            let ordering = compare_keys(
                keys[a].as_ref(),
                keys[b].as_ref(),
                self.specs[level].order,
                self.collators[level].as_ref(),
            );
            if ordering != Ordering::Equal {
                return Some(ordering);
            }
        }
        Some(a.cmp(&b))
    }
}

/// Compares two keys of the same level.
///
/// Absent keys sort before present ones and NaN keys before numbers. Those
/// placements are fixed: `order` only reverses comparisons between two
/// ordinary values.
pub fn compare_keys(
    a: Option<&SortKey>,
    b: Option<&SortKey>,
    order: SortOrder,
    collator: Option<&CollationComparator>,
) -> Ordering {
    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(SortKey::NaN), Some(SortKey::NaN)) => return Ordering::Equal,
        (Some(SortKey::NaN), Some(_)) => return Ordering::Less,
        (Some(_), Some(SortKey::NaN)) => return Ordering::Greater,
        (Some(SortKey::Number(x)), Some(SortKey::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Some(SortKey::Text(x)), Some(SortKey::Text(y))) => collator
            .map(|c| c.compare(x, y))
            .unwrap_or(Ordering::Equal),
        // A level has a single data type.
        _ => Ordering::Equal,
    };
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// Rearranges `items` so that slot `k` holds the item previously at
/// `permutation[k]`. `permutation` must be a permutation of `0..items.len()`.
pub fn apply_permutation<T>(items: &mut [T], mut permutation: Vec<usize>) {
    for start in 0..items.len() {
        let mut slot = start;
        loop {
            let source = permutation[slot];
            permutation[slot] = slot;
            if source == start || source == slot {
                break;
            }
            items.swap(slot, source);
            slot = source;
        }
    }
}
