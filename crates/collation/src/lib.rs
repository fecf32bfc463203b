//! Locale-aware string comparison for text sort keys.
//!
//! Comparison uses the CLDR root collation tailored for the requested
//! locale, at tertiary strength: base letters, then accents, then case all
//! matter. This differs from raw codepoint order (`"B" < "a"` by
//! codepoint, `"a" < "B"` here).
//!
//! Failures never surface as errors. A malformed locale tag or missing
//! collation data degrades to treating every pair as equal, so the sort
//! falls back to document order instead of aborting the transformation.

use icu::collator::{CaseFirst, Collator, CollatorOptions, Strength};
use icu::locid::Locale;
use log::{debug, warn};
use std::cmp::Ordering;
use std::fmt;
use xslbridge_traits::CaseOrder;

/// A collator configured for one sort key.
///
/// Building the underlying collator loads locale data, so it is done once
/// per sort key and reused for every comparison of that sort.
pub struct CollationComparator {
    locale: Option<String>,
    case_order: CaseOrder,
    collator: Option<Collator>,
}

impl fmt::Debug for CollationComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollationComparator")
            .field("locale", &self.locale)
            .field("case_order", &self.case_order)
            .field("usable", &self.collator.is_some())
            .finish()
    }
}

impl CollationComparator {
    /// Creates a comparator for `locale` (a BCP 47 tag; `None` or empty
    /// means the root collation) and the given case ordering.
    pub fn new(locale: Option<&str>, case_order: CaseOrder) -> Self {
        let locale = locale.map(str::trim).filter(|l| !l.is_empty());
        let collator = match build_collator(locale, case_order) {
            Ok(collator) => Some(collator),
            Err(message) => {
                warn!(
                    "Collation unavailable for locale {:?}: {}. Treating strings as equal.",
                    locale, message
                );
                None
            }
        };
        Self {
            locale: locale.map(str::to_string),
            case_order,
            collator,
        }
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn case_order(&self) -> CaseOrder {
        self.case_order
    }

    /// Whether a collator could be built. When `false`, [`compare`] always
    /// returns `Ordering::Equal`.
    ///
    /// [`compare`]: CollationComparator::compare
    pub fn is_usable(&self) -> bool {
        self.collator.is_some()
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => Ordering::Equal,
        }
    }
}

fn build_collator(locale: Option<&str>, case_order: CaseOrder) -> Result<Collator, String> {
    let locale = match locale {
        Some(tag) => tag
            .parse::<Locale>()
            .map_err(|e| format!("invalid language tag '{}': {}", tag, e))?,
        None => Locale::UND,
    };

    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    options.case_first = match case_order {
        CaseOrder::LowerFirst => Some(CaseFirst::LowerFirst),
        CaseOrder::UpperFirst => Some(CaseFirst::UpperFirst),
        CaseOrder::Unspecified => None,
    };

    debug!("Building collator for locale '{}' ({:?})", locale, case_order);
    Collator::try_new(&locale.into(), options).map_err(|e| e.to_string())
}

/// One-shot comparison of `a` and `b`.
///
/// Prefer [`CollationComparator`] when comparing many strings under the same
/// settings.
pub fn compare(a: &str, b: &str, locale: Option<&str>, case_order: CaseOrder) -> Ordering {
    CollationComparator::new(locale, case_order).compare(a, b)
}
