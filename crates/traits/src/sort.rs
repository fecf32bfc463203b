//! Sort specifications attached to an ordering construct.

use std::str::FromStr;

/// Number of sort keys the engine supports on one construct. A list this
/// long or longer is never sorted.
pub const MAX_SORT_KEYS: usize = 15;

/// How the selected value of a sort key is compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDataType {
    #[default]
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Whether lowercase or uppercase letters sort first among otherwise equal
/// strings. `Unspecified` defers to the collation locale's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CaseOrder {
    LowerFirst,
    UpperFirst,
    #[default]
    Unspecified,
}

// Unrecognised attribute values fall back to the defaults instead of failing:
// a sort must never abort the transformation.
impl FromStr for SortDataType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "number" => SortDataType::Number,
            _ => SortDataType::Text,
        })
    }
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "descending" => SortOrder::Descending,
            _ => SortOrder::Ascending,
        })
    }
}

impl FromStr for CaseOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "lower-first" => CaseOrder::LowerFirst,
            "upper-first" => CaseOrder::UpperFirst,
            _ => CaseOrder::Unspecified,
        })
    }
}

/// One sort key: a compiled selection expression owned by the engine plus
/// the comparison settings that apply to its values.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpecification<X> {
    pub select: X,
    pub data_type: SortDataType,
    pub order: SortOrder,
    pub lang: Option<String>,
    pub case_order: CaseOrder,
}

impl<X> SortSpecification<X> {
    /// A text, ascending key with no explicit language or case order.
    pub fn new(select: X) -> Self {
        Self {
            select,
            data_type: SortDataType::Text,
            order: SortOrder::Ascending,
            lang: None,
            case_order: CaseOrder::Unspecified,
        }
    }

    /// Builds a specification from the already-evaluated attribute values of
    /// a sort element. Missing attributes take their defaults; an empty
    /// `lang` counts as missing.
    pub fn from_attributes(
        select: X,
        data_type: Option<&str>,
        order: Option<&str>,
        lang: Option<&str>,
        case_order: Option<&str>,
    ) -> Self {
        let attr = |v: Option<&str>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        Self {
            select,
            data_type: attr(data_type).parse().unwrap_or_default(),
            order: attr(order).parse().unwrap_or_default(),
            lang: lang.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
            case_order: attr(case_order).parse().unwrap_or_default(),
        }
    }

    pub fn with_data_type(mut self, data_type: SortDataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_case_order(mut self, case_order: CaseOrder) -> Self {
        self.case_order = case_order;
        self
    }

    pub fn is_numeric(&self) -> bool {
        self.data_type == SortDataType::Number
    }

    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Descending
    }
}
