//! Results of engine expression evaluation and their XPath 1.0 coercions.

use std::fmt;

/// The raw result of evaluating a compiled expression.
///
/// Node-sets are carried as the string-values of their nodes in document
/// order; the sort machinery never needs node identity, only the value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodes(Vec<String>),
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl fmt::Display for Value {
    /// Coerces the value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nodes(nodes) => f.write_str(nodes.first().map(String::as_str).unwrap_or("")),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Parses a string with the XPath 1.0 `Number` grammar.
///
/// Only an optional minus sign, digits and a single decimal point are
/// accepted, surrounded by optional XML whitespace. Exponents, a leading `+`
/// and spelled-out infinities are not numbers and yield NaN.
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_xml_space);
    let body = trimmed.strip_prefix('-').unwrap_or(trimmed);

    let mut digits = 0;
    let mut dots = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return f64::NAN,
        }
    }
    if digits == 0 || dots > 1 {
        return f64::NAN;
    }

    trimmed.parse().unwrap_or(f64::NAN)
}

/// Formats a number the way XPath 1.0 `string()` does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e17 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
