use fluentree_dom::{Document, NodeId};

use crate::error::Error;

/// Result of evaluating a path expression.
///
/// Node sets are always duplicate-free and in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodes(Vec<NodeId>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nodes(_) => "node-set",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn to_number(&self, doc: &Document) -> f64 {
        match self {
            Value::Nodes(_) => string_to_number(&self.to_string_value(doc)),
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
        }
    }

    /// String value; for a node set that of its first node.
    pub fn to_string_value(&self, doc: &Document) -> String {
        match self {
            Value::Nodes(nodes) => nodes.first().map(|&n| doc.string_value(n)).unwrap_or_default(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
        }
    }

    pub fn into_nodes(self) -> Result<Vec<NodeId>, Error> {
        match self {
            Value::Nodes(nodes) => Ok(nodes),
            other => Err(Error::type_error(format!("expected a node-set, got {}", other.type_name()))),
        }
    }
}

/// Number conversion: optional minus, digits with an optional fraction,
/// surrounding whitespace allowed. Anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != ".";
    if valid { trimmed.parse().unwrap_or(f64::NAN) } else { f64::NAN }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        // f64 Display never uses exponent notation and drops a zero fraction.
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", 42.0)]
    #[case(" -1.5 ", -1.5)]
    #[case(".5", 0.5)]
    #[case("3.", 3.0)]
    fn numbers_from_strings(#[case] input: &str, #[case] expected: f64) {
        assert!((string_to_number(input) - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case("")]
    #[case("1e3")]
    #[case("inf")]
    #[case("12abc")]
    #[case(".")]
    #[case("--1")]
    fn non_numbers_are_nan(#[case] input: &str) {
        assert!(string_to_number(input).is_nan());
    }

    #[rstest]
    #[case(1.0, "1")]
    #[case(-0.0, "0")]
    #[case(2.5, "2.5")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    fn numbers_to_strings(#[case] input: f64, #[case] expected: &str) {
        assert_eq!(number_to_string(input), expected);
    }

    #[test]
    fn boolean_conversion() {
        assert!(!Value::Nodes(Vec::new()).to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(Value::String("false".into()).to_boolean());
    }
}
