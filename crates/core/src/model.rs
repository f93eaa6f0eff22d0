use std::fmt::Debug;
use std::hash::Hash;

/// Outcome of evaluating a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation<N> {
    Nodes(Vec<N>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl<N> Evaluation<N> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Evaluation::Nodes(_) => "node sequence",
            Evaluation::Boolean(_) => "boolean",
            Evaluation::Number(_) => "number",
            Evaluation::String(_) => "string",
        }
    }

    /// Non-empty node sequence, `true`, a number other than zero/NaN, or a
    /// non-empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Evaluation::Nodes(nodes) => !nodes.is_empty(),
            Evaluation::Boolean(b) => *b,
            Evaluation::Number(n) => *n != 0.0 && !n.is_nan(),
            Evaluation::String(s) => !s.is_empty(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error(transparent)]
    XPath(#[from] fluentree_xpath::Error),
    #[error("expected a node sequence, got a {found}")]
    NotNodes { found: &'static str },
    #[error("{0}")]
    Model(String),
}

/// The two tree capabilities the fetch engine relies on.
///
/// Implementations own (or borrow) the tree; `Node` is a cheap handle whose
/// equality is node identity.
pub trait TreeModel {
    type Node: Clone + Eq + Hash + Debug;

    /// Evaluates `expression` with `context` as context node, or relative to
    /// the document when `context` is `None`. Node results are in document order.
    fn evaluate(&self, expression: &str, context: Option<&Self::Node>)
    -> Result<Evaluation<Self::Node>, EvaluateError>;

    /// Removes duplicates and sorts `nodes` into document order.
    fn document_order(&self, nodes: Vec<Self::Node>) -> Vec<Self::Node>;
}
