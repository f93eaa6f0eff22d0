//! Node fetch engine and fluent query façade.
//!
//! [`Fetcher`] is the engine: one path expression evaluated over a context
//! set, shaped by [`FetchOptions`] and optional `filter` / `stop_at`
//! predicates. It talks to the tree only through [`TreeModel`];
//! [`XPathModel`] is the implementation over a `fluentree_dom::Document`.
//! [`Nodes`] wraps both into a chainable, jQuery-like traversal API.

mod fetch;
mod model;
mod nodes;
mod options;
mod xpath_model;

pub use fetch::{FetchError, Fetcher, Predicate};
pub use model::{EvaluateError, Evaluation, TreeModel};
pub use nodes::Nodes;
pub use options::FetchOptions;
pub use xpath_model::XPathModel;
