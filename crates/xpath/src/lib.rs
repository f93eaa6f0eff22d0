//! Path-expression evaluation for `fluentree` documents.
//!
//! Covers the XPath 1.0 expression language minus variables and the
//! namespace axis: location paths with all other axes, predicates, unions,
//! comparisons, arithmetic and the core string/number/boolean functions.
//!
//! ```
//! use fluentree_dom::Document;
//! use fluentree_xpath::{Evaluator, StaticContextBuilder, Value};
//!
//! let mut doc = Document::new();
//! let list = doc.create_element("list").unwrap();
//! doc.append_child(doc.root(), list).unwrap();
//! doc.append_element(list, "item", "one").unwrap();
//! doc.append_element(list, "item", "two").unwrap();
//!
//! let evaluator = Evaluator::new(StaticContextBuilder::new().build());
//! let count = evaluator.evaluate(&doc, "count(//item)", None).unwrap();
//! assert_eq!(count, Value::Number(2.0));
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod value;

pub use context::{StaticContext, StaticContextBuilder};
pub use error::{Error, ErrorCode};
pub use evaluator::{Evaluator, evaluate};
pub use value::Value;
