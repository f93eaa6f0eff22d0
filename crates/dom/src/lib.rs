//! Arena-backed document tree used by the fluentree query layer.
//!
//! A [`Document`] owns every node it creates. Nodes are addressed by
//! [`NodeId`] handles, which are cheap to copy and compare but only meaningful
//! together with the document that issued them.
//!
//! ```
//! use fluentree_dom::{Document, NodeKind};
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("list").unwrap();
//! doc.append_child(doc.root(), root).unwrap();
//! let item = doc.append_element(root, "item", "one").unwrap();
//! doc.set_attribute(item, "id", "i1").unwrap();
//!
//! assert_eq!(doc.kind(item), NodeKind::Element);
//! assert_eq!(doc.string_value(root), "one");
//! assert_eq!(doc.attribute_value(item, None, "id"), Some("i1"));
//! ```

mod document;
mod error;
mod fragment;
pub mod name;
mod node;
mod order;

pub use document::{Document, NamespaceDecl};
pub use error::DomError;
pub use fragment::Fragment;
pub use node::{NodeId, NodeKind, QName};

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace bound to the reserved `xmlns` prefix.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
