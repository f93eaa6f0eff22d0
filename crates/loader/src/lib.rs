//! Format loaders that turn external data into fluentree documents.
//!
//! Loaders share the [`Loadable`] capability and are looked up by content
//! type through a [`LoaderRegistry`]:
//!
//! ```
//! use fluentree_loader::{LoadSource, LoaderOptions, LoaderRegistry};
//!
//! let registry = LoaderRegistry::discover();
//! let source = LoadSource::from("name,size\nbolt,3\n");
//! let doc = registry.load(&source, "text/csv", &LoaderOptions::default()).unwrap().unwrap();
//! let list = doc.document_element().unwrap();
//! assert_eq!(doc.string_value(list), "bolt3");
//!
//! assert!(registry.load(&source, "text/html", &LoaderOptions::default()).unwrap().is_none());
//! ```

pub mod csv;
mod error;
pub mod jsonml;
mod loadable;
pub mod qualified_name;
mod registry;

pub use csv::{CsvLoader, JSON_DOM_NS};
pub use error::LoadError;
pub use jsonml::JsonMlLoader;
pub use loadable::{FieldMap, LoadSource, Loadable, LoaderOptions};
pub use registry::{LoaderRegistration, LoaderRegistry, registered_loaders};
