//! JSON-ML loader: `["name", {"attr": "value"}?, child...]` arrays become
//! elements, scalars become text.

use fluentree_dom::{Document, DomError, Fragment, NodeId, NodeKind};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::loadable::{LoadSource, Loadable, LoaderOptions};

const CONTENT_TYPES: &[&str] = &["jsonml", "application/jsonml", "application/jsonml+json"];

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMlLoader;

impl JsonMlLoader {
    /// Appends the JSON-ML `value` below `parent`.
    ///
    /// Empty arrays, `null` and objects outside the attribute position are
    /// skipped, as is text directly below the document node.
    pub fn transfer_to(&self, doc: &mut Document, parent: NodeId, value: &Value) -> Result<(), LoadError> {
        match value {
            Value::Array(items) if !items.is_empty() => self.transfer_element(doc, parent, items),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                if doc.kind(parent) == NodeKind::Document {
                    tracing::debug!("skipping text outside the document element");
                    return Ok(());
                }
                let text = doc.create_text(scalar_text(value));
                doc.append_child(parent, text)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn transfer_element(&self, doc: &mut Document, parent: NodeId, items: &[Value]) -> Result<(), LoadError> {
        let name = match items.first() {
            Some(Value::String(name)) => name.as_str(),
            other => {
                return Err(LoadError::InvalidStructure(format!(
                    "element name must be a string, found {}",
                    other.map(Value::to_string).unwrap_or_default()
                )));
            }
        };
        let (properties, children) = match items.get(1) {
            Some(Value::Object(properties)) => (Some(properties), &items[2..]),
            _ => (None, &items[1..]),
        };

        let prefix = name.split_once(':').map(|(prefix, _)| prefix);
        let element = match namespace_for(doc, parent, prefix, properties) {
            Some(uri) => doc.create_element_ns(Some(&uri), name)?,
            None => doc.create_element(name)?,
        };
        doc.append_child(parent, element)?;

        if let Some(properties) = properties {
            declare_namespaces(doc, element, properties)?;
            set_attributes(doc, element, properties)?;
        }
        for child in children {
            self.transfer_to(doc, element, child)?;
        }
        Ok(())
    }

    fn json(&self, source: &LoadSource, content_type: &str) -> Result<Option<Value>, LoadError> {
        if let LoadSource::Json(value) = source {
            return Ok(Some(value.clone()));
        }
        let Some(text) = source.read_text() else {
            return Ok(None);
        };
        let text = text.trim_start();
        if !text.starts_with(['[', '{']) {
            tracing::debug!(source = source.kind(), "source does not look like JSON");
            return Ok(None);
        }
        serde_json::from_str(text).map(Some).map_err(|err| LoadError::malformed(content_type, err))
    }
}

impl Loadable for JsonMlLoader {
    fn id(&self) -> &'static str {
        "jsonml"
    }

    fn supported_types(&self) -> &'static [&'static str] {
        CONTENT_TYPES
    }

    fn load(
        &self,
        source: &LoadSource,
        content_type: &str,
        _options: &LoaderOptions,
    ) -> Result<Option<Document>, LoadError> {
        if !self.supports(content_type) {
            return Ok(None);
        }
        let Some(json) = self.json(source, content_type)? else {
            return Ok(None);
        };
        let mut doc = Document::new();
        let root = doc.root();
        self.transfer_to(&mut doc, root, &json)?;
        Ok(Some(doc))
    }

    fn load_fragment(
        &self,
        source: &LoadSource,
        content_type: &str,
        _options: &LoaderOptions,
    ) -> Result<Option<Fragment>, LoadError> {
        if !self.supports(content_type) {
            return Ok(None);
        }
        let Some(json) = self.json(source, content_type)? else {
            return Ok(None);
        };
        let mut doc = Document::new();
        let fragment = doc.create_fragment();
        self.transfer_to(&mut doc, fragment, &json)?;
        Ok(Some(Fragment::new(doc, fragment)))
    }
}

fn is_namespace_property(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

/// `xmlns` / `xmlns:prefix` property for `prefix`, else whatever is in scope at `scope`.
fn namespace_for(
    doc: &Document,
    scope: NodeId,
    prefix: Option<&str>,
    properties: Option<&Map<String, Value>>,
) -> Option<String> {
    let key = match prefix {
        Some(prefix) => format!("xmlns:{prefix}"),
        None => "xmlns".to_string(),
    };
    let uri = match properties.and_then(|p| p.get(&key)) {
        Some(value) => scalar_text(value),
        None => doc.lookup_namespace_uri(scope, prefix)?.to_string(),
    };
    (!uri.is_empty()).then_some(uri)
}

fn declare_namespaces(doc: &mut Document, element: NodeId, properties: &Map<String, Value>) -> Result<(), LoadError> {
    for (key, value) in properties.iter().filter(|(key, _)| is_namespace_property(key)) {
        let prefix = key.strip_prefix("xmlns:");
        let uri = scalar_text(value);
        if doc.lookup_namespace_uri(element, prefix) != Some(uri.as_str()) {
            doc.declare_namespace(element, prefix, &uri)?;
        }
    }
    Ok(())
}

/// Unprefixed attributes stay in no namespace.
fn set_attributes(doc: &mut Document, element: NodeId, properties: &Map<String, Value>) -> Result<(), LoadError> {
    for (key, value) in properties.iter().filter(|(key, _)| !is_namespace_property(key)) {
        let prefix = key.split_once(':').map(|(prefix, _)| prefix);
        let namespace = match prefix {
            Some(prefix) => Some(
                namespace_for(doc, element, Some(prefix), Some(properties))
                    .ok_or_else(|| DomError::UnboundPrefix(prefix.to_string()))?,
            ),
            None => None,
        };
        doc.set_attribute_ns(element, namespace.as_deref(), key, &scalar_text(value))?;
    }
    Ok(())
}

/// Booleans as `true`/`false`, `null` as empty, nested JSON as compact text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        nested => nested.to_string(),
    }
}
