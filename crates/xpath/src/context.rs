use std::collections::HashMap;

use fluentree_dom::XML_NS;

/// Compile-time bindings for path expressions.
///
/// The `xml` prefix is always bound; other prefixes are registered through
/// [`StaticContextBuilder::with_namespace`]. Unprefixed name tests never pick
/// up a default namespace.
#[derive(Debug, Clone)]
pub struct StaticContext {
    namespaces: HashMap<String, String>,
}

impl Default for StaticContext {
    fn default() -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert("xml".to_string(), XML_NS.to_string());
        Self { namespaces }
    }
}

impl StaticContext {
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Registered prefixes, sorted.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

pub struct StaticContextBuilder {
    ctx: StaticContext,
}

impl Default for StaticContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticContextBuilder {
    pub fn new() -> Self {
        Self { ctx: StaticContext::default() }
    }

    /// Register a prefix → URI mapping. Attempts to rebind `xml` are ignored.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if prefix == "xml" {
            return self;
        }
        self.ctx.namespaces.insert(prefix, uri.into());
        self
    }

    pub fn build(self) -> StaticContext {
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_prefix_cannot_be_rebound() {
        let ctx = StaticContextBuilder::new()
            .with_namespace("xml", "urn:other")
            .with_namespace("json", "urn:carica-json-dom.2013")
            .build();
        assert_eq!(ctx.namespace_uri("xml"), Some(XML_NS));
        assert_eq!(ctx.namespace_uri("json"), Some("urn:carica-json-dom.2013"));
        assert_eq!(ctx.prefixes(), vec!["json", "xml"]);
    }
}
