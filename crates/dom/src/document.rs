use std::sync::OnceLock;

use crate::name::split_qname;
use crate::{DomError, NodeId, NodeKind, QName, XML_NS, XMLNS_NS};

/// Namespace declaration carried by an element (`xmlns` / `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    name: Option<QName>,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
    namespaces: Vec<NamespaceDecl>,
}

impl NodeData {
    fn new(kind: NodeKind, name: Option<QName>, value: String) -> Self {
        Self {
            kind,
            name,
            value,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }
}

/// Owner of a node tree (plus any detached subtrees created from it).
///
/// Accessors index straight into the arena and panic when handed a [`NodeId`]
/// that this document never issued.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    order: OnceLock<Vec<usize>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document, None, String::new())],
            order: OnceLock::new(),
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// First element child of the document node.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root()).iter().copied().find(|&c| self.kind(c) == NodeKind::Element)
    }

    /// Number of nodes ever created in this document, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0]
    }

    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.0]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        self.touch();
        id
    }

    /// Drops cached document-order ranks after a structural change.
    fn touch(&mut self) {
        self.order = OnceLock::new();
    }

    pub(crate) fn ranks(&self) -> &[usize] {
        self.order.get_or_init(|| crate::order::compute_ranks(self))
    }

    // ---- creation -------------------------------------------------------

    /// Creates a detached element without namespace. A prefixed name keeps its
    /// prefix but stays unbound; use [`Document::create_element_ns`] for namespaces.
    pub fn create_element(&mut self, name: &str) -> Result<NodeId, DomError> {
        let (prefix, local) = split_qname(name)?;
        let qname = QName {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            ns_uri: None,
        };
        Ok(self.push(NodeData::new(NodeKind::Element, Some(qname), String::new())))
    }

    /// Creates a detached element in `ns_uri` (`None` or empty means no namespace).
    pub fn create_element_ns(
        &mut self,
        ns_uri: Option<&str>,
        qualified_name: &str,
    ) -> Result<NodeId, DomError> {
        let qname = namespaced_qname(ns_uri, qualified_name)?;
        Ok(self.push(NodeData::new(NodeKind::Element, Some(qname), String::new())))
    }

    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.push(NodeData::new(NodeKind::Text, None, value.into()))
    }

    pub fn create_comment(&mut self, value: impl Into<String>) -> NodeId {
        self.push(NodeData::new(NodeKind::Comment, None, value.into()))
    }

    pub fn create_processing_instruction(
        &mut self,
        target: &str,
        data: impl Into<String>,
    ) -> Result<NodeId, DomError> {
        if !crate::name::is_ncname(target) {
            return Err(DomError::InvalidName(target.to_string()));
        }
        Ok(self.push(NodeData::new(
            NodeKind::ProcessingInstruction,
            Some(QName::local(target)),
            data.into(),
        )))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::new(NodeKind::DocumentFragment, None, String::new()))
    }

    // ---- structure ------------------------------------------------------

    /// Appends `child` as last child of `parent`, detaching it from its previous
    /// parent first. Appending a fragment moves the fragment's children instead.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.kind(child) == NodeKind::DocumentFragment {
            for &node in self.children(child) {
                self.check_append(parent, node)?;
            }
            let elements =
                self.children(child).iter().filter(|&&n| self.kind(n) == NodeKind::Element).count();
            if self.kind(parent) == NodeKind::Document && elements > 1 {
                return Err(DomError::HierarchyRequest {
                    parent,
                    child,
                    reason: "document already has a document element",
                });
            }
            let moved = std::mem::take(&mut self.data_mut(child).children);
            for node in moved {
                self.data_mut(node).parent = None;
                self.attach(parent, node);
            }
            self.touch();
            return Ok(());
        }
        self.check_append(parent, child)?;
        self.detach(child);
        self.attach(parent, child);
        self.touch();
        Ok(())
    }

    /// Creates an element named `name`, appends it to `parent` and, when `text`
    /// is not empty, gives it a single text child.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: &str,
        text: &str,
    ) -> Result<NodeId, DomError> {
        self.append_element_with(parent, name, text, &[])
    }

    /// [`append_element`](Self::append_element) plus attributes, set through
    /// [`set_attribute`](Self::set_attribute) once the element is in place so
    /// prefixes resolve against its ancestors.
    pub fn append_element_with(
        &mut self,
        parent: NodeId,
        name: &str,
        text: &str,
        attributes: &[(&str, &str)],
    ) -> Result<NodeId, DomError> {
        let element = self.create_element(name)?;
        self.append_child(parent, element)?;
        for (attribute, value) in attributes {
            self.set_attribute(element, attribute, value)?;
        }
        if !text.is_empty() {
            let text = self.create_text(text);
            self.append_child(element, text)?;
        }
        Ok(element)
    }

    fn check_append(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let reject = |reason| Err(DomError::HierarchyRequest { parent, child, reason });
        if !self.kind(parent).is_container() {
            return reject("parent cannot have children");
        }
        match self.kind(child) {
            NodeKind::Document => return reject("document node cannot be a child"),
            NodeKind::Attribute => return reject("attributes are not children"),
            NodeKind::DocumentFragment => return reject("nested fragment"),
            _ => {}
        }
        if child == parent || self.is_ancestor(child, parent) {
            return reject("node would become its own ancestor");
        }
        if self.kind(parent) == NodeKind::Document {
            match self.kind(child) {
                NodeKind::Text => return reject("document node cannot hold text"),
                NodeKind::Element => {
                    if self.document_element().is_some_and(|existing| existing != child) {
                        return reject("document already has a document element");
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(old_parent) = self.data_mut(node).parent.take() {
            self.data_mut(old_parent).children.retain(|&c| c != node);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.data_mut(child).parent = Some(parent);
        self.data_mut(parent).children.push(child);
    }

    /// Deep copy of `node` from `source` into this document, returned detached.
    pub fn import_node(&mut self, source: &Document, node: NodeId) -> Result<NodeId, DomError> {
        let data = source.data(node);
        let copy = match data.kind {
            NodeKind::Document => {
                return Err(DomError::HierarchyRequest {
                    parent: self.root(),
                    child: node,
                    reason: "document node cannot be imported",
                });
            }
            kind => self.push(NodeData {
                kind,
                name: data.name.clone(),
                value: data.value.clone(),
                parent: None,
                children: Vec::new(),
                attributes: Vec::new(),
                namespaces: data.namespaces.clone(),
            }),
        };
        for &attribute in &data.attributes {
            let imported = self.import_node(source, attribute)?;
            self.data_mut(imported).parent = Some(copy);
            self.data_mut(copy).attributes.push(imported);
        }
        for &child in &data.children {
            let imported = self.import_node(source, child)?;
            self.attach(copy, imported);
        }
        Ok(copy)
    }

    // ---- attributes & namespaces ---------------------------------------

    /// Sets an attribute by qualified name. A prefix is resolved against the
    /// namespaces in scope at `element`; `xmlns` / `xmlns:p` become declarations.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.expect_element(element)?;
        if name == "xmlns" {
            self.declare_namespace(element, None, value)?;
            return Ok(());
        }
        if let Some(prefix) = name.strip_prefix("xmlns:") {
            self.declare_namespace(element, Some(prefix), value)?;
            return Ok(());
        }
        let (prefix, _) = split_qname(name)?;
        let ns_uri = match prefix {
            Some(prefix) => Some(
                self.lookup_namespace_uri(element, Some(prefix))
                    .ok_or_else(|| DomError::UnboundPrefix(prefix.to_string()))?
                    .to_string(),
            ),
            None => None,
        };
        self.set_attribute_ns(element, ns_uri.as_deref(), name, value).map(|_| ())
    }

    /// Sets an attribute by expanded name, replacing an existing one with the
    /// same namespace and local name. Returns the attribute node.
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        ns_uri: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<NodeId, DomError> {
        self.expect_element(element)?;
        let qname = namespaced_qname(ns_uri, qualified_name)?;
        if let Some(existing) = self.attribute_node(element, qname.ns_uri.as_deref(), &qname.local) {
            let data = self.data_mut(existing);
            data.value = value.to_string();
            data.name = Some(qname);
            return Ok(existing);
        }
        let mut data = NodeData::new(NodeKind::Attribute, Some(qname), value.to_string());
        data.parent = Some(element);
        let id = self.push(data);
        self.data_mut(element).attributes.push(id);
        Ok(id)
    }

    /// Declares `prefix` (or the default namespace when `None`) on `element`.
    pub fn declare_namespace(
        &mut self,
        element: NodeId,
        prefix: Option<&str>,
        uri: &str,
    ) -> Result<(), DomError> {
        self.expect_element(element)?;
        if let Some(prefix) = prefix
            && !crate::name::is_ncname(prefix)
        {
            return Err(DomError::InvalidName(prefix.to_string()));
        }
        let declarations = &mut self.data_mut(element).namespaces;
        match declarations.iter_mut().find(|decl| decl.prefix.as_deref() == prefix) {
            Some(decl) => decl.uri = uri.to_string(),
            None => declarations
                .push(NamespaceDecl { prefix: prefix.map(str::to_string), uri: uri.to_string() }),
        }
        Ok(())
    }

    /// Resolves `prefix` (`None` = default namespace) in the scope of `node`.
    pub fn lookup_namespace_uri(&self, node: NodeId, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(XML_NS),
            Some("xmlns") => return Some(XMLNS_NS),
            _ => {}
        }
        let mut current = match self.kind(node) {
            NodeKind::Element => Some(node),
            _ => self.parent(node),
        };
        while let Some(id) = current {
            let data = self.data(id);
            if data.kind != NodeKind::Element {
                return None;
            }
            if let Some(name) = &data.name
                && name.prefix.as_deref() == prefix
                && let Some(uri) = &name.ns_uri
            {
                return Some(uri.as_str());
            }
            if let Some(decl) = data.namespaces.iter().find(|decl| decl.prefix.as_deref() == prefix) {
                return (!decl.uri.is_empty()).then_some(decl.uri.as_str());
            }
            current = data.parent;
        }
        None
    }

    fn expect_element(&self, node: NodeId) -> Result<(), DomError> {
        if self.kind(node) == NodeKind::Element {
            Ok(())
        } else {
            Err(DomError::NotAnElement(node))
        }
    }

    // ---- accessors -------------------------------------------------------

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.data(node).kind
    }

    pub fn name(&self, node: NodeId) -> Option<&QName> {
        self.data(node).name.as_ref()
    }

    /// Qualified name for elements, attributes and processing instructions,
    /// DOM-style pseudo names (`#text`, `#document`, ...) for the rest.
    pub fn node_name(&self, node: NodeId) -> String {
        let data = self.data(node);
        match (&data.name, data.kind) {
            (Some(name), _) => name.qualified(),
            (None, NodeKind::Document) => "#document".to_string(),
            (None, NodeKind::DocumentFragment) => "#document-fragment".to_string(),
            (None, NodeKind::Text) => "#text".to_string(),
            (None, NodeKind::Comment) => "#comment".to_string(),
            (None, _) => String::new(),
        }
    }

    pub fn local_name(&self, node: NodeId) -> Option<&str> {
        self.name(node).map(|name| name.local.as_str())
    }

    pub fn namespace_uri(&self, node: NodeId) -> Option<&str> {
        self.name(node).and_then(|name| name.ns_uri.as_deref())
    }

    /// Raw value of text, comment, processing-instruction and attribute nodes.
    pub fn value(&self, node: NodeId) -> &str {
        &self.data(node).value
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    pub fn attributes(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).attributes
    }

    pub fn namespaces(&self, node: NodeId) -> &[NamespaceDecl] {
        &self.data(node).namespaces
    }

    pub fn attribute_node(&self, element: NodeId, ns_uri: Option<&str>, local: &str) -> Option<NodeId> {
        self.attributes(element).iter().copied().find(|&attr| {
            self.name(attr).is_some_and(|name| name.same_expanded(ns_uri, local))
        })
    }

    pub fn attribute_value(&self, element: NodeId, ns_uri: Option<&str>, local: &str) -> Option<&str> {
        self.attribute_node(element, ns_uri, local).map(|attr| self.value(attr))
    }

    /// XPath string value: concatenated descendant text for containers.
    pub fn string_value(&self, node: NodeId) -> String {
        let data = self.data(node);
        if !data.kind.is_container() {
            return data.value.clone();
        }
        let mut out = String::new();
        let mut stack: Vec<NodeId> = data.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            let child = self.data(next);
            if child.kind == NodeKind::Text {
                out.push_str(&child.value);
            }
            stack.extend(child.children.iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is a proper ancestor of `node` (attributes count their
    /// owner element as parent).
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            out.push(id);
            current = self.parent(id);
        }
        out
    }

    /// Descendants of `node` in document order, excluding attributes.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Siblings before `node`, in document order. Empty for attributes.
    pub fn preceding_siblings(&self, node: NodeId) -> &[NodeId] {
        self.sibling_split(node).map_or(&[], |(siblings, at)| &siblings[..at])
    }

    /// Siblings after `node`, in document order. Empty for attributes.
    pub fn following_siblings(&self, node: NodeId) -> &[NodeId] {
        self.sibling_split(node).map_or(&[], |(siblings, at)| &siblings[at + 1..])
    }

    fn sibling_split(&self, node: NodeId) -> Option<(&[NodeId], usize)> {
        let siblings = self.children(self.parent(node)?);
        let at = siblings.iter().position(|&s| s == node)?;
        Some((siblings, at))
    }
}

fn namespaced_qname(ns_uri: Option<&str>, qualified_name: &str) -> Result<QName, DomError> {
    let ns_uri = ns_uri.filter(|uri| !uri.is_empty());
    let (prefix, local) = split_qname(qualified_name)?;
    if let (Some(prefix), None) = (prefix, ns_uri) {
        return Err(DomError::UnboundPrefix(prefix.to_string()));
    }
    Ok(QName {
        prefix: prefix.map(str::to_string),
        local: local.to_string(),
        ns_uri: ns_uri.map(str::to_string),
    })
}
