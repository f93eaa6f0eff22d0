use crate::{Document, NodeId};

/// A document-fragment node together with the document that owns it.
#[derive(Debug, Clone)]
pub struct Fragment {
    document: Document,
    root: NodeId,
}

impl Fragment {
    /// Wraps an existing fragment node of `document`.
    pub fn new(document: Document, root: NodeId) -> Self {
        debug_assert_eq!(document.kind(root), crate::NodeKind::DocumentFragment);
        Self { document, root }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The fragment node itself.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Top-level nodes of the fragment.
    pub fn children(&self) -> &[NodeId] {
        self.document.children(self.root)
    }

    pub fn into_parts(self) -> (Document, NodeId) {
        (self.document, self.root)
    }

    /// Copies the fragment's content into `target` and appends it to `parent`.
    pub fn append_to(
        &self,
        target: &mut Document,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, crate::DomError> {
        let mut appended = Vec::with_capacity(self.children().len());
        for &child in self.children() {
            let copy = target.import_node(&self.document, child)?;
            target.append_child(parent, copy)?;
            appended.push(copy);
        }
        Ok(appended)
    }
}
