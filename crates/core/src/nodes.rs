use std::cell::RefCell;
use std::collections::HashSet;

use crate::fetch::{FetchError, Fetcher, Predicate};
use crate::model::{Evaluation, TreeModel};
use crate::options::FetchOptions;

/// Immutable, chainable node list over a [`TreeModel`].
///
/// Every traversal returns a new `Nodes`; the receiver keeps its context set.
/// A context set never holds the same node twice.
///
/// ```
/// use fluentree_core::{Nodes, XPathModel};
/// use fluentree_dom::Document;
///
/// let mut doc = Document::new();
/// let list = doc.create_element("list").unwrap();
/// doc.append_child(doc.root(), list).unwrap();
/// let first = doc.append_element(list, "item", "one").unwrap();
/// let second = doc.append_element(list, "item", "two").unwrap();
///
/// let model = XPathModel::new(&doc);
/// let items = Nodes::new(&model).find("//item").unwrap();
/// assert_eq!(items.to_vec(), vec![first, second]);
/// assert_eq!(items.parent().unwrap().to_vec(), vec![list]);
/// ```
pub struct Nodes<'m, M: TreeModel> {
    model: &'m M,
    nodes: Vec<M::Node>,
    use_document_context: bool,
}

impl<M: TreeModel> Clone for Nodes<'_, M> {
    fn clone(&self) -> Self {
        Self { model: self.model, nodes: self.nodes.clone(), use_document_context: self.use_document_context }
    }
}

impl<M: TreeModel> std::fmt::Debug for Nodes<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.nodes).finish()
    }
}

impl<'m, M: TreeModel> Nodes<'m, M> {
    /// Document context: [`find`](Self::find) and [`evaluate`](Self::evaluate)
    /// run once, against the document.
    pub fn new(model: &'m M) -> Self {
        Self { model, nodes: Vec::new(), use_document_context: true }
    }

    /// Explicit context set; an empty one selects nothing.
    pub fn with_context(model: &'m M, nodes: impl IntoIterator<Item = M::Node>) -> Self {
        Self { model, nodes: distinct(nodes), use_document_context: false }
    }

    pub fn model(&self) -> &'m M {
        self.model
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M::Node> {
        self.nodes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&M::Node> {
        self.nodes.get(index)
    }

    pub fn first(&self) -> Option<&M::Node> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&M::Node> {
        self.nodes.last()
    }

    pub fn to_vec(&self) -> Vec<M::Node> {
        self.nodes.clone()
    }

    /// Derived sets always keep their own context, even when empty.
    fn wrap(&self, nodes: Vec<M::Node>) -> Self {
        Self { model: self.model, nodes: distinct(nodes), use_document_context: false }
    }

    /// Raw access to the fetch engine with this list as context set.
    pub fn fetch(
        &self,
        expression: &str,
        filter: Option<Predicate<'_, M::Node>>,
        stop_at: Option<Predicate<'_, M::Node>>,
        options: FetchOptions,
    ) -> Result<Self, FetchError> {
        let nodes = Fetcher::new(self.model, &self.nodes).fetch(expression, filter, stop_at, options)?;
        Ok(self.wrap(nodes))
    }

    /// Nodes selected by `expression` from every context node, in document order.
    /// With an empty context the expression is evaluated once against the document.
    pub fn find(&self, expression: &str) -> Result<Self, FetchError> {
        self.fetch(expression, None, None, self.context_options() | FetchOptions::UNIQUE)
    }

    /// Like [`find`](Self::find) but in context order; repeated nodes keep their first position.
    pub fn evaluate(&self, expression: &str) -> Result<Self, FetchError> {
        self.fetch(expression, None, None, self.context_options())
    }

    /// Raw evaluation against the first context node (or the document).
    pub fn value(&self, expression: &str) -> Result<Evaluation<M::Node>, FetchError> {
        if expression.trim().is_empty() {
            return Err(FetchError::InvalidExpression);
        }
        self.model.evaluate(expression, self.first()).map_err(|err| FetchError::evaluation(expression, err))
    }

    /// Keeps the context nodes that match `expression`.
    pub fn filter(&self, expression: &str) -> Result<Self, FetchError> {
        let mut kept = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if self.matches(expression, node)? {
                kept.push(node.clone());
            }
        }
        Ok(self.wrap(kept))
    }

    /// Whether evaluating `expression` with `node` as context yields a
    /// non-empty node sequence or a true scalar.
    pub fn matches(&self, expression: &str, node: &M::Node) -> Result<bool, FetchError> {
        if expression.trim().is_empty() {
            return Err(FetchError::InvalidExpression);
        }
        self.model
            .evaluate(expression, Some(node))
            .map(|result| result.is_truthy())
            .map_err(|err| FetchError::evaluation(expression, err))
    }

    /// Union of this list and the nodes selected by `expression` against the document.
    pub fn add(&self, expression: &str) -> Result<Self, FetchError> {
        let added = Fetcher::new(self.model, &[]).fetch(expression, None, None, FetchOptions::IGNORE_CONTEXT)?;
        let mut combined = self.nodes.clone();
        combined.extend(added);
        Ok(self.wrap(self.model.document_order(combined)))
    }

    pub fn children(&self) -> Result<Self, FetchError> {
        self.fetch("*", None, None, FetchOptions::UNIQUE)
    }

    pub fn parent(&self) -> Result<Self, FetchError> {
        self.fetch("parent::*", None, None, FetchOptions::UNIQUE)
    }

    pub fn parents(&self) -> Result<Self, FetchError> {
        self.fetch("ancestor::*", None, None, FetchOptions::REVERSE | FetchOptions::UNIQUE)
    }

    /// Ancestors, nearest first per context node, up to (excluding) the first
    /// one matching `selector`; combined in document order.
    pub fn parents_until(&self, selector: &str) -> Result<Self, FetchError> {
        self.fetch_matching("ancestor::*", selector, false, FetchOptions::REVERSE | FetchOptions::UNIQUE)
    }

    /// Nearest ancestor-or-self of each context node that matches `selector`.
    pub fn closest(&self, selector: &str) -> Result<Self, FetchError> {
        self.fetch_matching(
            "ancestor-or-self::*",
            selector,
            true,
            FetchOptions::REVERSE | FetchOptions::INCLUDE_STOP,
        )
    }

    pub fn siblings(&self) -> Result<Self, FetchError> {
        self.fetch("preceding-sibling::* | following-sibling::*", None, None, FetchOptions::UNIQUE)
    }

    pub fn next(&self) -> Result<Self, FetchError> {
        self.fetch("following-sibling::*[1]", None, None, FetchOptions::UNIQUE)
    }

    pub fn next_all(&self) -> Result<Self, FetchError> {
        self.fetch("following-sibling::*", None, None, FetchOptions::UNIQUE)
    }

    pub fn next_until(&self, selector: &str) -> Result<Self, FetchError> {
        self.fetch_matching("following-sibling::*", selector, false, FetchOptions::UNIQUE)
    }

    pub fn prev(&self) -> Result<Self, FetchError> {
        self.fetch("preceding-sibling::*[1]", None, None, FetchOptions::UNIQUE)
    }

    pub fn prev_all(&self) -> Result<Self, FetchError> {
        self.fetch("preceding-sibling::*", None, None, FetchOptions::UNIQUE)
    }

    /// Preceding siblings, nearest first, up to (excluding) the first match.
    pub fn prev_until(&self, selector: &str) -> Result<Self, FetchError> {
        self.fetch_matching("preceding-sibling::*", selector, false, FetchOptions::REVERSE)
    }

    fn context_options(&self) -> FetchOptions {
        if self.use_document_context { FetchOptions::IGNORE_CONTEXT } else { FetchOptions::empty() }
    }

    /// Fetch with `selector` as `stop_at` (and as `filter` when `filter_too`).
    ///
    /// Predicates are infallible, so the first evaluation error is parked,
    /// stops the scan and is returned after the fetch.
    fn fetch_matching(
        &self,
        expression: &str,
        selector: &str,
        filter_too: bool,
        options: FetchOptions,
    ) -> Result<Self, FetchError> {
        let failure: RefCell<Option<FetchError>> = RefCell::new(None);
        let matcher = |node: &M::Node, _: usize| match self.matches(selector, node) {
            Ok(hit) => hit,
            Err(err) => {
                let mut slot = failure.borrow_mut();
                if slot.is_none() {
                    *slot = Some(err);
                }
                true
            }
        };
        let filter: Option<Predicate<'_, M::Node>> = if filter_too { Some(&matcher) } else { None };
        let result = self.fetch(expression, filter, Some(&matcher), options);
        match failure.into_inner() {
            Some(err) => Err(err),
            None => result,
        }
    }
}

/// Drops repeated nodes, keeping arrival order.
fn distinct<N: Clone + Eq + std::hash::Hash>(nodes: impl IntoIterator<Item = N>) -> Vec<N> {
    let mut seen = HashSet::new();
    nodes.into_iter().filter(|node| seen.insert(node.clone())).collect()
}

impl<'a, M: TreeModel> IntoIterator for &'a Nodes<'_, M> {
    type Item = &'a M::Node;
    type IntoIter = std::slice::Iter<'a, M::Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
