//! Document order.
//!
//! Every node gets a preorder rank: a node comes before its attributes, which
//! come before its children. The tree under the document node ranks first,
//! detached subtrees (fragments, nodes not yet appended) follow in creation
//! order. Ranks are computed in one walk and cached by the document until the
//! next mutation.

use std::cmp::Ordering;

use crate::{Document, NodeId};

pub(crate) fn compute_ranks(doc: &Document) -> Vec<usize> {
    let mut ranks = vec![usize::MAX; doc.node_count()];
    let mut next = 0usize;
    let mut assign = |start: NodeId, ranks: &mut Vec<usize>| {
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            ranks[node.0] = next;
            next += 1;
            for &attr in doc.attributes(node) {
                ranks[attr.0] = next;
                next += 1;
            }
            stack.extend(doc.children(node).iter().rev().copied());
        }
    };
    assign(doc.root(), &mut ranks);
    for index in 1..doc.node_count() {
        let node = NodeId(index);
        if ranks[index] == usize::MAX && doc.parent(node).is_none() {
            assign(node, &mut ranks);
        }
    }
    tracing::trace!(nodes = ranks.len(), "document order ranks computed");
    ranks
}

impl Document {
    /// Position of `node` in document order.
    pub fn order_rank(&self, node: NodeId) -> usize {
        self.ranks()[node.0]
    }

    pub fn compare_document_order(&self, a: NodeId, b: NodeId) -> Ordering {
        let ranks = self.ranks();
        ranks[a.0].cmp(&ranks[b.0])
    }

    /// Removes duplicates from `nodes` and sorts the rest into document order.
    pub fn document_order<I>(&self, nodes: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let ranks = self.ranks();
        let mut out: Vec<NodeId> = nodes.into_iter().collect();
        out.sort_unstable_by_key(|node| ranks[node.0]);
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn attributes_rank_between_owner_and_children() {
        let mut doc = Document::new();
        let root = doc.create_element("r").unwrap();
        doc.append_child(doc.root(), root).unwrap();
        let child = doc.append_element(root, "c", "").unwrap();
        let attr = doc.set_attribute_ns(root, None, "a", "1").unwrap();

        assert_eq!(doc.document_order([child, attr, root]), vec![root, attr, child]);
    }

    #[test]
    fn order_follows_tree_not_creation() {
        let mut doc = Document::new();
        let root = doc.create_element("r").unwrap();
        let late = doc.create_element("late").unwrap();
        let early = doc.create_element("early").unwrap();
        doc.append_child(doc.root(), root).unwrap();
        doc.append_child(root, early).unwrap();
        doc.append_child(root, late).unwrap();

        assert!(doc.compare_document_order(early, late).is_lt());
        assert_eq!(doc.document_order([late, early, late, early]), vec![early, late]);
    }

    #[test]
    fn detached_nodes_follow_the_document_tree() {
        let mut doc = Document::new();
        let detached = doc.create_element("loose").unwrap();
        let root = doc.create_element("r").unwrap();
        doc.append_child(doc.root(), root).unwrap();

        assert_eq!(doc.document_order([detached, root]), vec![root, detached]);
    }

    #[test]
    fn ranks_refresh_after_mutation() {
        let mut doc = Document::new();
        let root = doc.create_element("r").unwrap();
        doc.append_child(doc.root(), root).unwrap();
        let a = doc.append_element(root, "a", "").unwrap();
        let b = doc.append_element(root, "b", "").unwrap();
        assert!(doc.compare_document_order(a, b).is_lt());

        doc.append_child(root, a).unwrap();
        assert!(doc.compare_document_order(a, b).is_gt());
    }
}
