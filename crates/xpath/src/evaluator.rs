use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use fluentree_dom::{Document, NodeId, NodeKind};
use lru::LruCache;
use smallvec::SmallVec;

use crate::ast::{ArithmeticOp, Axis, CompareOp, Expr, KindTest, Literal, LocationPath, NodeTest, Step};
use crate::context::StaticContext;
use crate::error::Error;
use crate::functions;
use crate::parser::XPathParser;
use crate::value::Value;

const CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(127);

/// Compiles and evaluates path expressions against a [`Document`].
///
/// Compiled trees are kept in a small LRU cache keyed by the expression text,
/// so repeated fetches with the same selector parse once.
pub struct Evaluator {
    static_ctx: StaticContext,
    cache: Mutex<LruCache<String, Arc<Expr>>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(StaticContext::default())
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator").field("static_ctx", &self.static_ctx).finish_non_exhaustive()
    }
}

impl Evaluator {
    pub fn new(static_ctx: StaticContext) -> Self {
        Self { static_ctx, cache: Mutex::new(LruCache::new(CACHE_CAPACITY)) }
    }

    pub fn static_context(&self) -> &StaticContext {
        &self.static_ctx
    }

    pub fn compile(&self, expr: &str) -> Result<Arc<Expr>, Error> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(expr) {
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(XPathParser::parse_to_ast(expr, &self.static_ctx)?);
        tracing::debug!(expr, "compiled path expression");
        cache.put(expr.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Evaluates `expr` with `context` as context node; `None` means the
    /// document node.
    pub fn evaluate(&self, doc: &Document, expr: &str, context: Option<NodeId>) -> Result<Value, Error> {
        let compiled = self.compile(expr)?;
        let focus = Focus { doc, node: context.unwrap_or_else(|| doc.root()), position: 1, size: 1 };
        focus.eval(&compiled)
    }
}

/// Evaluates `expr` with an empty static context.
pub fn evaluate(doc: &Document, expr: &str, context: Option<NodeId>) -> Result<Value, Error> {
    Evaluator::default().evaluate(doc, expr, context)
}

/// Dynamic focus: context node plus its position within the current node list.
pub(crate) struct Focus<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) node: NodeId,
    pub(crate) position: usize,
    pub(crate) size: usize,
}

impl<'a> Focus<'a> {
    fn with_node(&self, node: NodeId, position: usize, size: usize) -> Focus<'a> {
        Focus { doc: self.doc, node, position, size }
    }

    fn eval(&self, expr: &Expr) -> Result<Value, Error> {
        match expr {
            Expr::Literal(Literal::String(s)) => Ok(Value::String(s.clone())),
            Expr::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
            Expr::Or(left, right) => {
                Ok(Value::Boolean(self.eval(left)?.to_boolean() || self.eval(right)?.to_boolean()))
            }
            Expr::And(left, right) => {
                Ok(Value::Boolean(self.eval(left)?.to_boolean() && self.eval(right)?.to_boolean()))
            }
            Expr::Compare { left, op, right } => {
                Ok(Value::Boolean(self.compare(&self.eval(left)?, *op, &self.eval(right)?)))
            }
            Expr::Arithmetic { left, op, right } => {
                let l = self.eval(left)?.to_number(self.doc);
                let r = self.eval(right)?.to_number(self.doc);
                Ok(Value::Number(match op {
                    ArithmeticOp::Add => l + r,
                    ArithmeticOp::Sub => l - r,
                    ArithmeticOp::Mul => l * r,
                    ArithmeticOp::Div => l / r,
                    ArithmeticOp::Mod => l % r,
                }))
            }
            Expr::Negate(inner) => Ok(Value::Number(-self.eval(inner)?.to_number(self.doc))),
            Expr::Union(left, right) => {
                let mut nodes = self.eval(left)?.into_nodes()?;
                nodes.extend(self.eval(right)?.into_nodes()?);
                Ok(Value::Nodes(self.doc.document_order(nodes)))
            }
            Expr::Filter { primary, predicates } => {
                let nodes = self.eval(primary)?.into_nodes()?;
                let mut kept = nodes;
                for predicate in predicates {
                    kept = self.apply_predicate(kept, predicate)?;
                }
                Ok(Value::Nodes(kept))
            }
            Expr::FilterPath { filter, steps } => {
                let start = self.eval(filter)?.into_nodes()?;
                Ok(Value::Nodes(self.apply_steps(start, steps)?))
            }
            Expr::Path(LocationPath { absolute, steps }) => {
                let start = if *absolute { self.tree_root(self.node) } else { self.node };
                Ok(Value::Nodes(self.apply_steps(vec![start], steps)?))
            }
            Expr::FunctionCall { function, args } => {
                let args = args.iter().map(|arg| self.eval(arg)).collect::<Result<Vec<_>, _>>()?;
                functions::call(*function, args, self)
            }
        }
    }

    fn apply_steps(&self, mut current: Vec<NodeId>, steps: &[Step]) -> Result<Vec<NodeId>, Error> {
        for step in steps {
            let mut next = Vec::new();
            for &node in &current {
                let mut selected: Vec<NodeId> =
                    self.axis(node, step.axis).into_iter().filter(|&n| self.matches(n, step)).collect();
                // Candidates arrive in proximity order, so predicate positions count
                // backwards from the context node on reverse axes.
                for predicate in &step.predicates {
                    selected = self.apply_predicate(selected, predicate)?;
                }
                next.extend(selected);
            }
            current = self.doc.document_order(next);
        }
        Ok(current)
    }

    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn apply_predicate(&self, nodes: Vec<NodeId>, predicate: &Expr) -> Result<Vec<NodeId>, Error> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (index, node) in nodes.into_iter().enumerate() {
            let focus = self.with_node(node, index + 1, size);
            let keep = match focus.eval(predicate)? {
                Value::Number(n) => n == (index + 1) as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Top of the tree `node` lives in: the document node, or the root of a
    /// detached subtree.
    fn tree_root(&self, node: NodeId) -> NodeId {
        self.doc.ancestors(node).last().copied().unwrap_or(node)
    }

    /// Axis members of `node` in proximity order.
    fn axis(&self, node: NodeId, axis: Axis) -> SmallVec<[NodeId; 8]> {
        let doc = self.doc;
        match axis {
            Axis::Child => doc.children(node).iter().copied().collect(),
            Axis::Attribute => doc.attributes(node).iter().copied().collect(),
            Axis::SelfAxis => smallvec::smallvec![node],
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Descendant => doc.descendants(node).into_iter().collect(),
            Axis::DescendantOrSelf => std::iter::once(node).chain(doc.descendants(node)).collect(),
            Axis::Ancestor => doc.ancestors(node).into_iter().collect(),
            Axis::AncestorOrSelf => std::iter::once(node).chain(doc.ancestors(node)).collect(),
            Axis::FollowingSibling => doc.following_siblings(node).iter().copied().collect(),
            Axis::PrecedingSibling => doc.preceding_siblings(node).iter().rev().copied().collect(),
            Axis::Following => {
                let rank = doc.order_rank(node);
                self.tree_members(node)
                    .into_iter()
                    .filter(|&n| doc.order_rank(n) > rank && !doc.is_ancestor(node, n))
                    .collect()
            }
            Axis::Preceding => {
                let rank = doc.order_rank(node);
                let mut out: SmallVec<[NodeId; 8]> = self
                    .tree_members(node)
                    .into_iter()
                    .filter(|&n| doc.order_rank(n) < rank && !doc.is_ancestor(n, node))
                    .collect();
                out.reverse();
                out
            }
        }
    }

    /// Non-attribute nodes of the tree containing `node`, in document order.
    fn tree_members(&self, node: NodeId) -> Vec<NodeId> {
        let root = self.tree_root(node);
        let mut members = self.doc.descendants(root);
        members.insert(0, root);
        members
    }

    fn matches(&self, node: NodeId, step: &Step) -> bool {
        let doc = self.doc;
        let kind = doc.kind(node);
        let principal = if step.axis == Axis::Attribute { NodeKind::Attribute } else { NodeKind::Element };
        match &step.test {
            NodeTest::Kind(KindTest::Node) => true,
            NodeTest::Kind(KindTest::Text) => kind == NodeKind::Text,
            NodeTest::Kind(KindTest::Comment) => kind == NodeKind::Comment,
            NodeTest::Kind(KindTest::ProcessingInstruction(target)) => {
                kind == NodeKind::ProcessingInstruction
                    && target.as_deref().is_none_or(|t| doc.local_name(node) == Some(t))
            }
            NodeTest::Any => kind == principal,
            NodeTest::Namespace(uri) => kind == principal && doc.namespace_uri(node) == Some(uri.as_str()),
            NodeTest::Name { ns_uri, local } => {
                kind == principal && doc.name(node).is_some_and(|name| name.same_expanded(ns_uri.as_deref(), local))
            }
        }
    }

    fn compare(&self, left: &Value, op: CompareOp, right: &Value) -> bool {
        let doc = self.doc;
        match (left, right) {
            (Value::Nodes(l), Value::Nodes(r)) => {
                let rs: Vec<String> = r.iter().map(|&n| doc.string_value(n)).collect();
                l.iter().any(|&a| {
                    let a = doc.string_value(a);
                    rs.iter().any(|b| compare_strings(&a, op, b))
                })
            }
            (Value::Nodes(nodes), other) => self.compare_node_set(nodes, op, other, false),
            (other, Value::Nodes(nodes)) => self.compare_node_set(nodes, op, other, true),
            _ => compare_atomic(doc, left, op, right),
        }
    }

    /// Existential comparison of a node set with a non-node value.
    fn compare_node_set(&self, nodes: &[NodeId], op: CompareOp, other: &Value, swapped: bool) -> bool {
        let doc = self.doc;
        if let Value::Boolean(b) = other {
            let set = Value::Boolean(!nodes.is_empty());
            let other = Value::Boolean(*b);
            return if swapped {
                compare_atomic(doc, &other, op, &set)
            } else {
                compare_atomic(doc, &set, op, &other)
            };
        }
        nodes.iter().any(|&n| {
            let item = match other {
                Value::Number(_) => Value::Number(crate::value::string_to_number(&doc.string_value(n))),
                _ => Value::String(doc.string_value(n)),
            };
            if swapped { compare_atomic(doc, other, op, &item) } else { compare_atomic(doc, &item, op, other) }
        })
    }
}

fn compare_strings(a: &str, op: CompareOp, b: &str) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        _ => compare_numbers(crate::value::string_to_number(a), op, crate::value::string_to_number(b)),
    }
}

fn compare_atomic(doc: &Document, left: &Value, op: CompareOp, right: &Value) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let equal = match (left, right) {
                (Value::Boolean(_), _) | (_, Value::Boolean(_)) => left.to_boolean() == right.to_boolean(),
                (Value::Number(_), _) | (_, Value::Number(_)) => {
                    #[allow(clippy::float_cmp)]
                    let same = left.to_number(doc) == right.to_number(doc);
                    same
                }
                _ => left.to_string_value(doc) == right.to_string_value(doc),
            };
            if op == CompareOp::Eq { equal } else { !equal }
        }
        _ => compare_numbers(left.to_number(doc), op, right.to_number(doc)),
    }
}

#[allow(clippy::float_cmp)]
fn compare_numbers(a: f64, op: CompareOp, b: f64) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
    }
}
