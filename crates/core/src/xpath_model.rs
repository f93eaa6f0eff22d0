use fluentree_dom::{Document, NodeId};
use fluentree_xpath::{Evaluator, StaticContext, Value};

use crate::model::{EvaluateError, Evaluation, TreeModel};

/// [`TreeModel`] over a borrowed [`Document`], evaluating expressions with
/// the path evaluator from `fluentree-xpath`.
#[derive(Debug)]
pub struct XPathModel<'doc> {
    document: &'doc Document,
    evaluator: Evaluator,
}

impl<'doc> XPathModel<'doc> {
    pub fn new(document: &'doc Document) -> Self {
        Self::with_context(document, StaticContext::default())
    }

    pub fn with_context(document: &'doc Document, static_ctx: StaticContext) -> Self {
        Self { document, evaluator: Evaluator::new(static_ctx) }
    }

    pub fn document(&self) -> &'doc Document {
        self.document
    }
}

impl TreeModel for XPathModel<'_> {
    type Node = NodeId;

    fn evaluate(&self, expression: &str, context: Option<&NodeId>) -> Result<Evaluation<NodeId>, EvaluateError> {
        let value = self.evaluator.evaluate(self.document, expression, context.copied())?;
        tracing::trace!(expression, context = ?context, kind = value.type_name(), "evaluated");
        Ok(match value {
            Value::Nodes(nodes) => Evaluation::Nodes(nodes),
            Value::Boolean(b) => Evaluation::Boolean(b),
            Value::Number(n) => Evaluation::Number(n),
            Value::String(s) => Evaluation::String(s),
        })
    }

    fn document_order(&self, nodes: Vec<NodeId>) -> Vec<NodeId> {
        self.document.document_order(nodes)
    }
}
