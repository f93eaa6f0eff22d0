//! The node fetch engine.
//!
//! A fetch evaluates one path expression per context node (or once, without a
//! context, under [`FetchOptions::IGNORE_CONTEXT`]), shapes every per-context
//! list with `REVERSE` and the `filter` / `stop_at` predicates, concatenates
//! the lists in context order and, under [`FetchOptions::UNIQUE`], collapses
//! the result into document order.

use crate::model::{EvaluateError, Evaluation, TreeModel};
use crate::options::FetchOptions;

/// Caller-supplied predicate over a node and its position in the
/// (post-reverse) per-context list.
pub type Predicate<'p, N> = &'p dyn Fn(&N, usize) -> bool;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("path expression must not be empty")]
    InvalidExpression,
    #[error("cannot fetch nodes for `{expression}`")]
    Evaluation {
        expression: String,
        #[source]
        source: EvaluateError,
    },
}

impl FetchError {
    pub(crate) fn evaluation(expression: &str, source: EvaluateError) -> Self {
        FetchError::Evaluation { expression: expression.to_string(), source }
    }
}

/// Runs fetches for one context set against one tree model.
///
/// Holds no state between calls; the context slice is only borrowed.
pub struct Fetcher<'a, M: TreeModel> {
    model: &'a M,
    context: &'a [M::Node],
}

impl<'a, M: TreeModel> Fetcher<'a, M> {
    pub fn new(model: &'a M, context: &'a [M::Node]) -> Self {
        Self { model, context }
    }

    pub fn fetch(
        &self,
        expression: &str,
        filter: Option<Predicate<'_, M::Node>>,
        stop_at: Option<Predicate<'_, M::Node>>,
        options: FetchOptions,
    ) -> Result<Vec<M::Node>, FetchError> {
        if expression.trim().is_empty() {
            return Err(FetchError::InvalidExpression);
        }
        let mut evaluations = 0usize;
        let mut combined = Vec::new();
        if options.contains(FetchOptions::IGNORE_CONTEXT) {
            evaluations += 1;
            let list = self.evaluate(expression, None)?;
            combined.extend(shape(list, filter, stop_at, options));
        } else {
            for node in self.context {
                evaluations += 1;
                let list = self.evaluate(expression, Some(node))?;
                combined.extend(shape(list, filter, stop_at, options));
            }
        }
        if options.contains(FetchOptions::UNIQUE) {
            combined = self.model.document_order(combined);
        }
        tracing::trace!(
            expression,
            options = options.bits(),
            evaluations,
            results = combined.len(),
            "fetch"
        );
        Ok(combined)
    }

    fn evaluate(&self, expression: &str, context: Option<&M::Node>) -> Result<Vec<M::Node>, FetchError> {
        match self.model.evaluate(expression, context) {
            Ok(Evaluation::Nodes(nodes)) => Ok(nodes),
            Ok(other) => Err(FetchError::evaluation(expression, EvaluateError::NotNodes { found: other.type_name() })),
            Err(err) => Err(FetchError::evaluation(expression, err)),
        }
    }
}

/// Applies `REVERSE`, then the positional `stop_at` / `filter` scan, to one
/// per-context list.
fn shape<N>(
    mut list: Vec<N>,
    filter: Option<Predicate<'_, N>>,
    stop_at: Option<Predicate<'_, N>>,
    options: FetchOptions,
) -> Vec<N> {
    if options.contains(FetchOptions::REVERSE) {
        list.reverse();
    }
    if filter.is_none() && stop_at.is_none() {
        return list;
    }
    let accepts = |node: &N, index: usize| filter.is_none_or(|f| f(node, index));
    let mut out = Vec::with_capacity(list.len());
    for (index, node) in list.into_iter().enumerate() {
        if stop_at.is_some_and(|stop| stop(&node, index)) {
            if options.contains(FetchOptions::INCLUDE_STOP) && accepts(&node, index) {
                out.push(node);
            }
            break;
        }
        if accepts(&node, index) {
            out.push(node);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn letters() -> Vec<char> {
        vec!['a', 'b', 'c', 'd']
    }

    #[test]
    fn untouched_without_predicates() {
        assert_eq!(shape(letters(), None, None, FetchOptions::empty()), letters());
    }

    #[rstest]
    #[case(FetchOptions::empty(), vec!['a', 'b'])]
    #[case(FetchOptions::INCLUDE_STOP, vec!['a', 'b', 'c'])]
    fn stop_at_truncates(#[case] options: FetchOptions, #[case] expected: Vec<char>) {
        let stop = |n: &char, _: usize| *n == 'c';
        assert_eq!(shape(letters(), None, Some(&stop), options), expected);
    }

    #[test]
    fn filter_also_judges_the_stop_node() {
        let filter = |n: &char, _: usize| *n != 'b' && *n != 'c';
        let stop = |n: &char, _: usize| *n == 'c';
        let out = shape(letters(), Some(&filter), Some(&stop), FetchOptions::INCLUDE_STOP);
        assert_eq!(out, vec!['a']);
    }

    #[test]
    fn predicates_see_reversed_positions() {
        let first_two = |_: &char, index: usize| index < 2;
        assert_eq!(shape(letters(), Some(&first_two), None, FetchOptions::REVERSE), vec!['d', 'c']);
    }

    #[rstest]
    #[case(FetchOptions::empty(), Vec::new())]
    #[case(FetchOptions::INCLUDE_STOP, vec!['a'])]
    fn stop_on_first_node(#[case] options: FetchOptions, #[case] expected: Vec<char>) {
        let stop = |_: &char, index: usize| index == 0;
        assert_eq!(shape(letters(), None, Some(&stop), options), expected);
    }
}
