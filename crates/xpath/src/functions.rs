//! Core function library.

use fluentree_dom::NodeId;

use crate::error::{Error, ErrorCode};
use crate::evaluator::Focus;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Last,
    Position,
    Count,
    Name,
    LocalName,
    NamespaceUri,
    String,
    Concat,
    Contains,
    StartsWith,
    SubstringBefore,
    SubstringAfter,
    StringLength,
    NormalizeSpace,
    Not,
    True,
    False,
    Boolean,
    Number,
    Sum,
}

const LIBRARY: &[(&str, Function, usize, Option<usize>)] = &[
    ("last", Function::Last, 0, Some(0)),
    ("position", Function::Position, 0, Some(0)),
    ("count", Function::Count, 1, Some(1)),
    ("name", Function::Name, 0, Some(1)),
    ("local-name", Function::LocalName, 0, Some(1)),
    ("namespace-uri", Function::NamespaceUri, 0, Some(1)),
    ("string", Function::String, 0, Some(1)),
    ("concat", Function::Concat, 2, None),
    ("contains", Function::Contains, 2, Some(2)),
    ("starts-with", Function::StartsWith, 2, Some(2)),
    ("substring-before", Function::SubstringBefore, 2, Some(2)),
    ("substring-after", Function::SubstringAfter, 2, Some(2)),
    ("string-length", Function::StringLength, 0, Some(1)),
    ("normalize-space", Function::NormalizeSpace, 0, Some(1)),
    ("not", Function::Not, 1, Some(1)),
    ("true", Function::True, 0, Some(0)),
    ("false", Function::False, 0, Some(0)),
    ("boolean", Function::Boolean, 1, Some(1)),
    ("number", Function::Number, 0, Some(1)),
    ("sum", Function::Sum, 1, Some(1)),
];

impl Function {
    pub fn name(self) -> &'static str {
        LIBRARY.iter().find(|(_, f, _, _)| *f == self).map_or("", |(name, _, _, _)| name)
    }

    /// Looks up `name` (optionally `fn:`-prefixed) and checks the argument count.
    pub(crate) fn resolve(name: &str, argc: usize) -> Result<Self, Error> {
        let local = name.strip_prefix("fn:").unwrap_or(name);
        let Some(&(_, function, min, max)) = LIBRARY.iter().find(|(n, _, _, _)| *n == local) else {
            return Err(Error::from_code(ErrorCode::XPST0017, format!("unknown function {name}()")));
        };
        if argc < min || max.is_some_and(|max| argc > max) {
            return Err(Error::from_code(
                ErrorCode::XPST0017,
                format!("{local}() does not accept {argc} argument(s)"),
            ));
        }
        Ok(function)
    }
}

pub(crate) fn call(function: Function, args: Vec<Value>, focus: &Focus<'_>) -> Result<Value, Error> {
    let doc = focus.doc;
    let mut args = args.into_iter();
    let next_string = |args: &mut std::vec::IntoIter<Value>| {
        args.next().map_or_else(|| doc.string_value(focus.node), |v| v.to_string_value(doc))
    };
    Ok(match function {
        Function::Last => Value::Number(focus.size as f64),
        Function::Position => Value::Number(focus.position as f64),
        Function::Count => Value::Number(nodes_arg(args.next())?.len() as f64),
        Function::Name => {
            let node = first_node_arg(args.next(), focus)?;
            Value::String(node.and_then(|n| doc.name(n)).map(|q| q.qualified()).unwrap_or_default())
        }
        Function::LocalName => {
            let node = first_node_arg(args.next(), focus)?;
            Value::String(node.and_then(|n| doc.local_name(n)).unwrap_or_default().to_string())
        }
        Function::NamespaceUri => {
            let node = first_node_arg(args.next(), focus)?;
            Value::String(node.and_then(|n| doc.namespace_uri(n)).unwrap_or_default().to_string())
        }
        Function::String => Value::String(next_string(&mut args)),
        Function::Concat => Value::String(args.map(|v| v.to_string_value(doc)).collect()),
        Function::Contains => {
            let (haystack, needle) = (next_string(&mut args), next_string(&mut args));
            Value::Boolean(haystack.contains(&needle))
        }
        Function::StartsWith => {
            let (haystack, needle) = (next_string(&mut args), next_string(&mut args));
            Value::Boolean(haystack.starts_with(&needle))
        }
        Function::SubstringBefore => {
            let (haystack, needle) = (next_string(&mut args), next_string(&mut args));
            Value::String(haystack.split_once(&needle).map(|(before, _)| before.to_string()).unwrap_or_default())
        }
        Function::SubstringAfter => {
            let (haystack, needle) = (next_string(&mut args), next_string(&mut args));
            Value::String(haystack.split_once(&needle).map(|(_, after)| after.to_string()).unwrap_or_default())
        }
        Function::StringLength => Value::Number(next_string(&mut args).chars().count() as f64),
        Function::NormalizeSpace => {
            Value::String(next_string(&mut args).split_whitespace().collect::<Vec<_>>().join(" "))
        }
        Function::Not => Value::Boolean(!args.next().is_some_and(|v| v.to_boolean())),
        Function::True => Value::Boolean(true),
        Function::False => Value::Boolean(false),
        Function::Boolean => Value::Boolean(args.next().is_some_and(|v| v.to_boolean())),
        Function::Number => Value::Number(match args.next() {
            Some(v) => v.to_number(doc),
            None => crate::value::string_to_number(&doc.string_value(focus.node)),
        }),
        Function::Sum => Value::Number(
            nodes_arg(args.next())?
                .iter()
                .map(|&n| crate::value::string_to_number(&doc.string_value(n)))
                .sum(),
        ),
    })
}

fn nodes_arg(arg: Option<Value>) -> Result<Vec<NodeId>, Error> {
    arg.map_or_else(|| Ok(Vec::new()), Value::into_nodes)
}

/// First node of a node-set argument, or the context node when omitted.
fn first_node_arg(arg: Option<Value>, focus: &Focus<'_>) -> Result<Option<NodeId>, Error> {
    match arg {
        None => Ok(Some(focus.node)),
        Some(value) => Ok(value.into_nodes()?.first().copied()),
    }
}
