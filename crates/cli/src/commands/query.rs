use crate::OutputFormat;
use crate::util::parse_key_value;
use anyhow::{Context, anyhow};
use clap::Args;
use fluentree_core::{FetchOptions, Nodes, XPathModel};
use fluentree_dom::{Document, NodeId, NodeKind};
use fluentree_loader::{JSON_DOM_NS, LoadSource, LoaderOptions, LoaderRegistry};
use fluentree_xpath::StaticContextBuilder;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,
    #[arg(long = "type", short = 't', value_name = "CONTENT_TYPE")]
    pub content_type: String,
    #[arg(long = "query", short = 'q', value_name = "XPATH")]
    pub expression: String,
    /// Treat the first CSV record as column names.
    #[arg(long, conflicts_with = "no_header")]
    pub header: bool,
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// Map a column key (header text or index) to an element name.
    #[arg(long = "field", value_name = "KEY=NAME", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,
    #[arg(long)]
    pub unique: bool,
    #[arg(long)]
    pub reverse: bool,
    /// Load as fragment and use its top-level nodes as context.
    #[arg(long)]
    pub fragment: bool,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Bind a prefix for the query; `json` is bound to the CSV marker namespace by default.
    #[arg(long = "namespace", value_name = "PREFIX=URI", value_parser = parse_key_value)]
    pub namespaces: Vec<(String, String)>,
}

impl QueryArgs {
    pub fn header(&self) -> Option<bool> {
        match (self.header, self.no_header) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn loader_options(&self) -> LoaderOptions {
        let mut options = LoaderOptions { header: self.header(), delimiter: self.delimiter, ..LoaderOptions::default() };
        if !self.fields.is_empty() {
            options = options.with_fields(self.fields.iter().cloned().collect::<fluentree_loader::FieldMap>());
        }
        options
    }

    fn fetch_options(&self) -> FetchOptions {
        let mut options = FetchOptions::empty();
        options.set(FetchOptions::UNIQUE, self.unique);
        options.set(FetchOptions::REVERSE, self.reverse);
        options
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct AttributeSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    value: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub(crate) enum NodeSummary {
    Element {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        text: String,
        attributes: Vec<AttributeSummary>,
    },
    Attribute {
        owner: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        value: String,
    },
    Text {
        value: String,
    },
    Comment {
        value: String,
    },
    ProcessingInstruction {
        target: String,
        value: String,
    },
    Document,
}

pub fn run(args: &QueryArgs) -> anyhow::Result<String> {
    let registry = LoaderRegistry::discover();
    let source = LoadSource::File(args.source.clone());
    let options = args.loader_options();
    let unavailable =
        || anyhow!("no loader produced a document for {} as `{}`", args.source.display(), args.content_type);

    let (document, context) = if args.fragment {
        let fragment = registry
            .load_fragment(&source, &args.content_type, &options)
            .with_context(|| format!("failed to load {}", args.source.display()))?
            .ok_or_else(unavailable)?;
        let context = fragment.children().to_vec();
        (fragment.into_parts().0, context)
    } else {
        let document = registry
            .load(&source, &args.content_type, &options)
            .with_context(|| format!("failed to load {}", args.source.display()))?
            .ok_or_else(unavailable)?;
        (document, Vec::new())
    };
    tracing::debug!(nodes = document.node_count(), context = context.len(), "source loaded");

    let static_ctx = args
        .namespaces
        .iter()
        .fold(StaticContextBuilder::new().with_namespace("json", JSON_DOM_NS), |builder, (prefix, uri)| {
            builder.with_namespace(prefix.as_str(), uri.as_str())
        })
        .build();
    let model = XPathModel::with_context(&document, static_ctx);
    let nodes = Nodes::with_context(&model, context);

    let mut options = args.fetch_options();
    if nodes.is_empty() {
        options |= FetchOptions::IGNORE_CONTEXT;
    }
    let result = nodes
        .fetch(&args.expression, None, None, options)
        .with_context(|| format!("query `{}` failed", args.expression))?;

    let summaries: Vec<NodeSummary> = result.iter().map(|&node| summarize(&document, node)).collect();
    match args.format {
        OutputFormat::Text => Ok(render_text(&summaries)),
        OutputFormat::Json => render_json(&summaries),
    }
}

pub(crate) fn summarize(doc: &Document, node: NodeId) -> NodeSummary {
    let namespace = || doc.namespace_uri(node).map(str::to_owned);
    match doc.kind(node) {
        NodeKind::Element => NodeSummary::Element {
            name: doc.node_name(node),
            namespace: namespace(),
            text: doc.string_value(node),
            attributes: doc
                .attributes(node)
                .iter()
                .map(|&attr| AttributeSummary {
                    name: doc.node_name(attr),
                    namespace: doc.namespace_uri(attr).map(str::to_owned),
                    value: doc.value(attr).to_owned(),
                })
                .collect(),
        },
        NodeKind::Attribute => NodeSummary::Attribute {
            owner: doc.parent(node).map(|owner| doc.node_name(owner)).unwrap_or_default(),
            name: doc.node_name(node),
            namespace: namespace(),
            value: doc.value(node).to_owned(),
        },
        NodeKind::Text => NodeSummary::Text { value: doc.value(node).to_owned() },
        NodeKind::Comment => NodeSummary::Comment { value: doc.value(node).to_owned() },
        NodeKind::ProcessingInstruction => NodeSummary::ProcessingInstruction {
            target: doc.node_name(node),
            value: doc.value(node).to_owned(),
        },
        NodeKind::Document | NodeKind::DocumentFragment => NodeSummary::Document,
    }
}

fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.replace('"', "\\\"")))
}

#[derive(Clone, Copy)]
enum Tone {
    Name,
    Attribute,
    Value,
    Muted,
}

fn paint(text: &str, tone: Tone) -> String {
    text.if_supports_color(Stream::Stdout, |text| match tone {
        Tone::Name => text.bold().to_string(),
        Tone::Attribute => text.magenta().to_string(),
        Tone::Value => text.green().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    })
    .to_string()
}

pub(crate) fn render_text(items: &[NodeSummary]) -> String {
    let mut output = String::new();
    for item in items {
        let _ = match item {
            NodeSummary::Element { name, text, attributes, .. } => {
                let label = paint(name, Tone::Name);
                let _ = if text.is_empty() {
                    writeln!(&mut output, "{label}")
                } else {
                    writeln!(&mut output, "{label} {}", paint(&quoted(text), Tone::Value))
                };
                for attribute in attributes {
                    let name = paint(&format!("@{}", attribute.name), Tone::Attribute);
                    let _ = writeln!(&mut output, "    {name} = {}", paint(&quoted(&attribute.value), Tone::Value));
                }
                Ok(())
            }
            NodeSummary::Attribute { owner, name, value, .. } => writeln!(
                &mut output,
                "{} = {} ({})",
                paint(&format!("@{name}"), Tone::Attribute),
                paint(&quoted(value), Tone::Value),
                paint(owner, Tone::Muted)
            ),
            NodeSummary::Text { value } => writeln!(&mut output, "{}", paint(&quoted(value), Tone::Value)),
            NodeSummary::Comment { value } => writeln!(&mut output, "{}", paint(&format!("<!--{value}-->"), Tone::Muted)),
            NodeSummary::ProcessingInstruction { target, value } => {
                writeln!(&mut output, "{}", paint(&format!("<?{target} {value}?>"), Tone::Muted))
            }
            NodeSummary::Document => writeln!(&mut output, "{}", paint("/", Tone::Name)),
        };
    }
    output.trim_end().to_owned()
}

pub(crate) fn render_json(items: &[NodeSummary]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}
