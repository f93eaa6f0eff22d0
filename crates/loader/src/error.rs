use fluentree_dom::DomError;

/// Loud loader failures. "Not my format" and unreadable sources are not
/// errors; loaders return `Ok(None)` for those.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed {content_type} payload at line {line}, column {column}")]
    Malformed {
        content_type: String,
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid JSON-ML structure: {0}")]
    InvalidStructure(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl LoadError {
    pub(crate) fn malformed(content_type: &str, source: serde_json::Error) -> Self {
        LoadError::Malformed {
            content_type: content_type.to_string(),
            line: source.line(),
            column: source.column(),
            source,
        }
    }

    /// Parser category (`syntax`, `eof`, `data`, `io`) for malformed payloads.
    pub fn category(&self) -> Option<&'static str> {
        match self {
            LoadError::Malformed { source, .. } => Some(match source.classify() {
                serde_json::error::Category::Io => "io",
                serde_json::error::Category::Syntax => "syntax",
                serde_json::error::Category::Data => "data",
                serde_json::error::Category::Eof => "eof",
            }),
            _ => None,
        }
    }
}
