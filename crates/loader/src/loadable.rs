use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use fluentree_dom::{Document, Fragment};
use serde::Deserialize;

use crate::error::LoadError;

/// Capability interface of a format loader.
pub trait Loadable: Send + Sync {
    /// Stable identifier used by the registry.
    fn id(&self) -> &'static str;

    fn supported_types(&self) -> &'static [&'static str];

    /// Whether `content_type` (parameters such as `; charset=utf-8` ignored)
    /// is one of [`supported_types`](Self::supported_types), case-insensitively.
    fn supports(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.supported_types().iter().any(|t| t.eq_ignore_ascii_case(essence))
    }

    /// Builds a document, or `Ok(None)` for unsupported types and
    /// unreadable/empty sources.
    fn load(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Document>, LoadError>;

    /// Same as [`load`](Self::load) but collects the nodes in a fragment.
    fn load_fragment(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Fragment>, LoadError>;
}

/// Input handed to a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    Text(String),
    File(PathBuf),
    /// Pre-split tabular records.
    Rows(Vec<Vec<String>>),
    /// Already-decoded JSON.
    Json(serde_json::Value),
}

impl LoadSource {
    /// Text content of `Text` and `File` sources. Unreadable files yield `None`.
    pub(crate) fn read_text(&self) -> Option<Cow<'_, str>> {
        match self {
            LoadSource::Text(text) => Some(Cow::Borrowed(text)),
            LoadSource::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => Some(Cow::Owned(text)),
                Err(error) => {
                    tracing::debug!(path = %path.display(), %error, "source file is not readable");
                    None
                }
            },
            LoadSource::Rows(_) | LoadSource::Json(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            LoadSource::Text(_) => "text",
            LoadSource::File(_) => "file",
            LoadSource::Rows(_) => "rows",
            LoadSource::Json(_) => "json",
        }
    }
}

impl From<&str> for LoadSource {
    fn from(text: &str) -> Self {
        LoadSource::Text(text.to_string())
    }
}

impl From<String> for LoadSource {
    fn from(text: String) -> Self {
        LoadSource::Text(text)
    }
}

impl From<PathBuf> for LoadSource {
    fn from(path: PathBuf) -> Self {
        LoadSource::File(path)
    }
}

impl From<Vec<Vec<String>>> for LoadSource {
    fn from(rows: Vec<Vec<String>>) -> Self {
        LoadSource::Rows(rows)
    }
}

impl From<serde_json::Value> for LoadSource {
    fn from(value: serde_json::Value) -> Self {
        LoadSource::Json(value)
    }
}

/// Flat loader options, deserializable with their upper-case keys:
///
/// ```
/// use fluentree_loader::LoaderOptions;
///
/// let options: LoaderOptions =
///     serde_json::from_str(r#"{"HEADER": false, "FIELDS": ["a", "b"], "DELIMITER": ";"}"#).unwrap();
/// assert_eq!(options.header, Some(false));
/// assert_eq!(options.fields.unwrap().get("1"), Some("b"));
/// assert_eq!(options.delimiter, Some(';'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct LoaderOptions {
    pub header: Option<bool>,
    pub fields: Option<FieldMap>,
    pub delimiter: Option<char>,
    pub enclosure: Option<char>,
    pub escape: Option<char>,
}

impl LoaderOptions {
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_fields(mut self, fields: impl Into<FieldMap>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_enclosure(mut self, enclosure: char) -> Self {
        self.enclosure = Some(enclosure);
        self
    }

    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = Some(escape);
        self
    }
}

/// Column key → element name. Keys are header texts, or decimal column
/// indexes when there is no header row; a plain list maps index `i` to entry `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "FieldsInput")]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.0.insert(key.into(), name.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldsInput {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl From<FieldsInput> for FieldMap {
    fn from(input: FieldsInput) -> Self {
        match input {
            FieldsInput::List(names) => names.into(),
            FieldsInput::Map(map) => FieldMap(map),
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for FieldMap {
    fn from(names: Vec<S>) -> Self {
        FieldMap(names.into_iter().enumerate().map(|(i, name)| (i.to_string(), name.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FieldMap(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
