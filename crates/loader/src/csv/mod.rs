//! `text/csv` loader.
//!
//! Records become `_` elements with one child element per mapped column:
//!
//! ```text
//! <json:json xmlns:json="urn:carica-json-dom.2013" json:type="array">
//!   <_><one>1</one><two>2</two></_>
//! </json:json>
//! ```

mod reader;

use fluentree_dom::{Document, Fragment, NodeId};

use crate::error::LoadError;
use crate::loadable::{FieldMap, LoadSource, Loadable, LoaderOptions};
use crate::qualified_name::{self, DEFAULT_NAME};
use reader::Dialect;

/// Namespace of the `json:*` marker element and attributes.
pub const JSON_DOM_NS: &str = "urn:carica-json-dom.2013";

const CONTENT_TYPES: &[&str] = &["text/csv"];

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvLoader;

impl CsvLoader {
    fn records(&self, source: &LoadSource, options: &LoaderOptions) -> Option<Vec<Vec<String>>> {
        let records = match source {
            LoadSource::Rows(rows) => rows.clone(),
            LoadSource::Text(_) | LoadSource::File(_) => reader::records(&source.read_text()?, dialect(options)),
            LoadSource::Json(_) => {
                tracing::debug!(source = source.kind(), "csv loader cannot read this source");
                return None;
            }
        };
        if records.is_empty() {
            tracing::debug!(source = source.kind(), "csv source holds no records");
            return None;
        }
        Some(records)
    }
}

impl Loadable for CsvLoader {
    fn id(&self) -> &'static str {
        "csv"
    }

    fn supported_types(&self) -> &'static [&'static str] {
        CONTENT_TYPES
    }

    fn load(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Document>, LoadError> {
        if !self.supports(content_type) {
            return Ok(None);
        }
        let Some(records) = self.records(source, options) else {
            return Ok(None);
        };
        let has_header = options.header.unwrap_or(options.fields.is_none());

        let mut doc = Document::new();
        let list = doc.create_element_ns(Some(JSON_DOM_NS), "json:json")?;
        doc.append_child(doc.root(), list)?;
        doc.set_attribute_ns(list, Some(JSON_DOM_NS), "json:type", "array")?;
        append_records(&mut doc, list, records, has_header, options.fields.as_ref())?;
        Ok(Some(doc))
    }

    fn load_fragment(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Fragment>, LoadError> {
        if !self.supports(content_type) {
            return Ok(None);
        }
        let Some(records) = self.records(source, options) else {
            return Ok(None);
        };
        let has_header = options.fields.is_none() && options.header == Some(true);

        let mut doc = Document::new();
        let fragment = doc.create_fragment();
        append_records(&mut doc, fragment, records, has_header, options.fields.as_ref())?;
        Ok(Some(Fragment::new(doc, fragment)))
    }
}

fn dialect(options: &LoaderOptions) -> Dialect {
    let defaults = Dialect::default();
    Dialect {
        delimiter: options.delimiter.unwrap_or(defaults.delimiter),
        enclosure: options.enclosure.unwrap_or(defaults.enclosure),
        escape: options.escape.or(defaults.escape),
    }
}

/// Column names come from the first record, which is consumed when it is a header.
fn append_records(
    doc: &mut Document,
    parent: NodeId,
    records: Vec<Vec<String>>,
    has_header: bool,
    fields: Option<&FieldMap>,
) -> Result<(), LoadError> {
    let mut records = records.into_iter().peekable();
    let headers = match records.peek() {
        Some(first) => headers_for(first, has_header, fields),
        None => return Ok(()),
    };
    if has_header {
        records.next();
    }
    for (line, record) in records.enumerate() {
        if record.len() > headers.len() {
            tracing::warn!(line, columns = record.len(), known = headers.len(), "dropping columns without a name");
        }
        let element = doc.create_element(DEFAULT_NAME)?;
        doc.append_child(parent, element)?;
        for (name, value) in headers.iter().zip(&record) {
            if let Some(name) = name {
                append_field(doc, element, name, value)?;
            }
        }
    }
    Ok(())
}

/// Element name per column; `None` drops the column.
fn headers_for(first: &[String], has_header: bool, fields: Option<&FieldMap>) -> Vec<Option<String>> {
    first
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let key = if has_header { text.clone() } else { index.to_string() };
            match fields {
                Some(fields) => fields.get(&key).map(str::to_string),
                None => Some(key),
            }
        })
        .collect()
}

fn append_field(doc: &mut Document, parent: NodeId, name: &str, value: &str) -> Result<(), LoadError> {
    let element_name = qualified_name::normalize(name);
    let child = doc.append_element(parent, &element_name, value)?;
    if element_name != name {
        doc.set_attribute_ns(child, Some(JSON_DOM_NS), "json:name", name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn headers_from_header_line() {
        let headers = headers_for(&strings(&["a", "b"]), true, None);
        assert_eq!(headers, vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn headers_from_indexes() {
        let headers = headers_for(&strings(&["x", "y"]), false, None);
        assert_eq!(headers, vec![Some("0".to_string()), Some("1".to_string())]);
    }

    #[test]
    fn fields_drop_unmapped_columns() {
        let fields: FieldMap = [("b", "second")].into_iter().collect();
        let headers = headers_for(&strings(&["a", "b"]), true, Some(&fields));
        assert_eq!(headers, vec![None, Some("second".to_string())]);
    }

    #[test]
    fn dialect_overrides() {
        let options = LoaderOptions::default().with_delimiter(';');
        let dialect = dialect(&options);
        assert_eq!(dialect.delimiter, ';');
        assert_eq!(dialect.enclosure, '"');
        assert_eq!(dialect.escape, Some('\\'));
    }
}
