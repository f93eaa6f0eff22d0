mod common;

use common::{outline, outline_children};
use fluentree_loader::{JsonMlLoader, LoadError, LoadSource, Loadable, LoaderOptions};
use rstest::rstest;
use serde_json::json;

fn load(source: impl Into<LoadSource>) -> fluentree_dom::Document {
    JsonMlLoader
        .load(&source.into(), "application/jsonml+json", &LoaderOptions::default())
        .unwrap()
        .expect("document")
}

#[test]
fn elements_attributes_and_text() {
    let doc = load(r#"["ul", {"class": "list"}, ["li", "one"], ["li", {"id": 2}, "two"]]"#);
    let root = doc.document_element().unwrap();
    assert_eq!(outline(&doc, root), r#"<ul class="list"><li>one</li><li id="2">two</li></ul>"#);
}

#[test]
fn scalar_children_become_text() {
    let doc = load(json!(["v", true, " ", 1.5, null, {"late": "ignored"}, false]));
    assert_eq!(outline_children(&doc, doc.root()), "<v>true 1.5false</v>");
}

#[test]
fn attribute_values_are_stringified() {
    let doc = load(json!(["e", {"flag": false, "none": null, "list": [1, "a"]}]));
    let e = doc.document_element().unwrap();
    assert_eq!(doc.attribute_value(e, None, "flag"), Some("false"));
    assert_eq!(doc.attribute_value(e, None, "none"), Some(""));
    assert_eq!(doc.attribute_value(e, None, "list"), Some(r#"[1,"a"]"#));
}

#[test]
fn prefixed_namespace_is_inherited_not_redeclared() {
    let doc = load(json!(["a:root", {"xmlns:a": "urn:a"}, ["a:child"]]));
    let root = doc.document_element().unwrap();
    let child = doc.children(root)[0];
    assert_eq!(doc.namespace_uri(root), Some("urn:a"));
    assert_eq!(doc.namespace_uri(child), Some("urn:a"));
    assert!(doc.namespaces(child).is_empty());
}

#[test]
fn default_namespace_applies_to_descendants() {
    let doc = load(json!(["feed", {"xmlns": "urn:feed"}, ["entry", {"xmlns:x": "urn:x", "x:ref": "7"}]]));
    let feed = doc.document_element().unwrap();
    let entry = doc.children(feed)[0];
    assert_eq!(doc.namespace_uri(entry), Some("urn:feed"));
    assert_eq!(doc.attribute_value(entry, Some("urn:x"), "ref"), Some("7"));
    assert_eq!(doc.lookup_namespace_uri(entry, Some("x")), Some("urn:x"));
}

#[test]
fn unprefixed_attributes_have_no_namespace() {
    let doc = load(json!(["root", {"xmlns": "urn:d", "id": "r"}]));
    let root = doc.document_element().unwrap();
    assert_eq!(doc.attribute_value(root, None, "id"), Some("r"));
    assert_eq!(doc.attribute_value(root, Some("urn:d"), "id"), None);
}

#[test]
fn changed_namespace_is_declared() {
    let doc = load(json!(["p:a", {"xmlns:p": "urn:1"}, ["p:b", {"xmlns:p": "urn:2"}]]));
    let a = doc.document_element().unwrap();
    let b = doc.children(a)[0];
    assert_eq!(doc.namespace_uri(b), Some("urn:2"));
    assert_eq!(doc.lookup_namespace_uri(a, Some("p")), Some("urn:1"));
}

#[test]
fn unbound_attribute_prefix_is_an_error() {
    let err = JsonMlLoader
        .load(&json!(["e", {"q:x": "1"}]).into(), "jsonml", &LoaderOptions::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::Dom(_)), "{err:?}");
}

#[test]
fn malformed_json_reports_position() {
    let err = JsonMlLoader
        .load(&LoadSource::from("[\"a\",\n  {\"b\": }]"), "jsonml", &LoaderOptions::default())
        .unwrap_err();
    match &err {
        LoadError::Malformed { content_type, line, .. } => {
            assert_eq!(content_type, "jsonml");
            assert_eq!(*line, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.category(), Some("syntax"));
    assert!(std::error::Error::source(&err).is_some());
}

#[rstest]
#[case(LoadSource::from("not json"))]
#[case(LoadSource::from("   "))]
#[case(LoadSource::File("/no/such/file.json".into()))]
#[case(LoadSource::Rows(vec![vec!["a".to_string()]]))]
fn non_json_sources_yield_none(#[case] source: LoadSource) {
    assert!(JsonMlLoader.load(&source, "jsonml", &LoaderOptions::default()).unwrap().is_none());
}

#[rstest]
#[case("jsonml", true)]
#[case("application/jsonml", true)]
#[case("Application/JsonML+JSON", true)]
#[case("application/json", false)]
#[case("text/csv", false)]
fn supported_types(#[case] content_type: &str, #[case] expected: bool) {
    assert_eq!(JsonMlLoader.supports(content_type), expected);
}

#[test]
fn fragment_keeps_top_level_text() {
    let options = LoaderOptions::default();
    let source = LoadSource::Json(json!("loose"));
    let fragment = JsonMlLoader.load_fragment(&source, "jsonml", &options).unwrap().unwrap();
    assert_eq!(outline_children(fragment.document(), fragment.root()), "loose");

    let doc = JsonMlLoader.load(&source, "jsonml", &options).unwrap().unwrap();
    assert!(doc.children(doc.root()).is_empty());
}

#[test]
fn file_source_with_leading_whitespace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.jsonml");
    std::fs::write(&path, "\n  [\"note\", \"hi\"]").unwrap();
    let doc = load(path);
    assert_eq!(outline_children(&doc, doc.root()), "<note>hi</note>");
}
