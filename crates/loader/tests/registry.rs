use fluentree_dom::{Document, Fragment};
use fluentree_loader::{LoadError, LoadSource, Loadable, LoaderOptions, LoaderRegistry};

/// Claims `text/csv` and builds a single `<claimed/>` element.
struct Claiming;

impl Loadable for Claiming {
    fn id(&self) -> &'static str {
        "claiming"
    }

    fn supported_types(&self) -> &'static [&'static str] {
        &["text/csv", "text/x-claimed"]
    }

    fn load(&self, _: &LoadSource, _: &str, _: &LoaderOptions) -> Result<Option<Document>, LoadError> {
        let mut doc = Document::new();
        let el = doc.create_element("claimed")?;
        doc.append_child(doc.root(), el)?;
        Ok(Some(doc))
    }

    fn load_fragment(&self, _: &LoadSource, _: &str, _: &LoaderOptions) -> Result<Option<Fragment>, LoadError> {
        Ok(None)
    }
}

fn element_name(doc: &Document) -> String {
    doc.node_name(doc.document_element().unwrap())
}

#[test]
fn first_supporting_loader_wins() {
    let source = LoadSource::from("a\n1");
    let options = LoaderOptions::default();

    let claiming_first = LoaderRegistry::new().with(Claiming).with(fluentree_loader::CsvLoader);
    let doc = claiming_first.load(&source, "text/csv", &options).unwrap().unwrap();
    assert_eq!(element_name(&doc), "claimed");

    let csv_first = LoaderRegistry::new().with(fluentree_loader::CsvLoader).with(Claiming);
    let doc = csv_first.load(&source, "text/csv", &options).unwrap().unwrap();
    assert_eq!(element_name(&doc), "json:json");
    assert_eq!(csv_first.select("text/x-claimed").map(|l| l.id()), Some("claiming"));
}

#[test]
fn unsupported_type_yields_none() {
    let registry = LoaderRegistry::discover();
    let source = LoadSource::from("[\"a\"]");
    let options = LoaderOptions::default();
    assert!(registry.load(&source, "text/html", &options).unwrap().is_none());
    assert!(registry.load_fragment(&source, "text/html", &options).unwrap().is_none());
    assert!(registry.select("text/html").is_none());
}

#[test]
fn discovered_registry_dispatches_by_type() {
    let registry = LoaderRegistry::discover();
    let options = LoaderOptions::default();
    let doc = registry.load(&LoadSource::from("[\"a\", \"x\"]"), "jsonml", &options).unwrap().unwrap();
    assert_eq!(element_name(&doc), "a");
    let fragment = registry
        .load_fragment(&LoadSource::from("1,2"), "text/csv; charset=utf-8", &options)
        .unwrap()
        .unwrap();
    assert_eq!(fragment.children().len(), 1);
}

#[test]
fn malformed_payload_propagates() {
    let registry = LoaderRegistry::discover();
    let result = registry.load(&LoadSource::from("[1,"), "application/jsonml", &LoaderOptions::default());
    assert!(matches!(result, Err(LoadError::Malformed { .. })));
}
