use fluentree_dom::{Document, NodeId};
use fluentree_xpath::{ErrorCode, Evaluator, StaticContextBuilder, Value};
use rstest::{fixture, rstest};

const JSON_NS: &str = "urn:carica-json-dom.2013";

struct Fixture {
    doc: Document,
    list: NodeId,
    items: Vec<NodeId>,
}

/// `<list><item id="1">a</item><item id="2">b<b/></item><!--c--><item id="3">c</item></list>`
#[fixture]
fn tree() -> Fixture {
    let mut doc = Document::new();
    let list = doc.create_element("list").unwrap();
    doc.append_child(doc.root(), list).unwrap();
    let mut items = Vec::new();
    for (id, text) in [("1", "a"), ("2", "b"), ("3", "c")] {
        if id == "3" {
            let comment = doc.create_comment("c");
            doc.append_child(list, comment).unwrap();
        }
        let item = doc.append_element(list, "item", text).unwrap();
        doc.set_attribute(item, "id", id).unwrap();
        items.push(item);
    }
    doc.append_element(items[1], "b", "").unwrap();
    Fixture { doc, list, items }
}

fn nodes(value: Value) -> Vec<NodeId> {
    match value {
        Value::Nodes(nodes) => nodes,
        other => panic!("expected nodes, got {other:?}"),
    }
}

fn eval(f: &Fixture, expr: &str, context: Option<NodeId>) -> Value {
    Evaluator::default().evaluate(&f.doc, expr, context).unwrap()
}

#[rstest]
fn child_and_descendant(tree: Fixture) {
    assert_eq!(nodes(eval(&tree, "/list/item", None)), tree.items);
    assert_eq!(nodes(eval(&tree, "//item", None)), tree.items);
    assert_eq!(nodes(eval(&tree, "item", Some(tree.list))), tree.items);
}

#[rstest]
fn reverse_axis_positions_count_from_the_context(tree: Fixture) {
    let last = tree.items[2];
    assert_eq!(nodes(eval(&tree, "preceding-sibling::item[1]", Some(last))), vec![tree.items[1]]);
    assert_eq!(nodes(eval(&tree, "preceding-sibling::*[last()]", Some(last))), vec![tree.items[0]]);
    assert_eq!(nodes(eval(&tree, "ancestor::*[1]", Some(last))), vec![tree.list]);
}

#[rstest]
fn results_are_in_document_order(tree: Fixture) {
    let last = tree.items[2];
    assert_eq!(nodes(eval(&tree, "preceding-sibling::item", Some(last))), vec![tree.items[0], tree.items[1]]);
    assert_eq!(
        nodes(eval(&tree, "item[3] | item[1]", Some(tree.list))),
        vec![tree.items[0], tree.items[2]]
    );
}

#[rstest]
fn following_and_preceding(tree: Fixture) {
    let first = tree.items[0];
    let following = nodes(eval(&tree, "following::*", Some(first)));
    assert_eq!(following.len(), 3);
    assert_eq!(following[0], tree.items[1]);
    assert_eq!(nodes(eval(&tree, "preceding::*", Some(first))), Vec::<NodeId>::new());
    assert_eq!(nodes(eval(&tree, "following::comment()", Some(first))).len(), 1);
}

#[rstest]
fn attributes_and_predicates(tree: Fixture) {
    assert_eq!(nodes(eval(&tree, "//item[@id = '2']", None)), vec![tree.items[1]]);
    assert_eq!(nodes(eval(&tree, "//item[@id > 1]", None)), vec![tree.items[1], tree.items[2]]);
    assert_eq!(nodes(eval(&tree, "//item[b]", None)), vec![tree.items[1]]);
    let attr = nodes(eval(&tree, "@id", Some(tree.items[0])));
    assert_eq!(nodes(eval(&tree, "..", Some(attr[0]))), vec![tree.items[0]]);
}

#[rstest]
#[case("count(//item)", Value::Number(3.0))]
#[case("string(/list/item[2])", Value::String("b".into()))]
#[case("concat(name(/*), '-', local-name(//item[1]))", Value::String("list-item".into()))]
#[case("sum(//@id)", Value::Number(6.0))]
#[case("normalize-space('  a   b ')", Value::String("a b".into()))]
#[case("substring-before('a=b', '=')", Value::String("a".into()))]
#[case("substring-after('a=b', '=')", Value::String("b".into()))]
#[case("string-length('äbc')", Value::Number(3.0))]
#[case("not(//missing)", Value::Boolean(true))]
#[case("7 mod 3 + 1 * 2 - 4 div 2", Value::Number(1.0))]
#[case("//item = 'c'", Value::Boolean(true))]
#[case("//item != //item", Value::Boolean(true))]
#[case("1 = true()", Value::Boolean(true))]
#[case("'1' = 1.0", Value::Boolean(true))]
#[case("contains('fluent', 'uen') and starts-with('fluent', 'fl')", Value::Boolean(true))]
fn scalar_results(tree: Fixture, #[case] expr: &str, #[case] expected: Value) {
    assert_eq!(eval(&tree, expr, None), expected);
}

#[test]
fn namespaced_name_tests() {
    let mut doc = Document::new();
    let root = doc.create_element_ns(Some(JSON_NS), "json:json").unwrap();
    doc.append_child(doc.root(), root).unwrap();
    let record = doc.create_element("_").unwrap();
    doc.append_child(root, record).unwrap();
    doc.set_attribute_ns(record, Some(JSON_NS), "json:name", "0").unwrap();

    let evaluator = Evaluator::new(StaticContextBuilder::new().with_namespace("j", JSON_NS).build());
    let found = evaluator.evaluate(&doc, "/j:json/_[@j:name = '0']", None).unwrap();
    assert_eq!(found, Value::Nodes(vec![record]));
    assert_eq!(evaluator.evaluate(&doc, "count(/j:*)", None).unwrap(), Value::Number(1.0));
    assert_eq!(evaluator.evaluate(&doc, "count(/json)", None).unwrap(), Value::Number(0.0));
}

#[test]
fn detached_subtrees_are_their_own_root() {
    let mut doc = Document::new();
    let loose = doc.create_element("loose").unwrap();
    let child = doc.append_element(loose, "child", "x").unwrap();
    let found = Evaluator::default().evaluate(&doc, "/child", Some(child)).unwrap();
    assert_eq!(found, Value::Nodes(vec![child]));
}

#[rstest]
fn union_of_non_nodes_is_a_type_error(tree: Fixture) {
    let err = Evaluator::default().evaluate(&tree.doc, "1 | //item", None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
}

#[rstest]
fn compiled_expressions_are_cached(tree: Fixture) {
    let evaluator = Evaluator::default();
    let first = evaluator.compile("//item[1]").unwrap();
    let second = evaluator.compile("//item[1]").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(nodes(evaluator.evaluate(&tree.doc, "//item[1]", None).unwrap()), vec![tree.items[0]]);
}
