use pest::Parser;
use pest::iterators::{Pair, Pairs};

use crate::ast::{ArithmeticOp, Axis, CompareOp, Expr, KindTest, Literal, LocationPath, NodeTest, Step};
use crate::context::StaticContext;
use crate::error::{Error, ErrorCode};
use crate::functions::Function;

#[derive(pest_derive::Parser)]
#[grammar = "xpath.pest"]
pub struct XPathParser;

impl XPathParser {
    /// Parses `input` and builds the expression tree, resolving prefixes and
    /// function names against `ctx`.
    pub fn parse_to_ast(input: &str, ctx: &StaticContext) -> Result<Expr, Error> {
        let mut pairs = Self::parse(Rule::xpath, input)?;
        let root = pairs.next().ok_or_else(|| Error::syntax("empty parse tree"))?;
        debug_assert_eq!(root.as_rule(), Rule::xpath);
        let expr = root.into_inner().next().ok_or_else(|| Error::syntax("missing expression"))?;
        AstBuilder { ctx }.build(expr)
    }
}

struct AstBuilder<'a> {
    ctx: &'a StaticContext,
}

impl AstBuilder<'_> {
    fn build(&self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        match pair.as_rule() {
            Rule::expr | Rule::path_expr | Rule::parenthesized_expr => self.build(first_inner(pair)?),
            Rule::or_expr => self.fold(pair, |l, _, r| Ok(Expr::Or(l, r))),
            Rule::and_expr => self.fold(pair, |l, _, r| Ok(Expr::And(l, r))),
            Rule::equality_expr | Rule::relational_expr => self.fold(pair, |left, op, right| {
                let op = match op {
                    "=" => CompareOp::Eq,
                    "!=" => CompareOp::Ne,
                    "<" => CompareOp::Lt,
                    "<=" => CompareOp::Le,
                    ">" => CompareOp::Gt,
                    ">=" => CompareOp::Ge,
                    other => return Err(Error::syntax(format!("unknown comparison {other}"))),
                };
                Ok(Expr::Compare { left, op, right })
            }),
            Rule::additive_expr | Rule::multiplicative_expr => self.fold(pair, |left, op, right| {
                let op = match op {
                    "+" => ArithmeticOp::Add,
                    "-" => ArithmeticOp::Sub,
                    "*" => ArithmeticOp::Mul,
                    "div" => ArithmeticOp::Div,
                    "mod" => ArithmeticOp::Mod,
                    other => return Err(Error::syntax(format!("unknown operator {other}"))),
                };
                Ok(Expr::Arithmetic { left, op, right })
            }),
            Rule::unary_expr => {
                let mut negations = 0usize;
                let mut operand = None;
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::OP_NEG => negations += 1,
                        _ => operand = Some(self.build(inner)?),
                    }
                }
                let operand = operand.ok_or_else(|| Error::syntax("missing operand"))?;
                Ok(if negations % 2 == 1 { Expr::Negate(Box::new(operand)) } else { operand })
            }
            Rule::union_expr => {
                let mut inner = pair.into_inner();
                let mut acc = self.build(next_pair(&mut inner)?)?;
                for rhs in inner {
                    acc = Expr::Union(Box::new(acc), Box::new(self.build(rhs)?));
                }
                Ok(acc)
            }
            Rule::filter_path => self.build_filter_path(pair),
            Rule::filter_expr => {
                let mut inner = pair.into_inner();
                let primary = self.build(next_pair(&mut inner)?)?;
                let predicates = self.build_predicates(inner)?;
                if predicates.is_empty() {
                    Ok(primary)
                } else {
                    Ok(Expr::Filter { primary: Box::new(primary), predicates })
                }
            }
            Rule::primary_expr => self.build(first_inner(pair)?),
            Rule::string_literal => {
                let content = pair.into_inner().next().map(|p| p.as_str().to_string()).unwrap_or_default();
                Ok(Expr::Literal(Literal::String(content)))
            }
            Rule::number_literal => {
                let value: f64 =
                    pair.as_str().parse().map_err(|_| Error::syntax(format!("bad number {}", pair.as_str())))?;
                Ok(Expr::Literal(Literal::Number(value)))
            }
            Rule::function_call => {
                let mut inner = pair.into_inner();
                let name = next_pair(&mut inner)?.as_str().to_string();
                let args = inner.map(|arg| self.build(arg)).collect::<Result<Vec<_>, _>>()?;
                let function = Function::resolve(&name, args.len())?;
                Ok(Expr::FunctionCall { function, args })
            }
            Rule::location_path => self.build(first_inner(pair)?),
            Rule::absolute_location_path => {
                let mut inner = pair.into_inner();
                let separator = next_pair(&mut inner)?;
                let mut steps = Vec::new();
                if separator.as_rule() == Rule::DESCENDANT_SEP {
                    steps.push(Step::descendant_or_self());
                }
                if let Some(relative) = inner.next() {
                    steps.extend(self.build_steps(relative)?);
                }
                Ok(Expr::Path(LocationPath { absolute: true, steps }))
            }
            Rule::relative_location_path => {
                Ok(Expr::Path(LocationPath { absolute: false, steps: self.build_steps(pair)? }))
            }
            other => Err(Error::syntax(format!("unexpected {other:?} in expression"))),
        }
    }

    /// Left-associative chain `operand (op operand)*`.
    fn fold<F>(&self, pair: Pair<'_, Rule>, combine: F) -> Result<Expr, Error>
    where
        F: Fn(Box<Expr>, &str, Box<Expr>) -> Result<Expr, Error>,
    {
        let mut inner = pair.into_inner();
        let mut acc = self.build(next_pair(&mut inner)?)?;
        while let Some(op) = inner.next() {
            let rhs = self.build(next_pair(&mut inner)?)?;
            acc = combine(Box::new(acc), op.as_str(), Box::new(rhs))?;
        }
        Ok(acc)
    }

    fn build_filter_path(&self, pair: Pair<'_, Rule>) -> Result<Expr, Error> {
        let mut inner = pair.into_inner();
        let filter = self.build(next_pair(&mut inner)?)?;
        let Some(separator) = inner.next() else {
            return Ok(filter);
        };
        let mut steps = Vec::new();
        if separator.as_str() == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.extend(self.build_steps(next_pair(&mut inner)?)?);
        Ok(Expr::FilterPath { filter: Box::new(filter), steps })
    }

    /// Steps of a `relative_location_path`, expanding `//`, `.` and `..`.
    fn build_steps(&self, pair: Pair<'_, Rule>) -> Result<Vec<Step>, Error> {
        let mut steps = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::path_separator => {
                    if inner.as_str() == "//" {
                        steps.push(Step::descendant_or_self());
                    }
                }
                Rule::step => steps.push(self.build_step(first_inner(inner)?)?),
                other => return Err(Error::syntax(format!("unexpected {other:?} in path"))),
            }
        }
        Ok(steps)
    }

    fn build_step(&self, pair: Pair<'_, Rule>) -> Result<Step, Error> {
        let node = NodeTest::Kind(KindTest::Node);
        match pair.as_rule() {
            Rule::abbreviated_parent => Ok(Step { axis: Axis::Parent, test: node, predicates: Vec::new() }),
            Rule::abbreviated_self => Ok(Step { axis: Axis::SelfAxis, test: node, predicates: Vec::new() }),
            Rule::axis_step => {
                let mut axis = Axis::Child;
                let mut test = None;
                let mut predicates = Vec::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::axis_specifier => {
                            let specifier = first_inner(inner)?;
                            axis = match specifier.as_rule() {
                                Rule::attribute_abbrev => Axis::Attribute,
                                _ => Axis::from_name(specifier.as_str())
                                    .ok_or_else(|| Error::syntax(format!("unknown axis {}", specifier.as_str())))?,
                            };
                        }
                        Rule::node_test => test = Some(self.build_node_test(first_inner(inner)?)?),
                        Rule::predicate => predicates.push(self.build(first_inner(inner)?)?),
                        other => return Err(Error::syntax(format!("unexpected {other:?} in step"))),
                    }
                }
                let test = test.ok_or_else(|| Error::syntax("step without node test"))?;
                Ok(Step { axis, test, predicates })
            }
            other => Err(Error::syntax(format!("unexpected {other:?} as step"))),
        }
    }

    fn build_node_test(&self, pair: Pair<'_, Rule>) -> Result<NodeTest, Error> {
        match pair.as_rule() {
            Rule::kind_test => {
                let mut inner = pair.into_inner();
                let kind = next_pair(&mut inner)?;
                let target = inner.next().and_then(|lit| lit.into_inner().next()).map(|p| p.as_str().to_string());
                Ok(NodeTest::Kind(match kind.as_str() {
                    "node" => KindTest::Node,
                    "text" => KindTest::Text,
                    "comment" => KindTest::Comment,
                    _ => KindTest::ProcessingInstruction(target),
                }))
            }
            Rule::name_test => {
                let test = first_inner(pair)?;
                match test.as_rule() {
                    Rule::wildcard => Ok(NodeTest::Any),
                    Rule::prefixed_wildcard => {
                        let prefix = test.as_str().trim_end_matches(":*");
                        Ok(NodeTest::Namespace(self.resolve_prefix(prefix)?.to_string()))
                    }
                    _ => {
                        let (ns_uri, local) = match test.as_str().split_once(':') {
                            Some((prefix, local)) => (Some(self.resolve_prefix(prefix)?.to_string()), local),
                            None => (None, test.as_str()),
                        };
                        Ok(NodeTest::Name { ns_uri, local: local.to_string() })
                    }
                }
            }
            other => Err(Error::syntax(format!("unexpected {other:?} as node test"))),
        }
    }

    fn build_predicates(&self, pairs: Pairs<'_, Rule>) -> Result<Vec<Expr>, Error> {
        pairs.map(|predicate| self.build(first_inner(predicate)?)).collect()
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<&str, Error> {
        self.ctx
            .namespace_uri(prefix)
            .ok_or_else(|| Error::from_code(ErrorCode::XPST0081, format!("unbound namespace prefix {prefix}")))
    }
}

fn first_inner(pair: Pair<'_, Rule>) -> Result<Pair<'_, Rule>, Error> {
    let rule = pair.as_rule();
    pair.into_inner().next().ok_or_else(|| Error::syntax(format!("empty {rule:?}")))
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, Error> {
    pairs.next().ok_or_else(|| Error::syntax("truncated expression"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContextBuilder;
    use rstest::rstest;

    fn parse(input: &str) -> Result<Expr, Error> {
        let ctx = StaticContextBuilder::new().with_namespace("json", "urn:carica-json-dom.2013").build();
        XPathParser::parse_to_ast(input, &ctx)
    }

    fn path(input: &str) -> LocationPath {
        match parse(input).unwrap() {
            Expr::Path(path) => path,
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn double_slash_expands_to_descendant_or_self() {
        let p = path("//item");
        assert!(p.absolute);
        assert_eq!(p.steps.len(), 2);
        assert_eq!(p.steps[0], Step::descendant_or_self());
        assert_eq!(p.steps[1].test, NodeTest::Name { ns_uri: None, local: "item".into() });
    }

    #[test]
    fn abbreviations() {
        let p = path("../@id");
        assert_eq!(p.steps[0].axis, Axis::Parent);
        assert_eq!(p.steps[1].axis, Axis::Attribute);
        assert_eq!(path(".").steps[0].axis, Axis::SelfAxis);
    }

    #[test]
    fn prefixes_resolve_against_the_context() {
        let p = path("json:json/_");
        assert_eq!(
            p.steps[0].test,
            NodeTest::Name { ns_uri: Some("urn:carica-json-dom.2013".into()), local: "json".into() }
        );
        assert_eq!(path("json:*").steps[0].test, NodeTest::Namespace("urn:carica-json-dom.2013".into()));
    }

    #[test]
    fn keywords_are_names_in_step_position() {
        let p = path("and/or/div");
        assert_eq!(p.steps.len(), 3);
        assert!(matches!(parse("a or b").unwrap(), Expr::Or(_, _)));
        assert!(matches!(parse("6 div 2").unwrap(), Expr::Arithmetic { op: ArithmeticOp::Div, .. }));
    }

    #[test]
    fn node_type_names_are_kind_tests() {
        assert_eq!(path("text()").steps[0].test, NodeTest::Kind(KindTest::Text));
        assert_eq!(
            path("processing-instruction('pi')").steps[0].test,
            NodeTest::Kind(KindTest::ProcessingInstruction(Some("pi".into())))
        );
    }

    #[test]
    fn double_negation_cancels() {
        assert_eq!(parse("--1").unwrap(), Expr::Literal(Literal::Number(1.0)));
        assert!(matches!(parse("-1").unwrap(), Expr::Negate(_)));
    }

    #[test]
    fn filter_path_with_predicate() {
        let expr = parse("(a | b)[1]//c").unwrap();
        let Expr::FilterPath { filter, steps } = expr else { panic!("expected filter path") };
        assert!(matches!(*filter, Expr::Filter { .. }));
        assert_eq!(steps.len(), 2);
    }

    #[rstest]
    #[case("", ErrorCode::XPST0003)]
    #[case("a[", ErrorCode::XPST0003)]
    #[case("@", ErrorCode::XPST0003)]
    #[case("a b", ErrorCode::XPST0003)]
    #[case("foo:bar", ErrorCode::XPST0081)]
    #[case("unknown()", ErrorCode::XPST0017)]
    #[case("count()", ErrorCode::XPST0017)]
    fn parse_errors(#[case] input: &str, #[case] code: ErrorCode) {
        assert_eq!(parse(input).unwrap_err().code, code);
    }
}
