//! Compiled expression tree. Prefixes are already resolved to namespace URIs
//! and function names checked against the library when a tree is built.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare { left: Box<Expr>, op: CompareOp, right: Box<Expr> },
    Arithmetic { left: Box<Expr>, op: ArithmeticOp, right: Box<Expr> },
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    /// Primary expression narrowed by predicates.
    Filter { primary: Box<Expr>, predicates: Vec<Expr> },
    /// Primary expression followed by location steps (`(a|b)/c`).
    FilterPath { filter: Box<Expr>, steps: Vec<Step> },
    Path(LocationPath),
    FunctionCall { function: crate::functions::Function, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// `descendant-or-self::node()`, the expansion of `//`.
    pub(crate) fn descendant_or_self() -> Self {
        Self { axis: Axis::DescendantOrSelf, test: NodeTest::Kind(KindTest::Node), predicates: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    Attribute,
    SelfAxis,
    DescendantOrSelf,
    FollowingSibling,
    Following,
    Parent,
    Ancestor,
    PrecedingSibling,
    Preceding,
    AncestorOrSelf,
}

impl Axis {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "self" => Axis::SelfAxis,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "following" => Axis::Following,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "preceding-sibling" => Axis::PrecedingSibling,
            "preceding" => Axis::Preceding,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            _ => return None,
        })
    }

    /// Reverse axes number their proximity positions from the context node backwards.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent | Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Expanded name test; `ns_uri` is `None` for unprefixed names.
    Name { ns_uri: Option<String>, local: String },
    /// `prefix:*`
    Namespace(String),
    /// `*`
    Any,
    Kind(KindTest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindTest {
    Node,
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
}
