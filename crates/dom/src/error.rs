use crate::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("invalid qualified name: {0:?}")]
    InvalidName(String),
    #[error("namespace prefix {0:?} is not bound")]
    UnboundPrefix(String),
    #[error("cannot append {child} to {parent}: {reason}")]
    HierarchyRequest { parent: NodeId, child: NodeId, reason: &'static str },
    #[error("{0} is not an element")]
    NotAnElement(NodeId),
}
