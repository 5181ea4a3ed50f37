use thiserror::Error;

use crate::ast::{Field, NodeType};

/// Errors raised by the traversal and mutation API.
///
/// These are programmer errors in the calling rule; inconclusive analysis
/// never produces one.
#[derive(Error, Debug)]
pub enum TraverseError {
    #[error("You passed `path.replace_with()` a falsy node, use `path.remove()` instead")]
    FalsyReplacement,

    #[error("Don't use `path.replace_with()` with an array of nodes, use `path.replace_with_multiple()`")]
    ArrayReplacement,

    #[error("Don't use `path.replace_with()` with a source string, use `path.replace_with_source_string()`")]
    SourceReplacement,

    #[error("You can only replace a Program root node with another Program node, got {found}")]
    RootReplacement { found: NodeType },

    #[error("NodePath has been removed so is read-only")]
    RemovedPath,

    #[error("Expected a non-empty list of nodes")]
    EmptyNodeList,

    #[error("File/Program node, we can't possibly find a statement parent to this")]
    NoStatementParent,

    #[error("Operation `{operation}` needs a list container, but the path sits in a single-node slot")]
    NotAList { operation: &'static str },

    #[error("Field `{field}` of {parent} is a list; use a list operation")]
    NotASlot { parent: NodeType, field: Field },

    #[error("Cannot remove the Program root")]
    RootRemoval,

    #[error("Cannot remove required field `{field}` of {parent}")]
    RequiredSlot { parent: NodeType, field: Field },

    #[error("Index {index} is outside `{field}` (length {len})")]
    OutOfBounds { field: Field, index: usize, len: usize },

    #[error("Node type {node_type} has no field `{field}`")]
    UnknownField { node_type: NodeType, field: String },

    #[error("Path has no node to operate on")]
    EmptyPath,

    #[error("No expression parser is installed for source-string replacement")]
    NoParser,

    #[error("{message} - make sure this is an expression.")]
    Parse { message: String, offset: Option<usize> },

    #[error("Traversal exceeded the maximum depth of {max_depth}")]
    DepthLimit { max_depth: usize },

    #[error("Node {node_type} was requeued more than {max_requeues} times")]
    RequeueLimit { node_type: NodeType, max_requeues: usize },

    #[error(transparent)]
    Rule(#[from] anyhow::Error),
}

impl TraverseError {
    pub fn unknown_field(node_type: NodeType, field: impl Into<String>) -> Self {
        Self::UnknownField { node_type, field: field.into() }
    }

    pub fn not_a_list(operation: &'static str) -> Self {
        Self::NotAList { operation }
    }
}

/// Result type for traversal and mutation operations
pub type Result<T> = std::result::Result<T, TraverseError>;
