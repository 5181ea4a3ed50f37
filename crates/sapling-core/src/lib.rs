//! # Sapling Core
//!
//! Path-based traversal and mutation engine for JavaScript syntax trees:
//! - Arena node model with kind-indexed field tables
//! - Identity-cached paths with family navigation and introspection
//! - Scope and binding tables with a reference crawler
//! - Replacement, insertion and removal that keep a live traversal correct
//! - Execution-order heuristics and conservative type inference
//! - A visitor-table traversal driver and a rewrite rule runner
//!
//! Everything hangs off a [`Session`], which owns the tree, the path cache
//! and the scope tables for one transformation run.

#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod path;
pub mod scope;
pub mod session;
pub mod transform;
pub mod traverse;

// Re-export commonly used types
pub use ast::{
    Alias, Ast, Child, ChildMut, Comment, Field, Node, NodeId, NodeKind, NodeType, ToSource,
    TypeAnnotation, VariableKind,
};
pub use error::{Result, TraverseError};
pub use path::{
    introspection::ExecutionStatus, replacement::Replacement, Container, Key, PathId,
};
pub use scope::{Binding, BindingKind, Scope, ScopeId};
pub use session::{ExpressionParser, ParseError, Session};
pub use transform::{RewriteRule, RuleStats, TransformationSummary, Transformer};
pub use traverse::{has_type, Traversal, VisitorTable};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for sapling components
pub fn init_tracing() {
    init_tracing_with("sapling_core=info");
}

/// Initialize tracing with an explicit default directive such as
/// `sapling_core=debug`. Output goes to stderr so rendered source on stdout
/// stays clean.
pub fn init_tracing_with(directive: &str) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match directive.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(err) => eprintln!("ignoring invalid tracing directive {directive:?}: {err}"),
    }
    // A second initialisation (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Per-session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum nesting depth the recursive driver descends to
    pub max_depth: usize,
    /// Maximum number of times a single path may be requeued in one pass
    pub max_requeues: usize,
    /// Prefix for generated unique identifiers
    pub uid_prefix: String,
    /// Defer scope crawling until the first scope query
    pub noscope: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_depth: 10_000,
            max_requeues: 1_000,
            uid_prefix: "_".to_string(),
            noscope: false,
        }
    }
}

impl SessionConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_requeues(mut self, max_requeues: usize) -> Self {
        self.max_requeues = max_requeues;
        self
    }

    pub fn with_uid_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.uid_prefix = prefix.into();
        self
    }

    pub fn with_noscope(mut self, noscope: bool) -> Self {
        self.noscope = noscope;
        self
    }
}
