use std::collections::HashMap;
use std::fmt;

use crate::ast::{Ast, NodeId};
use crate::path::{Container, PathData, PathId};
use crate::scope::ScopeTable;
use crate::traverse::context::Frame;
use crate::SessionConfig;

/// Failure reported by an [`ExpressionParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: Option<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at offset {offset}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// External parser used by `replace_with_source_string`.
pub trait ExpressionParser {
    /// Parse `source` as a single expression, allocating its nodes in `ast`.
    fn parse_expression(&mut self, ast: &mut Ast, source: &str) -> Result<NodeId, ParseError>;
}

/// One transformation run over a resident tree.
///
/// Owns the node arena, the path arena and cache, the scope tables and the
/// traversal frames. Paths are plain indices into the session, so every
/// query and mutation goes through `&mut Session`.
pub struct Session {
    pub(crate) ast: Ast,
    pub(crate) config: SessionConfig,
    pub(crate) paths: Vec<PathData>,
    pub(crate) cache: HashMap<Container, Vec<PathId>>,
    /// Node-less handles, one per parent path.
    pub(crate) detached: HashMap<Option<PathId>, PathId>,
    pub(crate) scopes: ScopeTable,
    pub(crate) frames: Vec<Frame>,
    pub(crate) next_frame_id: u64,
    pub(crate) stopping: bool,
    pub(crate) mutations: u64,
    pub(crate) parser: Option<Box<dyn ExpressionParser>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("nodes", &self.ast.len())
            .field("paths", &self.paths.len())
            .field("scopes", &self.scopes.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Session {
    pub fn new(ast: Ast) -> Self {
        Self::with_config(ast, SessionConfig::default())
    }

    pub fn with_config(ast: Ast, config: SessionConfig) -> Self {
        let noscope = config.noscope;
        let mut session = Self {
            ast,
            config,
            paths: Vec::new(),
            cache: HashMap::new(),
            detached: HashMap::new(),
            scopes: ScopeTable::default(),
            frames: Vec::new(),
            next_frame_id: 0,
            stopping: false,
            mutations: 0,
            parser: None,
        };
        if !noscope {
            session.ensure_scopes();
        }
        session
    }

    pub fn with_parser(mut self, parser: impl ExpressionParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    pub fn set_parser(&mut self, parser: Box<dyn ExpressionParser>) {
        self.parser = Some(parser);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Direct arena access. Edits made here bypass the mutation protocol;
    /// use it to build new nodes, then attach them through a path.
    pub fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    pub fn into_ast(self) -> Ast {
        self.ast
    }

    /// Number of protocol mutations applied so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    pub(crate) fn record_mutation(&mut self) {
        self.mutations += 1;
    }

    /// Drop every cached path and every scope.
    pub fn clear(&mut self) {
        self.clear_path();
        self.clear_scope();
    }

    /// Drop cached path handles. Later navigation creates fresh handles;
    /// old ones stay valid indices but are no longer returned.
    pub fn clear_path(&mut self) {
        self.cache.clear();
        self.detached.clear();
    }

    /// Drop scope tables; they are rebuilt on the next scope query.
    pub fn clear_scope(&mut self) {
        self.scopes = ScopeTable::default();
        for data in &mut self.paths {
            data.type_annotation = None;
        }
    }
}
