/*!
Visitor-table traversal.

A [`VisitorTable`] maps node kinds (or aliases, or every kind) to enter and
exit handlers. [`Session::traverse`] walks the tree depth-first, calling
enter before a node's children and exit after them. Handlers may mutate the
tree through the path API while the walk is running:

- a replaced node is visited again as a fresh entry (requeue);
- `skip` keeps the driver out of a node's children;
- `stop` ends the walk and is reported in [`Traversal::stopped`].
*/

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::ast::{Alias, Ast, NodeId, NodeType};
use crate::error::Result;
use crate::path::PathId;
use crate::session::Session;

pub(crate) mod context;

use context::TraversalContext;

/// A visitor callback. Errors abort the traversal and reach the caller.
pub type Handler<'v> = Box<dyn FnMut(&mut Session, PathId) -> Result<()> + 'v>;

/// Handlers keyed by node kind, alias or "any".
#[derive(Default)]
pub struct VisitorTable<'v> {
    pub(crate) enter: HashMap<NodeType, Vec<Handler<'v>>>,
    pub(crate) exit: HashMap<NodeType, Vec<Handler<'v>>>,
    pub(crate) enter_alias: Vec<(Alias, Handler<'v>)>,
    pub(crate) exit_alias: Vec<(Alias, Handler<'v>)>,
    pub(crate) enter_any: Vec<Handler<'v>>,
    pub(crate) exit_any: Vec<Handler<'v>>,
    pub(crate) blacklist: HashSet<NodeType>,
}

impl<'v> VisitorTable<'v> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(mut self, ty: NodeType, handler: impl FnMut(&mut Session, PathId) -> Result<()> + 'v) -> Self {
        self.enter.entry(ty).or_default().push(Box::new(handler));
        self
    }

    pub fn exit(mut self, ty: NodeType, handler: impl FnMut(&mut Session, PathId) -> Result<()> + 'v) -> Self {
        self.exit.entry(ty).or_default().push(Box::new(handler));
        self
    }

    /// Enter handler for every kind belonging to `alias`.
    pub fn enter_alias(
        mut self,
        alias: Alias,
        handler: impl FnMut(&mut Session, PathId) -> Result<()> + 'v,
    ) -> Self {
        self.enter_alias.push((alias, Box::new(handler)));
        self
    }

    pub fn exit_alias(mut self, alias: Alias, handler: impl FnMut(&mut Session, PathId) -> Result<()> + 'v) -> Self {
        self.exit_alias.push((alias, Box::new(handler)));
        self
    }

    pub fn enter_any(mut self, handler: impl FnMut(&mut Session, PathId) -> Result<()> + 'v) -> Self {
        self.enter_any.push(Box::new(handler));
        self
    }

    pub fn exit_any(mut self, handler: impl FnMut(&mut Session, PathId) -> Result<()> + 'v) -> Self {
        self.exit_any.push(Box::new(handler));
        self
    }

    /// Never enter nodes of this kind (nor their subtrees).
    pub fn blacklist(mut self, ty: NodeType) -> Self {
        self.blacklist.insert(ty);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.enter.is_empty()
            && self.exit.is_empty()
            && self.enter_alias.is_empty()
            && self.exit_alias.is_empty()
            && self.enter_any.is_empty()
            && self.exit_any.is_empty()
    }
}

impl fmt::Debug for VisitorTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorTable")
            .field("enter", &self.enter.keys().collect::<Vec<_>>())
            .field("exit", &self.exit.keys().collect::<Vec<_>>())
            .field("enter_alias", &self.enter_alias.iter().map(|(alias, _)| alias).collect::<Vec<_>>())
            .field("exit_alias", &self.exit_alias.iter().map(|(alias, _)| alias).collect::<Vec<_>>())
            .field("enter_any", &self.enter_any.len())
            .field("exit_any", &self.exit_any.len())
            .field("blacklist", &self.blacklist)
            .finish()
    }
}

/// Outcome of one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Traversal {
    /// A handler called `stop`.
    pub stopped: bool,
    /// Number of node visits, requeued visits included.
    pub visited: usize,
}

enum Start {
    Root,
    Children(PathId, NodeId),
}

impl Session {
    /// Walk the whole tree, root included.
    pub fn traverse(&mut self, table: &mut VisitorTable<'_>) -> Result<Traversal> {
        self.run_traversal(table, Start::Root)
    }

    /// Walk the children of `path` (not `path` itself). A `stop` inside
    /// ends only this walk, not an enclosing one.
    pub fn traverse_node(&mut self, path: PathId, table: &mut VisitorTable<'_>) -> Result<Traversal> {
        match self.node(path) {
            Some(node) => self.run_traversal(table, Start::Children(path, node)),
            None => Ok(Traversal::default()),
        }
    }

    fn run_traversal(&mut self, table: &mut VisitorTable<'_>, start: Start) -> Result<Traversal> {
        let outer_stopping = std::mem::replace(&mut self.stopping, false);
        let frames = self.frames.len();
        let mut context = TraversalContext::new(table);
        let result = match start {
            Start::Root => {
                let root = self.root_path();
                context.visit_single(self, root)
            }
            Start::Children(path, node) => context.traverse_children(self, path, node),
        };
        self.frames.truncate(frames);
        self.stopping = outer_stopping;
        let stopped = result?;
        tracing::debug!(visited = context.visited, stopped, "traversal finished");
        Ok(Traversal { stopped, visited: context.visited })
    }
}

/// Does the subtree at `node` contain a node of type `ty`? Subtrees rooted
/// at a type in `deny` are not searched.
pub fn has_type(ast: &Ast, node: NodeId, ty: NodeType, deny: &[NodeType]) -> bool {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        let current_ty = ast.node_type(current);
        if deny.contains(&current_ty) {
            continue;
        }
        if current_ty == ty {
            return true;
        }
        stack.extend(ast.children(current));
    }
    false
}
